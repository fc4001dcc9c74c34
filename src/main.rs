use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use clap::Parser;

use guide_site::config::{self, AppState, Config};
use guide_site::logger;
use guide_site::server::{
    create_reusable_listener, start_server_loop, start_signal_handler, SignalHandler,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Config file path without extension
    #[clap(long, env = "SITE_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = Config::load_from(&cli.config)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(AppState::new(&cfg)?);
    let listener = create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let signals = Arc::new(SignalHandler::new());
    start_signal_handler(Arc::clone(&signals))?;

    let active_connections = Arc::new(AtomicUsize::new(0));
    start_server_loop(listener, state, active_connections, Arc::clone(&signals.shutdown)).await;
    Ok(())
}
