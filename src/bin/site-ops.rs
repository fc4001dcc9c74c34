use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::{style, Term};

use guide_site::config::{self, Config};
use guide_site::db::Database;
use guide_site::logger;
use guide_site::ops::{deploy, prerender, reaper, register};

#[derive(Parser)]
#[clap(author, version, about = "Operations for the guide site", long_about = None)]
struct Cli {
    /// Config file path without extension
    #[clap(long, env = "SITE_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload the static export over FTP, root configuration file last
    Deploy,
    /// Kill sleeping database sessions idle for more than a minute
    ReapConnections,
    /// Create the admin user or reset its password
    RegisterAdmin {
        /// Skip the username prompt
        #[clap(long)]
        username: Option<String>,
    },
    /// Render the tour schedule and per-date pages to static files
    Prerender {
        /// Output directory; defaults to the deploy export directory
        #[clap(long, value_parser)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let cfg = match Config::load_from(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} {e}", style("Failed to load configuration:").red().bold());
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logger::init(&cfg) {
        eprintln!("{} {e}", style("Failed to open log files:").red().bold());
        return ExitCode::FAILURE;
    }

    match run(cli.command, &cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Deploy => {
            let deploy_config = cfg.deploy.clone();
            let report = tokio::task::spawn_blocking(move || {
                let mut remote = deploy::FtpRemote::connect(&deploy_config)?;
                let report = deploy::deploy(&mut remote, &deploy_config);
                remote.quit();
                report
            })
            .await??;
            println!(
                "{} {} dir(s), {} file(s), {} failure(s)",
                style("Deploy finished:").green().bold(),
                report.dirs_created,
                report.files_uploaded,
                report.failures.len()
            );
        }
        Command::ReapConnections => {
            let user = reaper::resolve_user(&cfg.database).ok_or(reaper::ReapError::MissingUser)?;
            let db = connect(cfg).await?;
            let result = reaper::reap(&db, &user).await;
            db.close().await?;
            let report = result?;
            println!(
                "{} found {}, killed {}, failed {}",
                style("Idle sessions:").green().bold(),
                report.found,
                report.killed,
                report.failed
            );
        }
        Command::RegisterAdmin { username } => {
            let term = Term::stdout();
            let (username, password) = register::prompt_credentials(&term, username)?;
            let db = connect(cfg).await?;
            let result = register::register(&db, &username, &password).await;
            db.close().await?;
            result?;
        }
        Command::Prerender { out } => {
            let out = out.unwrap_or_else(|| PathBuf::from(&cfg.deploy.local_root));
            let db = connect(cfg).await?;
            let written = prerender::prerender(db, &out).await?;
            println!("{} {written} page(s)", style("Prerendered:").green().bold());
        }
    }
    Ok(())
}

async fn connect(cfg: &Config) -> Result<Database, Box<dyn std::error::Error>> {
    let url = cfg
        .database
        .url
        .as_deref()
        .ok_or("DATABASE_URL is not set")?;
    Ok(Database::dedicated(url).await?)
}
