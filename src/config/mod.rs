// Configuration module entry point
// Loads the site configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::{AppState, StartupError};
pub use types::{
    BackendConfig, BlogSourceKind, Config, ContentConfig, DatabaseConfig, DeployConfig,
    EdgeConfig, Environment, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "site";

/// Plain environment variables honoured on top of `SITE__*` overrides
const WELL_KNOWN_ENV: &[(&str, &str)] = &[
    ("ENVIRONMENT", "server.environment"),
    ("BACKEND_URL", "backend.url"),
    ("DATABASE_URL", "database.url"),
    ("DB_USER", "database.user"),
    ("FTP_HOST", "deploy.ftp_host"),
    ("FTP_USER", "deploy.ftp_user"),
    ("FTP_PASSWORD", "deploy.ftp_password"),
];

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "site.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::load_from`] with an injectable variable lookup
    pub fn load_with_env(
        config_path: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.environment", "development")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("database.max_connections", 10)?
            .set_default("database.idle_timeout_secs", 60)?
            .set_default("edge.proxy_prefixes", vec!["/admin", "/docs", "/api"])?
            .set_default("edge.proxy_exact", vec!["/openapi.json"])?
            .set_default("edge.default_forwarded_proto", "https")?
            .set_default("content.public_dir", "public")?
            .set_default("content.posts_dir", "posts")?
            .set_default("content.blog_source", "backend")?
            .set_default("deploy.local_root", "out")?
            .set_default("deploy.remote_root", "/")?
            .set_default("deploy.root_config_file", ".htaccess")?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SITE").separator("__"));

        for (name, key) in WELL_KNOWN_ENV {
            let value = lookup(name).filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Backend origin for this environment
    pub fn backend_origin(&self) -> String {
        self.backend.origin(self.server.environment)
    }
}
