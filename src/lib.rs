pub mod models;
pub mod services;
pub mod commands;
pub mod db;
pub mod utils;

/// Installs the `env_logger` backend. `RUST_LOG` wins over `default_level`.
pub fn init_logging(default_level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .try_init();
}
