use clap::Parser;
use serde::Deserialize;

/// Default bind address (§6 "Listens on 127.0.0.1:9878 by default").
pub const DEFAULT_BIND: &str = "127.0.0.1:9878";
const DEFAULT_LOG_FORMAT: &str = "pretty";
const DEFAULT_BROADCAST_CAPACITY: usize = 1024;

/// Mirrors `Config`'s fields for deserialization out of the `config` crate's layered sources
/// (defaults, then `EXCHANGE_*` environment variables).
#[derive(Deserialize, Debug, Clone)]
struct Layered {
    bind: String,
    log_format: String,
    broadcast_capacity: usize,
}

/// CLI overrides layered on top of the environment (§2.1). Every field is optional so an unset
/// flag never shadows a value already supplied via the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "exchange-gateway")]
#[command(about = "Tag-value FIX-derived exchange gateway")]
struct CliArgs {
    /// Address the acceptor listens on.
    #[arg(long)]
    bind: Option<String>,

    /// Log output format: "pretty" (human-readable) or "json" (structured).
    #[arg(long)]
    log_format: Option<String>,

    /// Capacity of the in-process broadcast channel fanning out book/execution events.
    #[arg(long)]
    broadcast_capacity: Option<usize>,
}

/// Config is the crate's single source of runtime knobs, resolved from defaults, then
/// `EXCHANGE_*` environment variables (via the `config` crate), then CLI flags (via `clap`),
/// in that precedence order (§2.1, §6).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub log_format: String,
    pub broadcast_capacity: usize,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let layered = config::Config::builder()
            .set_default("bind", DEFAULT_BIND)?
            .set_default("log_format", DEFAULT_LOG_FORMAT)?
            .set_default("broadcast_capacity", DEFAULT_BROADCAST_CAPACITY as i64)?
            .add_source(
                config::Environment::with_prefix("EXCHANGE")
                    .try_parsing(true)
                    .separator("_"),
            )
            .build()?
            .try_deserialize::<Layered>()?;

        let cli = CliArgs::parse();

        Ok(Config {
            bind: cli.bind.unwrap_or(layered.bind),
            log_format: cli.log_format.unwrap_or(layered.log_format),
            broadcast_capacity: cli.broadcast_capacity.unwrap_or(layered.broadcast_capacity),
        })
    }
}
