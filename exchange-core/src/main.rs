use std::sync::Arc;

use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

use exchange_core::acceptor;
use exchange_core::config::Config;
use exchange_core::dispatcher::Dispatcher;
use exchange_core::engine::book::OrderBook;
use exchange_core::engine::syncer::{ChannelBroadcastSink, NullPersistenceSink};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    let filter = if config.log_format == "json" {
        EnvFilter::from_default_env().add_directive("exchange_core=debug".parse()?)
    } else {
        EnvFilter::from_default_env().add_directive("exchange_core=info".parse()?)
    };
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::info!(bind = %config.bind, "starting exchange gateway");

    let book = Arc::new(OrderBook::with_sinks(
        Arc::new(NullPersistenceSink),
        Arc::new(ChannelBroadcastSink::new(config.broadcast_capacity)),
    ));
    let dispatcher = Arc::new(Dispatcher::new(book));

    if let Err(e) = acceptor::run_acceptor(&config.bind, dispatcher).await {
        tracing::error!(error = %e, "failed to bind listener");
        std::process::exit(1);
    }

    Ok(())
}
