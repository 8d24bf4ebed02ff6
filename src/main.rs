use std::error::Error;
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ridematch::api::{
    CachedDirections, DirectionsProvider, GoogleDirections, StraightLineDirections,
};
use ridematch::config::constant::LOG_FILE;
use ridematch::database::Store;
use ridematch::fixtures::data_generator::seed_demo_data;
use ridematch::scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let log_file = OpenOptions::new().create(true).append(true).open(LOG_FILE)?;

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env()) // Reads RUST_LOG
        .with(
            fmt::layer()
                .with_span_events(fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE)
                .compact(),
        )
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
        .init();

    dotenv().ok();

    // A store that cannot be opened or migrated refuses to start the
    // service (non-zero exit).
    let store = Store::connect().await?;
    store.init_schema().await?;

    if std::env::args().any(|arg| arg == "--seed-demo") {
        seed_demo_data(&store).await?;
    }

    let provider: Arc<dyn DirectionsProvider> = match std::env::var("GOOGLE_API_KEY") {
        Ok(key) if !key.is_empty() => {
            info!("using Google Directions with in-process cache");
            Arc::new(CachedDirections::new(GoogleDirections::new(key)))
        }
        _ => {
            warn!("GOOGLE_API_KEY not set, routes will use straight-line estimates");
            Arc::new(StraightLineDirections::default())
        }
    };

    let scheduler = Scheduler::new(store, provider);
    scheduler.run().await;

    Ok(())
}
