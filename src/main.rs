use std::env;
use std::error::Error;
use std::path::Path;
use std::process;
use std::sync::Arc;

use balance_locks::{
    run, write_csv, MemoryStore, MutexLocker, OptimisticLocker, ReportRow, Settings,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(err) = run_app().await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

async fn run_app() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        return Err("Usage: cargo run -- [settings-file]".into());
    }
    let settings = Settings::load(args.get(1).map(Path::new))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let latency = settings.store.latency();

    let mutex_store = Arc::new(MemoryStore::new("mutex")?.with_latency(latency));
    let mutex_locker = Arc::new(MutexLocker::new(Arc::clone(&mutex_store)));
    let mutex = run(mutex_store.as_ref(), mutex_locker, &settings.workload).await?;

    let optimistic_store = Arc::new(MemoryStore::new("optimistic_lock")?.with_latency(latency));
    let optimistic_locker = Arc::new(OptimisticLocker::new(Arc::clone(&optimistic_store)));
    let optimistic = run(
        optimistic_store.as_ref(),
        optimistic_locker,
        &settings.workload,
    )
    .await?;

    write_csv(
        std::io::stdout(),
        [&mutex, &optimistic].into_iter().map(ReportRow::from),
    )?;
    Ok(())
}
