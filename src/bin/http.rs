#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use gantt_schedule::{
        AppConfig, CalendarSource, JsonFileTaskStore, TaskStore, http_api, logging,
    };
    use parking_lot::RwLock;

    logging::init_tracing("info");
    let config = AppConfig::load()?;
    let addr = config.socket_addr()?;

    let calendar = CalendarSource::weekends_only();
    {
        let calendar = calendar.clone();
        let path = config.holidays_path.clone();
        // Requests are served with weekends only until this lands.
        let _ = tokio::task::spawn_blocking(move || calendar.load_from_path(path));
    }

    let mut store = TaskStore::new(calendar.clone());
    if !store.load_from(&JsonFileTaskStore::new(config.data_path.clone()))? {
        store = TaskStore::with_sample_data(calendar);
    }

    println!("gantt-schedule HTTP API listening on http://{addr}");
    http_api::serve(addr, Arc::new(RwLock::new(store))).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
