use weblog_client::actors::weblog_store::WeblogLog;
use weblog_client::config::Config;
use weblog_client::ingest::{self, IngestConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    tracing::info!(endpoint = %config.weblog_ws_url, "Starting weblog client");

    let (log, _store_handle) = WeblogLog::spawn()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to spawn weblog store: {e}"))?;

    // Trace every stored event so the buffer is observable without a UI.
    let mut events = log
        .subscribe()
        .map_err(|e| anyhow::anyhow!("Failed to subscribe to weblog store: {e}"))?;
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::info!(
                run_name = event.run_name.as_deref().unwrap_or("-"),
                event = event.event.as_deref().unwrap_or("-"),
                process = event
                    .trace
                    .as_ref()
                    .and_then(|t| t.process.as_deref())
                    .unwrap_or("-"),
                status = event
                    .trace
                    .as_ref()
                    .and_then(|t| t.status.as_deref())
                    .unwrap_or("-"),
                "Weblog event stored"
            );
        }
    });

    ingest::run(log, IngestConfig::from(&config)).await;

    Ok(())
}
