//! fluxmeter agent
//!
//! - Loads `fluxmeter.yaml` (or the path given as the first argument)
//! - Exports the registry on a fixed interval to the configured sink
//! - Serves `/healthz`, `/readyz`, `/metrics`
//! - Ctrl-C: drain, final flush, exit

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use fluxmeter_core::error::{MetricsError, Result};
use fluxmeter_agent::{app_state::AppState, config, router, WriteLoop};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, class = e.class().as_str(), "fluxmeter-agent failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "fluxmeter.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.ops.listen_addr()?;
    let every = cfg.export.interval();

    let state = AppState::new(cfg)?;
    let writer = state.build_writer()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let write_loop = WriteLoop::new(state.influx(), writer, every).with_self_metrics();
    let loop_task = tokio::spawn(write_loop.run(shutdown_rx));

    let app = router::build_router(state.clone());
    tracing::info!(%listen, config = %path, "fluxmeter-agent starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    let drain_state = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            drain_state.set_draining();
            tracing::info!("draining");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    loop_task
        .await
        .map_err(|e| MetricsError::Internal(format!("write loop task failed: {e}")))?;
    Ok(())
}
