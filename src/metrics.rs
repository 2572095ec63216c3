use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder, and its standalone HTTP exporter when
/// a listen address is configured. Must run inside the tokio runtime.
pub fn install(listen: Option<&str>) -> Result<()> {
    let builder = PrometheusBuilder::new();
    match listen {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .with_context(|| format!("invalid metrics_listen address: {addr}"))?;
            builder
                .with_http_listener(addr)
                .install()
                .context("prometheus: install recorder + exporter")?;
            tracing::info!(%addr, "metrics exporter listening");
        }
        None => {
            builder
                .install_recorder()
                .context("prometheus: install recorder")?;
        }
    }
    Ok(())
}
