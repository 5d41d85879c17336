use anyhow::Context;

use pdi_infra::PdiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PdiConfig::from_env().context("invalid PDI_* configuration")?;
    pdi_observability::init_with(config.log_format, "info");

    let app = pdi_api::app::build_app(&config)
        .await
        .context("failed to wire services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
