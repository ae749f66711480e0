use anyhow::Context;

use gatekeeper_api::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("invalid configuration")?;
    gatekeeper_observability::init(settings.log_format);

    let app = gatekeeper_api::app::build_app(&settings);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        handler_timeout = ?settings.handler_timeout,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
