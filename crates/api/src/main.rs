use anyhow::Context;

use storefront_infra::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let settings = Settings::from_env().context("invalid configuration")?;
    tracing::info!(?settings, "starting storefront api");

    let app = storefront_api::app::build_app(&settings)
        .await
        .context("failed to build services")?;

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
