pub mod api;
pub mod config;
pub mod dkg;
pub mod signing;
pub mod state;

use std::sync::Arc;

use anyhow::Result;
use poem::{listener::TcpListener, Route, Server};
use poem_openapi::OpenApiService;

pub use config::NodeSettings;
pub use state::AppState;

pub async fn run(settings: NodeSettings) -> Result<()> {
    let host = settings.server_host.clone();
    let port = settings.server_port;
    let node_id = settings.id.clone();

    let state = Arc::new(AppState::new(settings).map_err(|e| anyhow::anyhow!(e))?);

    let api_service = OpenApiService::new(api::Api { state }, "FROST Node", "1.0")
        .server(format!("http://{host}:{port}"));
    let ui = api_service.rapidoc();
    let spec = api_service.spec_endpoint();

    let app = Route::new()
        .nest("/", api_service)
        .nest("/docs", ui)
        .nest("/spec", spec);

    tracing::info!(%node_id, "frost node listening on {host}:{port}");
    tracing::info!("API documentation: http://{host}:{port}/docs");

    Server::new(TcpListener::bind(format!("{host}:{port}")))
        .run(app)
        .await?;

    Ok(())
}
