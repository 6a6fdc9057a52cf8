pub mod api;
pub mod config;
pub mod dkg;
pub mod health;
pub mod http_client;
pub mod signing;
pub mod weights;

use std::sync::Arc;

use anyhow::Result;
use poem::{listener::TcpListener, Route, Server};
use poem_openapi::OpenApiService;

pub use config::CoordinatorSettings;

use http_client::NodeClient;
use weights::WeightTracker;

/// Everything a DKG/signing orchestrator needs: the outbound client (and
/// the weight tracker it updates after every call) plus resolved party
/// topology and per-protocol deadlines.
pub struct CoordinatorContext {
    pub client: NodeClient,
    pub settings: CoordinatorSettings,
}

impl CoordinatorContext {
    pub fn new(settings: CoordinatorSettings) -> Self {
        let weights = Arc::new(WeightTracker::new(settings.party.members.iter().map(|m| m.id.clone())));
        Self {
            client: NodeClient::new(weights),
            settings,
        }
    }
}

pub async fn run(settings: CoordinatorSettings) -> Result<()> {
    let host = settings.server_host.clone();
    let port = settings.server_port;
    let ctx = Arc::new(CoordinatorContext::new(settings));

    let api_service = OpenApiService::new(api::Api { ctx }, "FROST Coordinator", "1.0")
        .server(format!("http://{host}:{port}"));
    let ui = api_service.rapidoc();
    let spec = api_service.spec_endpoint();

    let app = Route::new()
        .nest("/", api_service)
        .nest("/docs", ui)
        .nest("/spec", spec);

    tracing::info!("frost coordinator listening on {host}:{port}");
    tracing::info!("API documentation: http://{host}:{port}/docs");

    Server::new(TcpListener::bind(format!("{host}:{port}")))
        .run(app)
        .await?;

    Ok(())
}
