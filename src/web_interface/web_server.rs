use std::net::SocketAddr;
use std::sync::Arc;

use log::info;
use warp::Filter;

use super::routes::{
    dashboard_route, list_screenshots_route, serve_screenshot_route, upload_screenshot_route,
};
use crate::error_handling::types::WebError;
use crate::ingestion::IngestionHandler;
use crate::storage::FileStorage;

/// Web server for the one-shot upload, the catalog, and artifact retrieval.
pub struct WebServer {
    handler: Arc<IngestionHandler>,
    storage: Arc<FileStorage>,
}

impl WebServer {
    /// Create a new WebServer instance
    pub fn new(handler: Arc<IngestionHandler>, storage: Arc<FileStorage>) -> Self {
        Self { handler, storage }
    }

    /// Start the web server on the given address and port
    pub async fn start(&self, bind_address: &str, port: u16) -> Result<(), WebError> {
        let addr: SocketAddr = format!("{}:{}", bind_address, port)
            .parse()
            .map_err(|_| WebError::BadAddress(format!("{}:{}", bind_address, port)))?;

        // Compose routes
        let routes = dashboard_route()
            .or(upload_screenshot_route(self.handler.clone()))
            .or(list_screenshots_route(self.storage.clone()))
            .or(serve_screenshot_route(self.storage.clone()));

        info!("Web interface listening on {}", addr);

        // Start server (warp 0.4)
        warp::serve(routes).run(addr).await;

        Ok(())
    }
}
