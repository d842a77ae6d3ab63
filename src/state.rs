//! Shared application state for the HTTP/WS surface.

use std::sync::Arc;

use roadhub_dispatch::DispatchEngine;
use roadhub_realtime::RealtimeHub;

/// State handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The dispatch engine facade.
    pub engine: Arc<DispatchEngine>,
    /// The real-time hub for WebSocket connections.
    pub hub: Arc<RealtimeHub>,
}
