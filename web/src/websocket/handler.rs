use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use futures::StreamExt;
use log::*;
use std::sync::Arc;
use ws::Hub;

/// Upgrades `GET /ws` to a WebSocket and hands the socket to the hub.
/// No authentication happens here; any client may listen for post events.
pub(crate) async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> Response {
    ws.on_failed_upgrade(|error| warn!("WebSocket upgrade failed: {error}"))
        .on_upgrade(move |socket| async move {
            let connection = hub.open_connection();
            debug!("WebSocket upgraded, connection {}", connection.id());

            let (sink, stream) = socket.split();
            hub.serve(connection, sink, stream).await;
        })
}
