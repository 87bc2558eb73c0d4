//! WebSocket stream endpoint

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Response},
};

use crate::session::SessionId;
use crate::stream::{run_stream, WsChannel};
use crate::{AppResult, AppState};

/// Upgrade to a frame stream bound to an active session.
///
/// A session takes one stream at a time; a second upgrade is refused with
/// 409 until the first stream has gone away.
pub async fn connect(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> AppResult<Response> {
    let claim = state.service.attach_stream(session_id)?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let config = state.config.stream();

    Ok(ws.on_upgrade(move |socket| async move {
        let mut channel = WsChannel::new(socket);
        run_stream(state.service, state.provider, session_id, &mut channel, config).await;
        // run_stream has finalized the session by now
        drop(claim);
    }))
}
