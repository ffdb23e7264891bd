//! Per-connection session loop.
//!
//! Each accepted socket gets its own task running [`run`]. The socket is
//! split: a writer task drains the session's outbound queue (filled by the
//! broadcaster) into the sink, while this task reads frames in order and
//! dispatches them one at a time — so commands from one client are always
//! processed in their send order.
//!
//! Malformed frames are logged, answered with an `error`, and discarded;
//! three in a row terminate the session. Disconnect runs the leave
//! procedure for whatever room the session was bound to.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use parlor_protocol::{ClientCommand, Codec, JsonCodec, ServerMessage};

use crate::dispatcher;
use crate::AppState;

/// Consecutive malformed frames before the session is dropped.
const MAX_MALFORMED: u32 = 3;

pub async fn run(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (session_id, mut outbound) = state.broadcaster.register();

    // Writer: outbound queue → socket. Send failures just end the task;
    // the read side notices the closed socket and cleans up.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    tracing::info!(%session_id, "client connected");

    let codec = JsonCodec;
    let mut malformed: u32 = 0;
    while let Some(received) = stream.next().await {
        let msg = match received {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%session_id, error = %e, "socket error");
                break;
            }
        };
        let text = match msg {
            Message::Text(text) => text.to_string(),
            Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    tracing::warn!(%session_id, "non-UTF-8 binary frame");
                    malformed += 1;
                    if malformed >= MAX_MALFORMED {
                        break;
                    }
                    continue;
                }
            },
            Message::Close(_) => break,
            // axum answers pings itself.
            _ => continue,
        };

        match codec.decode::<ClientCommand>(&text) {
            Ok(cmd) => {
                malformed = 0;
                dispatcher::dispatch(&state, session_id, cmd).await;
            }
            Err(e) => {
                malformed += 1;
                tracing::warn!(
                    %session_id,
                    error = %e,
                    strike = malformed,
                    "malformed frame discarded"
                );
                state.broadcaster.send(
                    session_id,
                    &ServerMessage::Error("Invalid message format".to_owned()),
                );
                if malformed >= MAX_MALFORMED {
                    tracing::warn!(
                        %session_id,
                        "too many malformed frames, closing"
                    );
                    break;
                }
            }
        }
    }

    dispatcher::handle_disconnect(&state, session_id).await;
    state.broadcaster.unregister(session_id);
    writer.abort();
    tracing::info!(%session_id, "client disconnected");
}
