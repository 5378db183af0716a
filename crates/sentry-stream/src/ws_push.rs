//! WebSocket push endpoint: `GET /ws/video/{camera_id}` (§4.7).
//!
//! Same backpressure and heartbeat shape as the teacher's WS surface
//! (`vclip-api::ws::handle_process_socket`): a bounded `mpsc` per connected
//! client, a non-blocking send that falls back to a blocking one, and a
//! heartbeat interval. Dead clients are disconnected on send error.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use sentry_models::CameraId;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::overlay::StreamProvider;

static ACTIVE_STREAM_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

const SEND_BUFFER_SIZE: usize = 8;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

async fn send_binary(tx: &mpsc::Sender<Message>, jpeg: bytes::Bytes) -> bool {
    match tx.try_send(Message::Binary(jpeg.to_vec())) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(msg)) => {
            debug!("video WS send buffer full, applying backpressure");
            tx.send(msg).await.is_ok()
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

pub async fn video_ws_handler(
    ws: WebSocketUpgrade,
    State(provider): State<Arc<StreamProvider>>,
    Path(camera_id): Path<CameraId>,
) -> impl IntoResponse {
    ACTIVE_STREAM_CONNECTIONS.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| async move {
        handle_video_socket(socket, provider, camera_id).await;
        ACTIVE_STREAM_CONNECTIONS.fetch_sub(1, Ordering::SeqCst);
    })
}

async fn handle_video_socket(socket: WebSocket, provider: Arc<StreamProvider>, camera_id: CameraId) {
    let (ws_sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(SEND_BUFFER_SIZE);

    let send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut frame_rx = provider.subscribe(camera_id).await;
    let mut last_seq = frame_rx.borrow().as_ref().map(|f| f.seq).unwrap_or(0);
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);

    loop {
        tokio::select! {
            changed = frame_rx.changed() => {
                if changed.is_err() {
                    break; // provider shut down
                }
                let frame = frame_rx.borrow().clone();
                if let Some(frame) = frame {
                    if frame.seq > last_seq {
                        last_seq = frame.seq;
                        if !send_binary(&tx, frame.jpeg).await {
                            warn!(%camera_id, "video WS send failed, disconnecting client");
                            break;
                        }
                    }
                }
            }
            _ = heartbeat.tick() => {
                if tx.send(Message::Ping(vec![])).await.is_err() {
                    break;
                }
            }
            client_msg = receiver.next() => {
                match client_msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    drop(tx);
    let _ = send_task.await;
}
