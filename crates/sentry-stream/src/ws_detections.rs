//! WebSocket push endpoint: `GET /ws/detections/{camera_id}` (§6).
//!
//! Mirrors `ws_push`'s backpressure and heartbeat shape but carries JSON
//! messages instead of raw binary frames: one `"frame"` message per new
//! annotated frame, followed by a `"detection"` message and, when present, a
//! `"faces"` message carrying the detection metadata stored alongside it.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use sentry_models::{CameraId, FaceDetection, ObjectDetection};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::overlay::StreamProvider;

const SEND_BUFFER_SIZE: usize = 8;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DetectionMessage {
    Frame {
        camera_id: CameraId,
        width: u32,
        height: u32,
        payload: FramePayload,
    },
    Detection {
        camera_id: CameraId,
        width: u32,
        height: u32,
        payload: Vec<ObjectDetection>,
    },
    Faces {
        camera_id: CameraId,
        width: u32,
        height: u32,
        payload: Vec<FaceDetection>,
    },
}

#[derive(Serialize)]
struct FramePayload {
    seq: u64,
}

async fn send_json(tx: &mpsc::Sender<Message>, msg: &DetectionMessage) -> bool {
    let text = match serde_json::to_string(msg) {
        Ok(t) => t,
        Err(_) => return true,
    };
    match tx.try_send(Message::Text(text.clone())) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => tx.send(Message::Text(text)).await.is_ok(),
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

pub async fn detections_ws_handler(
    ws: WebSocketUpgrade,
    State(provider): State<Arc<StreamProvider>>,
    Path(camera_id): Path<CameraId>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_detections_socket(socket, provider, camera_id))
}

async fn handle_detections_socket(socket: WebSocket, provider: Arc<StreamProvider>, camera_id: CameraId) {
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
                    break;
                }
                let frame = frame_rx.borrow().clone();
                let Some(frame) = frame else { continue };
                if frame.seq <= last_seq {
                    continue;
                }
                last_seq = frame.seq;

                let (width, height) = provider.dimensions(camera_id).await;
                if !send_json(&tx, &DetectionMessage::Frame { camera_id, width, height, payload: FramePayload { seq: frame.seq } }).await {
                    warn!(%camera_id, "detections WS send failed, disconnecting client");
                    break;
                }

                if let Some(meta) = provider.detections(camera_id).await {
                    if !send_json(&tx, &DetectionMessage::Detection { camera_id, width, height, payload: meta.objects }).await {
                        break;
                    }
                    if !meta.faces.is_empty()
                        && !send_json(&tx, &DetectionMessage::Faces { camera_id, width, height, payload: meta.faces }).await
                    {
                        break;
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
