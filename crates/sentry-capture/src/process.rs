//! Subprocess-backed capture for RTSP/HTTP-stream/V4L2 sources (§4.1).
//!
//! Spawns three long-lived tasks per the §5 task inventory: a stdout
//! frame-extractor, a stderr drainer (consumed silently to prevent pipe
//! back-pressure), and the capture task proper that owns the child and
//! performs distribution + stats bookkeeping.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use sentry_models::{CameraId, Frame};
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::device::DeviceKind;
use crate::distributor::Distributor;
use crate::error::{CaptureError, CaptureResult};
use crate::ffmpeg::build_capture_args;
use crate::jpeg::FrameExtractor;
use crate::stats::{CaptureStats, FpsWindow};

const READ_CHUNK: usize = 64 * 1024;

/// Spawn the FFmpeg child and the three sibling tasks. Returns a cancel
/// sender: dropping/sending `true` kills the subprocess (`Stop`, §4.1).
pub fn spawn(
    camera_id: CameraId,
    device: String,
    kind: DeviceKind,
    fps: u32,
    width: u32,
    height: u32,
    distributor: Arc<Distributor>,
    stats: Arc<CaptureStats>,
    alive: Arc<AtomicBool>,
) -> CaptureResult<watch::Sender<bool>> {
    which::which("ffmpeg").map_err(|_| CaptureError::FfmpegNotFound)?;

    let args = build_capture_args(&device, &kind, fps, width, height);
    debug!(camera = %camera_id, "spawning ffmpeg capture: ffmpeg {}", args.join(" "));

    let mut child = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child.stdout.take().expect("stdout not captured");
    let stderr = child.stderr.take().expect("stderr not captured");

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (chunk_tx, chunk_rx) = mpsc::channel::<Bytes>(16);

    tokio::spawn(drain_stderr(stderr));
    tokio::spawn(read_stdout(stdout, chunk_tx));
    tokio::spawn(capture_loop(
        camera_id,
        child,
        chunk_rx,
        cancel_rx,
        distributor,
        stats,
        alive,
    ));

    Ok(cancel_tx)
}

async fn drain_stderr(stderr: tokio::process::ChildStderr) {
    let mut reader = BufReader::new(stderr);
    let mut sink = [0u8; 4096];
    loop {
        match tokio::io::AsyncReadExt::read(&mut reader, &mut sink).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

async fn read_stdout(mut stdout: tokio::process::ChildStdout, tx: mpsc::Sender<Bytes>) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}

async fn capture_loop(
    camera_id: CameraId,
    mut child: Child,
    mut chunk_rx: mpsc::Receiver<Bytes>,
    mut cancel_rx: watch::Receiver<bool>,
    distributor: Arc<Distributor>,
    stats: Arc<CaptureStats>,
    alive: Arc<AtomicBool>,
) {
    let mut extractor = FrameExtractor::new();
    let mut seq: u64 = 0;
    let mut fps_window = FpsWindow::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel_rx.changed() => {
                if *cancel_rx.borrow() {
                    info!(camera = %camera_id, "capture cancelled, killing ffmpeg");
                    let _ = child.kill().await;
                    break;
                }
            }
            chunk = chunk_rx.recv() => {
                let Some(chunk) = chunk else {
                    // stdout EOF: subprocess died or closed unexpectedly.
                    warn!(camera = %camera_id, "ffmpeg stdout closed, capturer exiting");
                    break;
                };
                for jpeg in extractor.push(&chunk) {
                    seq += 1;
                    let frame = Frame::new(camera_id, seq, jpeg, width_hint(), height_hint());
                    stats.record_frame(Utc::now().timestamp_millis());
                    fps_window.tick(&stats);
                    distributor.distribute(&frame, &stats).await;
                }
            }
        }
    }

    alive.store(false, Ordering::Relaxed);
    distributor.close_all().await;
}

// Declared dimensions are not parsed out of the MJPEG payload itself (that
// would cross into JPEG decoding, out of scope per §1); callers that need
// accurate dimensions read them from the camera record instead.
fn width_hint() -> u32 {
    0
}
fn height_hint() -> u32 {
    0
}
