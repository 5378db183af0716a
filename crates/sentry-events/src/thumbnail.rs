//! Frame and forensic thumbnail persistence (§4.8 "persistence path").
//!
//! Follows the naming/directory-creation idiom of the teacher's thumbnail
//! writer: deterministic file name, `create_dir_all` on first write, a
//! failure is logged and treated as non-fatal rather than aborting the
//! event.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use sentry_models::CameraId;
use tracing::warn;

/// Writes annotated frames and forensic face-crop thumbnails under a
/// configured frame directory.
pub struct ThumbnailWriter {
    frame_dir: PathBuf,
}

impl ThumbnailWriter {
    pub fn new(frame_dir: impl Into<PathBuf>) -> Self {
        Self { frame_dir: frame_dir.into() }
    }

    /// `{cameraID}_{timestamp_ns}.jpg` under the frame directory. Returns
    /// `None` (logged) on write failure rather than propagating an error,
    /// per §7's persistence-error policy.
    pub async fn write_frame(&self, camera_id: CameraId, timestamp_ns: i64, jpeg: &Bytes) -> Option<String> {
        let name = format!("{}_{}.jpg", camera_id, timestamp_ns);
        self.write(&name, jpeg).await
    }

    /// Forensic face-crop thumbnail: `{cameraID}_{timestamp_ns}_face{index}.jpg`.
    /// `face_base64` is the adapter's base64-encoded crop.
    pub async fn write_forensic_thumbnail(
        &self,
        camera_id: CameraId,
        timestamp_ns: i64,
        index: usize,
        face_base64: &str,
    ) -> Option<String> {
        let bytes = match BASE64.decode(face_base64) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "forensic thumbnail base64 decode failed");
                return None;
            }
        };
        let name = format!("{}_{}_face{}.jpg", camera_id, timestamp_ns, index);
        self.write(&name, &Bytes::from(bytes)).await
    }

    async fn write(&self, file_name: &str, data: &[u8]) -> Option<String> {
        if let Err(e) = tokio::fs::create_dir_all(&self.frame_dir).await {
            warn!(error = %e, dir = %self.frame_dir.display(), "failed to create frame directory");
            return None;
        }
        let path: PathBuf = Path::new(&self.frame_dir).join(file_name);
        if let Err(e) = tokio::fs::write(&path, data).await {
            warn!(error = %e, path = %path.display(), "failed to persist frame to disk");
            return None;
        }
        Some(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_frame_under_deterministic_name() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ThumbnailWriter::new(dir.path());
        let camera_id = CameraId::new();
        let path = writer.write_frame(camera_id, 12345, &Bytes::from_static(b"jpegbytes")).await.unwrap();
        assert!(path.ends_with(&format!("{}_12345.jpg", camera_id)));
        assert!(tokio::fs::metadata(&path).await.is_ok());
    }

    #[tokio::test]
    async fn forensic_thumbnail_decodes_base64() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ThumbnailWriter::new(dir.path());
        let camera_id = CameraId::new();
        let encoded = BASE64.encode(b"facecrop");
        let path = writer
            .write_forensic_thumbnail(camera_id, 999, 0, &encoded)
            .await
            .unwrap();
        let contents = tokio::fs::read(&path).await.unwrap();
        assert_eq!(contents, b"facecrop");
    }

    #[tokio::test]
    async fn invalid_base64_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ThumbnailWriter::new(dir.path());
        let result = writer.write_forensic_thumbnail(CameraId::new(), 1, 0, "not base64!!").await;
        assert!(result.is_none());
    }
}
