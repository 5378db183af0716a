//! Camera device string parsing (§6 Camera device strings).

/// How a device string should be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    /// V4L2 capture device, e.g. `/dev/video0`.
    V4l2,
    /// `http(s)://…` URL whose path is a single still image, polled on an
    /// interval.
    HttpPoll,
    /// `http(s)://…` MJPEG stream, decoded via FFmpeg.
    HttpStream,
    /// `rtsp://…` stream, decoded via FFmpeg over TCP transport.
    Rtsp,
}

/// Classify a device string per §4.1/§6.
///
/// - `http(s)://…` whose path ends in `.jpg`/`.jpeg` or contains the
///   substring "image" is polled as a single still image.
/// - Any other `http(s)://…` is treated as an MJPEG stream.
/// - `rtsp://…` is a streaming RTSP source.
/// - Anything else is assumed to be a V4L2 device path.
pub fn classify(device: &str) -> DeviceKind {
    if let Some(rest) = device
        .strip_prefix("http://")
        .or_else(|| device.strip_prefix("https://"))
    {
        let path = rest.split(['?', '#']).next().unwrap_or(rest);
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".jpg") || lower.ends_with(".jpeg") || lower.contains("image") {
            DeviceKind::HttpPoll
        } else {
            DeviceKind::HttpStream
        }
    } else if device.starts_with("rtsp://") {
        DeviceKind::Rtsp
    } else {
        DeviceKind::V4l2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_v4l2() {
        assert_eq!(classify("/dev/video0"), DeviceKind::V4l2);
    }

    #[test]
    fn classifies_http_poll_by_extension() {
        assert_eq!(classify("http://cam/image.jpg"), DeviceKind::HttpPoll);
        assert_eq!(classify("https://cam/snap.jpeg?x=1"), DeviceKind::HttpPoll);
    }

    #[test]
    fn classifies_http_poll_by_substring() {
        assert_eq!(classify("http://cam/image"), DeviceKind::HttpPoll);
    }

    #[test]
    fn classifies_http_stream() {
        assert_eq!(classify("http://cam/mjpeg"), DeviceKind::HttpStream);
    }

    #[test]
    fn classifies_rtsp() {
        assert_eq!(classify("rtsp://cam/stream"), DeviceKind::Rtsp);
    }
}
