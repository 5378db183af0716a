//! FFmpeg argv construction for the three subprocess-backed device kinds
//! (§4.1, §6 child-process contract).
//!
//! Unlike `vclip-media`'s one-shot transcode builder, the capturer never
//! writes to a file: stdout is the MJPEG pipe consumed by the frame
//! extractor, so there is no `output` path and the process is expected to
//! run until killed, not until EOF.

use crate::device::DeviceKind;

/// Build the argv (everything after the `ffmpeg` binary name) for one of
/// the three subprocess-backed sources.
pub fn build_capture_args(device: &str, kind: &DeviceKind, fps: u32, width: u32, height: u32) -> Vec<String> {
    let mut args = Vec::new();

    match kind {
        DeviceKind::Rtsp => {
            args.push("-rtsp_transport".into());
            args.push("tcp".into());
            args.push("-i".into());
            args.push(device.to_string());
        }
        DeviceKind::HttpStream => {
            args.push("-i".into());
            args.push(device.to_string());
        }
        DeviceKind::V4l2 => {
            args.push("-f".into());
            args.push("v4l2".into());
            args.push("-video_size".into());
            args.push(format!("{width}x{height}"));
            args.push("-framerate".into());
            args.push(fps.to_string());
            args.push("-i".into());
            args.push(device.to_string());
        }
        DeviceKind::HttpPoll => {
            // HTTP polling never shells out to FFmpeg; see http_poll.rs.
            unreachable!("HttpPoll is handled by the polling capturer, not FFmpeg");
        }
    }

    args.push("-f".into());
    args.push("image2pipe".into());
    args.push("-vcodec".into());
    args.push("mjpeg".into());
    args.push("-r".into());
    args.push(fps.to_string());
    args.push("-q:v".into());
    args.push("5".into());
    args.push("-".into());

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtsp_args_match_contract() {
        let args = build_capture_args("rtsp://cam/stream", &DeviceKind::Rtsp, 5, 0, 0);
        assert_eq!(
            args,
            vec![
                "-rtsp_transport", "tcp", "-i", "rtsp://cam/stream", "-f", "image2pipe", "-vcodec", "mjpeg", "-r",
                "5", "-q:v", "5", "-",
            ]
        );
    }

    #[test]
    fn v4l2_args_include_size_and_framerate() {
        let args = build_capture_args("/dev/video0", &DeviceKind::V4l2, 10, 640, 480);
        assert_eq!(
            args,
            vec![
                "-f", "v4l2", "-video_size", "640x480", "-framerate", "10", "-i", "/dev/video0", "-f",
                "image2pipe", "-vcodec", "mjpeg", "-r", "10", "-q:v", "5", "-",
            ]
        );
    }

    #[test]
    fn http_stream_has_no_rtsp_transport_flag() {
        let args = build_capture_args("http://cam/mjpeg", &DeviceKind::HttpStream, 5, 0, 0);
        assert!(!args.contains(&"-rtsp_transport".to_string()));
        assert_eq!(args[0], "-i");
    }
}
