//! JPEG SOI/EOI byte-stream framing (§4.1, §8 invariant 2).
//!
//! Non-goal boundary: decoding the JPEG itself is out of scope, only
//! byte-boundary framing of the marker pair `0xFF 0xD8 … 0xFF 0xD9`.

use bytes::{Bytes, BytesMut};

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Incremental extractor over an unbounded byte stream (FFmpeg/V4L2 stdout).
///
/// Bytes before the first start marker are discarded; every complete
/// `SOI…EOI` span found after each `push` is returned, in order.
#[derive(Default)]
pub struct FrameExtractor {
    buf: BytesMut,
}

impl FrameExtractor {
    pub fn new() -> Self {
        Self { buf: BytesMut::new() }
    }

    /// Feed newly-read bytes and drain every complete frame now available.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();

        loop {
            let Some(start) = find(&self.buf, &SOI, 0) else {
                // No start marker at all. A trailing byte might still be
                // the first half of a marker split across this push and the
                // next one, so keep it instead of discarding the buffer.
                if self.buf.last() == Some(&SOI[0]) {
                    let keep_from = self.buf.len() - 1;
                    let _ = self.buf.split_to(keep_from);
                } else {
                    self.buf.clear();
                }
                break;
            };
            if start > 0 {
                // Discard noise preceding the first start marker.
                let _ = self.buf.split_to(start);
            }
            let Some(end) = find(&self.buf, &EOI, 2) else {
                // Incomplete frame; wait for more data.
                break;
            };
            let frame = self.buf.split_to(end + 2);
            frames.push(frame.freeze());
        }

        frames
    }
}

fn find(haystack: &[u8], needle: &[u8; 2], from: usize) -> Option<usize> {
    if haystack.len() < from + needle.len() {
        return None;
    }
    haystack[from..]
        .windows(2)
        .position(|w| w == needle)
        .map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(marker_byte: u8) -> Vec<u8> {
        vec![0xFF, 0xD8, marker_byte, marker_byte, 0xFF, 0xD9]
    }

    #[test]
    fn extracts_single_frame_in_one_push() {
        let mut ext = FrameExtractor::new();
        let data = jpeg(1);
        let frames = ext.push(&data);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), data.as_slice());
    }

    #[test]
    fn extracts_frame_split_across_pushes() {
        let mut ext = FrameExtractor::new();
        let data = jpeg(2);
        let (a, b) = data.split_at(3);
        assert!(ext.push(a).is_empty());
        let frames = ext.push(b);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), data.as_slice());
    }

    #[test]
    fn extracts_frame_split_on_soi_marker_boundary() {
        let mut ext = FrameExtractor::new();
        let data = jpeg(4);
        let (a, b) = data.split_at(1);
        assert!(ext.push(a).is_empty());
        let frames = ext.push(b);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), data.as_slice());
    }

    #[test]
    fn discards_noise_before_first_soi() {
        let mut ext = FrameExtractor::new();
        let mut data = vec![0x00, 0x11, 0x22];
        data.extend(jpeg(3));
        let frames = ext.push(&data);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), jpeg(3).as_slice());
    }

    #[test]
    fn extracts_k_frames_from_concatenated_stream() {
        let mut ext = FrameExtractor::new();
        let mut data = Vec::new();
        for i in 0..5u8 {
            data.extend(jpeg(i));
        }
        let frames = ext.push(&data);
        assert_eq!(frames.len(), 5);
        for (i, f) in frames.iter().enumerate() {
            assert_eq!(f.as_ref(), jpeg(i as u8).as_slice());
        }
    }
}
