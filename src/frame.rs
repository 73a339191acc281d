//! Decoded camera frames and the JPEG framing used on SDK buffers.

use crate::{Error, Result};
use image::RgbImage;

/// Where a frame was acquired from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOrigin {
    /// Vendor SDK live-view stream
    Sdk,
    /// Sentinel image dropped on disk
    File,
}

/// A decoded RGB frame.
///
/// Frames are owned values; the acquisition thread hands each one over to
/// the consumer and never touches it again.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
    origin: FrameOrigin,
    sequence: u64,
}

impl Frame {
    /// Wrap an already decoded image
    #[must_use]
    pub const fn new(image: RgbImage, origin: FrameOrigin, sequence: u64) -> Self {
        Self { image, origin, sequence }
    }

    /// Decode an encoded image (JPEG or PNG) into a frame
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are empty or cannot be decoded
    pub fn decode(bytes: &[u8], origin: FrameOrigin, sequence: u64) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidInput("empty image buffer".to_string()));
        }
        let image = image::load_from_memory(bytes)?.to_rgb8();
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::InvalidInput("decoded image has no pixels".to_string()));
        }
        Ok(Self::new(image, origin, sequence))
    }

    /// Frame width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)` in pixels
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[must_use]
    pub const fn origin(&self) -> FrameOrigin {
        self.origin
    }

    /// Position of this frame in the acquisition order of its source
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Return the first complete JPEG (SOI .. EOI inclusive) inside `buf`.
///
/// Live-view buffers can carry padding or a truncated tail; anything that
/// does not contain a whole SOI..EOI segment yields `None`.
#[must_use]
pub fn jpeg_segment(buf: &[u8]) -> Option<&[u8]> {
    let start = buf.windows(2).position(|w| w == SOI)?;
    let body = &buf[start + 2..];
    let end = body.windows(2).position(|w| w == EOI)?;
    Some(&buf[start..start + 2 + end + 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{codecs::jpeg::JpegEncoder, Rgb};

    fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([120, 80, 40]));
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 90)
            .encode_image(&img)
            .unwrap();
        out
    }

    #[test]
    fn test_decode_jpeg() {
        let bytes = encode_jpeg(32, 24);
        let frame = Frame::decode(&bytes, FrameOrigin::Sdk, 7).unwrap();
        assert_eq!(frame.size(), (32, 24));
        assert_eq!(frame.origin(), FrameOrigin::Sdk);
        assert_eq!(frame.sequence(), 7);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Frame::decode(&[], FrameOrigin::File, 0).is_err());
        assert!(Frame::decode(b"not an image", FrameOrigin::File, 0).is_err());
    }

    #[test]
    fn test_jpeg_segment_strips_padding() {
        let jpeg = encode_jpeg(8, 8);
        let mut padded = vec![0u8, 1, 2];
        padded.extend_from_slice(&jpeg);
        padded.extend_from_slice(&[0, 0, 0, 0]);

        let seg = jpeg_segment(&padded).unwrap();
        assert_eq!(seg, jpeg.as_slice());
        assert!(Frame::decode(seg, FrameOrigin::Sdk, 0).is_ok());
    }

    #[test]
    fn test_jpeg_segment_incomplete() {
        assert!(jpeg_segment(&[]).is_none());
        assert!(jpeg_segment(&[0xFF, 0xD8, 0x00, 0x01]).is_none());
        assert!(jpeg_segment(&[0x00, 0xFF, 0xD9]).is_none());
        assert_eq!(jpeg_segment(&[0xFF, 0xD8, 0xFF, 0xD9]), Some(&[0xFF, 0xD8, 0xFF, 0xD9][..]));
    }
}
