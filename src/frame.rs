//! Pixel encodings and raw-frame decoding.
//!
//! Decoding is pure and stateless: one raw frame plus the device's
//! current color-filter entry produce a tagged [`ImageBuffer`]. Bit depth
//! alone is ambiguous without knowing whether the sensor carries a color
//! filter, which is why both inputs feed the resolution table.

use std::fmt;

use crate::error::{CameraError, Result, TransportError};
use crate::traits::RawFrame;

/// Color-filter entry reported by filterless (mono or pre-debayered) sensors.
pub const COLOR_FILTER_NONE: &str = "None";

/// Well-known pixel encoding tags for decoded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelEncoding {
    /// 8-bit grayscale.
    #[default]
    Mono8,
    /// 16-bit grayscale.
    Mono16,
    /// 24-bit interleaved RGB.
    Rgb8,
    /// 8-bit Bayer mosaic, RGGB origin.
    BayerRggb8,
    /// 8-bit Bayer mosaic, GRBG origin.
    BayerGrbg8,
    /// 8-bit Bayer mosaic, GBRG origin.
    BayerGbrg8,
    /// 8-bit Bayer mosaic, BGGR origin.
    BayerBggr8,
    /// 16-bit Bayer mosaic, RGGB origin.
    BayerRggb16,
    /// 16-bit Bayer mosaic, GRBG origin.
    BayerGrbg16,
    /// 16-bit Bayer mosaic, GBRG origin.
    BayerGbrg16,
    /// 16-bit Bayer mosaic, BGGR origin.
    BayerBggr16,
}

impl PixelEncoding {
    /// Canonical lower-case encoding tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mono8 => "mono8",
            Self::Mono16 => "mono16",
            Self::Rgb8 => "rgb8",
            Self::BayerRggb8 => "bayer_rggb8",
            Self::BayerGrbg8 => "bayer_grbg8",
            Self::BayerGbrg8 => "bayer_gbrg8",
            Self::BayerBggr8 => "bayer_bggr8",
            Self::BayerRggb16 => "bayer_rggb16",
            Self::BayerGrbg16 => "bayer_grbg16",
            Self::BayerGbrg16 => "bayer_gbrg16",
            Self::BayerBggr16 => "bayer_bggr16",
        }
    }
}

impl fmt::Display for PixelEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the output encoding from the device's color-filter entry and
/// the frame's bit depth.
///
/// Bayer sensors map their filter origin 1:1 onto the mosaic tag, at 16
/// bit or 8 bit depending on the reported depth. Filterless frames map on
/// depth alone: 16 to mono16, 24 to rgb8, anything else to mono8.
pub fn resolve_encoding(color_filter: &str, bits_per_pixel: u32) -> Result<PixelEncoding> {
    if color_filter == COLOR_FILTER_NONE {
        return Ok(match bits_per_pixel {
            16 => PixelEncoding::Mono16,
            24 => PixelEncoding::Rgb8,
            _ => PixelEncoding::Mono8,
        });
    }

    let deep = bits_per_pixel == 16;
    match (color_filter, deep) {
        ("BayerRG", true) => Ok(PixelEncoding::BayerRggb16),
        ("BayerRG", false) => Ok(PixelEncoding::BayerRggb8),
        ("BayerGR", true) => Ok(PixelEncoding::BayerGrbg16),
        ("BayerGR", false) => Ok(PixelEncoding::BayerGrbg8),
        ("BayerGB", true) => Ok(PixelEncoding::BayerGbrg16),
        ("BayerGB", false) => Ok(PixelEncoding::BayerGbrg8),
        ("BayerBG", true) => Ok(PixelEncoding::BayerBggr16),
        ("BayerBG", false) => Ok(PixelEncoding::BayerBggr8),
        _ => Err(CameraError::UnknownBayerPattern {
            filter: color_filter.to_owned(),
            bits_per_pixel,
        }),
    }
}

/// Capture timestamp split into whole seconds and remaining nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    /// Whole seconds.
    pub secs: u64,
    /// Nanoseconds past the last whole second.
    pub nanos: u32,
}

impl Timestamp {
    /// Split a device timestamp in nanoseconds.
    #[must_use]
    pub const fn from_nanos(timestamp_ns: u64) -> Self {
        // The remainder is < 1e9 and always fits.
        #[allow(clippy::cast_possible_truncation)]
        let nanos = (timestamp_ns % 1_000_000_000) as u32;
        Self {
            secs: timestamp_ns / 1_000_000_000,
            nanos,
        }
    }
}

/// Caller-owned destination for one decoded frame.
///
/// Populated in place by [`fill_image`]; a failed decode leaves the
/// previous contents untouched.
#[derive(Debug, Clone, Default)]
pub struct ImageBuffer {
    /// Capture timestamp from the device clock.
    pub stamp: Timestamp,
    /// Logical identifier of the producing camera, supplied by the caller.
    pub frame_id: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Byte length of one row, copied verbatim from the raw frame.
    pub stride: u32,
    /// Pixel encoding tag.
    pub encoding: PixelEncoding,
    /// Decoded pixel bytes, `stride * height` long.
    pub data: Vec<u8>,
}

impl ImageBuffer {
    /// Create an empty image buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Copy a raw frame into `image` under the resolved encoding.
///
/// The raw buffer is validated before the first write to `image`, so a
/// failure never leaves partial data behind. Stride is taken from the
/// device's report, never recomputed from width.
pub fn fill_image(
    image: &mut ImageBuffer,
    raw: &RawFrame,
    encoding: PixelEncoding,
    frame_id: &str,
) -> Result<()> {
    let expected = raw.stride_bytes as usize * raw.height as usize;
    let payload = raw.data.get(..expected).ok_or_else(|| CameraError::FrameRetrieval {
        source: TransportError::Device(format!(
            "frame buffer holds {} bytes, stride x height needs {expected}",
            raw.data.len()
        )),
    })?;

    image.stamp = Timestamp::from_nanos(raw.timestamp_ns);
    image.frame_id = frame_id.to_owned();
    image.width = raw.width;
    image.height = raw.height;
    image.stride = raw.stride_bytes;
    image.encoding = encoding;
    image.data.clear();
    image.data.extend_from_slice(payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(width: u32, height: u32, stride: u32, bits_per_pixel: u32) -> RawFrame {
        RawFrame {
            timestamp_ns: 1_500_000_042,
            width,
            height,
            stride_bytes: stride,
            bits_per_pixel,
            complete: true,
            data: vec![0xAB; stride as usize * height as usize],
        }
    }

    #[test]
    fn test_bayer_table_is_exhaustive() {
        let cases = [
            ("BayerRG", 16, PixelEncoding::BayerRggb16),
            ("BayerGR", 16, PixelEncoding::BayerGrbg16),
            ("BayerGB", 16, PixelEncoding::BayerGbrg16),
            ("BayerBG", 16, PixelEncoding::BayerBggr16),
            ("BayerRG", 8, PixelEncoding::BayerRggb8),
            ("BayerGR", 8, PixelEncoding::BayerGrbg8),
            ("BayerGB", 8, PixelEncoding::BayerGbrg8),
            ("BayerBG", 8, PixelEncoding::BayerBggr8),
        ];
        for (filter, bits, expected) in cases {
            let encoding = resolve_encoding(filter, bits).expect("known pattern");
            assert_eq!(encoding, expected, "{filter}/{bits}");
        }
    }

    #[test]
    fn test_non_sixteen_bayer_depths_decode_as_eight_bit() {
        let encoding = resolve_encoding("BayerRG", 12).expect("known pattern");
        assert_eq!(encoding, PixelEncoding::BayerRggb8);
    }

    #[test]
    fn test_unknown_bayer_pattern_is_rejected() {
        for bits in [8, 16] {
            let err = resolve_encoding("BayerXY", bits).expect_err("unknown pattern");
            assert!(matches!(
                err,
                CameraError::UnknownBayerPattern { bits_per_pixel, .. } if bits_per_pixel == bits
            ));
        }
    }

    #[test]
    fn test_filterless_mapping_follows_depth() {
        assert_eq!(
            resolve_encoding(COLOR_FILTER_NONE, 16).expect("mono16"),
            PixelEncoding::Mono16
        );
        assert_eq!(
            resolve_encoding(COLOR_FILTER_NONE, 24).expect("rgb8"),
            PixelEncoding::Rgb8
        );
        assert_eq!(
            resolve_encoding(COLOR_FILTER_NONE, 8).expect("mono8"),
            PixelEncoding::Mono8
        );
        assert_eq!(
            resolve_encoding(COLOR_FILTER_NONE, 10).expect("mono8 fallback"),
            PixelEncoding::Mono8
        );
    }

    #[test]
    fn test_timestamp_split() {
        let stamp = Timestamp::from_nanos(3_500_000_123);
        assert_eq!(stamp.secs, 3);
        assert_eq!(stamp.nanos, 500_000_123);
    }

    #[test]
    fn test_fill_preserves_exact_stride() {
        let mut image = ImageBuffer::new();
        fill_image(&mut image, &raw(640, 480, 640, 8), PixelEncoding::Mono8, "cam")
            .expect("fill succeeds");
        assert_eq!(image.stride, 640);
        assert_eq!(image.data.len(), 640 * 480);
        assert_eq!(image.encoding, PixelEncoding::Mono8);
        assert_eq!(image.frame_id, "cam");
    }

    #[test]
    fn test_fill_preserves_padded_stride() {
        let mut image = ImageBuffer::new();
        fill_image(&mut image, &raw(640, 480, 648, 8), PixelEncoding::Mono8, "cam")
            .expect("fill succeeds");
        assert_eq!(image.stride, 648, "padding must not be recomputed away");
        assert_eq!(image.data.len(), 648 * 480);
    }

    #[test]
    fn test_short_buffer_leaves_image_untouched() {
        let mut frame = raw(640, 480, 640, 8);
        frame.data.truncate(100);

        let mut image = ImageBuffer::new();
        image.frame_id = "previous".to_owned();
        image.width = 77;

        let err = fill_image(&mut image, &frame, PixelEncoding::Mono8, "cam")
            .expect_err("short buffer");
        assert!(matches!(err, CameraError::FrameRetrieval { .. }));
        assert_eq!(image.frame_id, "previous");
        assert_eq!(image.width, 77);
        assert!(image.data.is_empty());
    }
}
