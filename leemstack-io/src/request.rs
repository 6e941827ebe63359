//! Load requests: where frames come from and how to interpret them.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use leemstack_core::{EnergySettings, SampleDepth};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{IngestError, Result};

/// Byte order of multi-byte raw samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ByteOrder {
    /// Least significant byte first (Intel).
    #[default]
    Little,
    /// Most significant byte first (Motorola).
    Big,
}

impl FromStr for ByteOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "little" | "le" => Ok(Self::Little),
            "b" | "big" | "be" => Ok(Self::Big),
            other => Err(format!("unknown byte order '{other}'")),
        }
    }
}

/// Layout of headered raw binary frames.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawLayout {
    /// Directory holding one file per energy.
    pub dir: PathBuf,
    /// Frame height in pixels.
    pub height: usize,
    /// Frame width in pixels.
    pub width: usize,
    /// Bits per sample (8 or 16).
    pub bit_depth: u8,
    /// Byte order of 16-bit samples.
    pub byte_order: ByteOrder,
    /// File extension filter, without the dot.
    pub extension: String,
}

impl RawLayout {
    /// 16-bit little-endian `.dat` frames of the given size.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, height: usize, width: usize) -> Self {
        Self {
            dir: dir.into(),
            height,
            width,
            bit_depth: 16,
            byte_order: ByteOrder::Little,
            extension: "dat".to_string(),
        }
    }

    /// Sets the bit depth.
    #[must_use]
    pub fn with_bit_depth(mut self, bits: u8) -> Self {
        self.bit_depth = bits;
        self
    }

    /// Sets the byte order.
    #[must_use]
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Sets the extension filter.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Validated sample depth.
    ///
    /// # Errors
    /// [`IngestError::UnsupportedBitDepth`] for anything but 8 or 16 bits.
    pub fn sample_depth(&self) -> Result<SampleDepth> {
        SampleDepth::from_bits(self.bit_depth)
            .ok_or(IngestError::UnsupportedBitDepth(self.bit_depth))
    }

    /// Bytes occupied by one frame's samples.
    ///
    /// # Errors
    /// [`IngestError::UnsupportedBitDepth`] or [`IngestError::InvalidDimensions`].
    pub fn payload_len(&self) -> Result<usize> {
        let depth = self.sample_depth()?;
        if self.height == 0 || self.width == 0 {
            return Err(IngestError::InvalidDimensions {
                height: self.height,
                width: self.width,
            });
        }
        self.height
            .checked_mul(self.width)
            .and_then(|n| n.checked_mul(depth.bytes()))
            .ok_or(IngestError::InvalidDimensions {
                height: self.height,
                width: self.width,
            })
    }
}

/// Directory of raster images (tif, png, jpg, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageSource {
    /// Directory holding one image per energy.
    pub dir: PathBuf,
    /// File extension filter, with or without the dot.
    pub extension: String,
    /// Byte-swap 16-bit samples after decoding.
    pub swap_bytes: bool,
}

impl ImageSource {
    /// Images with the given extension.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            swap_bytes: false,
        }
    }

    /// Enables byte swapping of decoded samples.
    #[must_use]
    pub fn with_swap_bytes(mut self, swap: bool) -> Self {
        self.swap_bytes = swap;
        self
    }
}

/// Where the frames of a load come from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Source {
    /// Headered raw binary frames.
    Raw(RawLayout),
    /// Raster image files.
    Image(ImageSource),
}

impl Source {
    /// Source directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        match self {
            Source::Raw(layout) => &layout.dir,
            Source::Image(src) => &src.dir,
        }
    }

    /// Extension filter.
    #[must_use]
    pub fn extension(&self) -> &str {
        match self {
            Source::Raw(layout) => &layout.extension,
            Source::Image(src) => &src.extension,
        }
    }
}

/// Everything needed to build a stack: frame source plus energy settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoadRequest {
    /// Frame source.
    pub source: Source,
    /// Start energy and step for the energy axis.
    pub energy: EnergySettings,
}

impl LoadRequest {
    /// Request for raw frames.
    #[must_use]
    pub fn raw(layout: RawLayout) -> Self {
        Self {
            source: Source::Raw(layout),
            energy: EnergySettings::default(),
        }
    }

    /// Request for image frames.
    #[must_use]
    pub fn image(source: ImageSource) -> Self {
        Self {
            source: Source::Image(source),
            energy: EnergySettings::default(),
        }
    }

    /// Sets the start energy and step.
    #[must_use]
    pub fn with_energy(mut self, start: f64, step: f64) -> Self {
        self.energy = EnergySettings::new(start, step);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_len() {
        let layout = RawLayout::new("/tmp", 600, 592);
        assert_eq!(layout.payload_len().unwrap(), 2 * 600 * 592);
        let layout = layout.with_bit_depth(8);
        assert_eq!(layout.payload_len().unwrap(), 600 * 592);
    }

    #[test]
    fn test_payload_len_rejects_bad_layouts() {
        assert!(matches!(
            RawLayout::new("/tmp", 4, 4).with_bit_depth(12).payload_len(),
            Err(IngestError::UnsupportedBitDepth(12))
        ));
        assert!(matches!(
            RawLayout::new("/tmp", 0, 4).payload_len(),
            Err(IngestError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_byte_order_parsing() {
        assert_eq!("L".parse::<ByteOrder>(), Ok(ByteOrder::Little));
        assert_eq!("big".parse::<ByteOrder>(), Ok(ByteOrder::Big));
        assert!("middle".parse::<ByteOrder>().is_err());
    }
}
