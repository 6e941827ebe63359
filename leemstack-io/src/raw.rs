//! Headered raw binary frames.
//!
//! Each file holds an opaque header of unknown length followed by
//! `height * width` samples. The header length is inferred per file as
//! `file_size - payload_len`, so only the tail is decoded.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use ndarray::Array2;

use leemstack_core::SampleDepth;

use crate::request::{ByteOrder, RawLayout};
use crate::{IngestError, Result};

/// Decodes the trailing payload of `bytes` into an `(H, W)` frame.
///
/// # Errors
/// [`IngestError::MalformedFrame`] when `bytes` is shorter than one payload,
/// plus any layout validation error.
pub fn decode_frame(path: &Path, bytes: &[u8], layout: &RawLayout) -> Result<Array2<u16>> {
    let payload_len = layout.payload_len()?;
    let Some(header_len) = bytes.len().checked_sub(payload_len) else {
        return Err(IngestError::MalformedFrame {
            path: path.to_path_buf(),
            file_size: bytes.len(),
            payload_len,
        });
    };
    let payload = &bytes[header_len..];

    let samples: Vec<u16> = match layout.sample_depth()? {
        SampleDepth::U8 => payload.iter().copied().map(u16::from).collect(),
        SampleDepth::U16 => payload
            .chunks_exact(2)
            .map(|pair| {
                let pair = [pair[0], pair[1]];
                match layout.byte_order {
                    ByteOrder::Little => u16::from_le_bytes(pair),
                    ByteOrder::Big => u16::from_be_bytes(pair),
                }
            })
            .collect(),
    };

    Array2::from_shape_vec((layout.height, layout.width), samples).map_err(|_| {
        IngestError::InvalidDimensions {
            height: layout.height,
            width: layout.width,
        }
    })
}

/// Memory-maps `path` and decodes its trailing frame.
///
/// # Errors
/// [`IngestError::Io`] if the file cannot be opened or mapped, otherwise as
/// [`decode_frame`].
pub fn read_frame(path: &Path, layout: &RawLayout) -> Result<Array2<u16>> {
    let payload_len = layout.payload_len()?;
    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    let file_size = file
        .metadata()
        .map_err(|e| IngestError::io(path, e))?
        .len();
    let file_size = usize::try_from(file_size).unwrap_or(usize::MAX);
    if file_size < payload_len {
        return Err(IngestError::MalformedFrame {
            path: path.to_path_buf(),
            file_size,
            payload_len,
        });
    }

    // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
    // This is the standard safety contract for memory mapping.
    #[allow(unsafe_code)]
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| IngestError::io(path, e))?;
    log::trace!(
        "{}: header {} bytes",
        path.display(),
        mmap.len().saturating_sub(payload_len)
    );
    decode_frame(path, &mmap[..], layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn frame_bytes(samples: &[u16], order: ByteOrder) -> Vec<u8> {
        samples
            .iter()
            .flat_map(|s| match order {
                ByteOrder::Little => s.to_le_bytes(),
                ByteOrder::Big => s.to_be_bytes(),
            })
            .collect()
    }

    #[test]
    fn test_decode_skips_header() {
        let layout = RawLayout::new("unused", 2, 3);
        let mut bytes = vec![0xAB; 37];
        bytes.extend(frame_bytes(&[1, 2, 3, 4, 5, 600], ByteOrder::Little));
        let frame = decode_frame(Path::new("f.dat"), &bytes, &layout).unwrap();
        assert_eq!(frame.dim(), (2, 3));
        assert_eq!(frame[[0, 0]], 1);
        assert_eq!(frame[[1, 2]], 600);
    }

    #[test]
    fn test_decode_big_endian() {
        let layout = RawLayout::new("unused", 1, 2).with_byte_order(ByteOrder::Big);
        let bytes = frame_bytes(&[0x0102, 0xFF00], ByteOrder::Big);
        let frame = decode_frame(Path::new("f.dat"), &bytes, &layout).unwrap();
        assert_eq!(frame.as_slice().unwrap(), &[0x0102, 0xFF00]);
    }

    #[test]
    fn test_decode_eight_bit() {
        let layout = RawLayout::new("unused", 2, 2).with_bit_depth(8);
        let bytes = [9u8, 9, 10, 20, 30, 255];
        let frame = decode_frame(Path::new("f.dat"), &bytes, &layout).unwrap();
        assert_eq!(frame.as_slice().unwrap(), &[10, 20, 30, 255]);
    }

    #[test]
    fn test_short_file_is_malformed() {
        let layout = RawLayout::new("unused", 4, 4);
        let err = decode_frame(Path::new("short.dat"), &[0u8; 31], &layout).unwrap_err();
        match err {
            IngestError::MalformedFrame {
                path,
                file_size,
                payload_len,
            } => {
                assert_eq!(path, Path::new("short.dat"));
                assert_eq!(file_size, 31);
                assert_eq!(payload_len, 32);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_frame_from_file() {
        let layout = RawLayout::new("unused", 2, 2);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"HEADER").unwrap();
        file.write_all(&frame_bytes(&[7, 8, 9, 10], ByteOrder::Little))
            .unwrap();
        file.flush().unwrap();
        let frame = read_frame(file.path(), &layout).unwrap();
        assert_eq!(frame.as_slice().unwrap(), &[7, 8, 9, 10]);
    }

    #[test]
    fn test_read_empty_file_is_malformed() {
        let layout = RawLayout::new("unused", 2, 2);
        let file = NamedTempFile::new().unwrap();
        assert!(matches!(
            read_frame(file.path(), &layout),
            Err(IngestError::MalformedFrame { file_size: 0, .. })
        ));
    }
}
