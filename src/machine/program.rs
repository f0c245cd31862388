//! Program image loading and serialization.
//!
//! A Universal Machine image is a sequence of 32-bit platters stored
//! big-endian, most significant byte first. The decoded sequence becomes
//! segment 0; a zero-platter image is legal and faults on its first fetch.

use crate::machine::errors::MachineError;
use std::fs;
use std::path::Path;

/// Decoded program image: the initial contents of segment 0.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProgramImage {
    /// Platters in fetch order.
    pub words: Vec<u32>,
}

impl ProgramImage {
    /// Builds an image directly from platters.
    pub fn from_words(words: Vec<u32>) -> Self {
        Self { words }
    }

    /// Decodes a binary image.
    ///
    /// Rejects inputs whose length is not a multiple of four before any
    /// execution can begin.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MachineError> {
        if bytes.len() % 4 != 0 {
            return Err(MachineError::MalformedImage { len: bytes.len() });
        }

        let words = bytes
            .chunks_exact(4)
            .map(|quad| u32::from_be_bytes(quad.try_into().unwrap()))
            .collect();
        Ok(Self { words })
    }

    /// Reads and decodes an image file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MachineError> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| MachineError::ImageIo(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(&bytes)
    }

    /// Re-encodes the image to its on-disk representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.words.len() * 4);
        for word in &self.words {
            out.extend_from_slice(&word.to_be_bytes());
        }
        out
    }

    /// Number of platters in the image.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true for a zero-platter image.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_bytes_empty() {
        let image = ProgramImage::from_bytes(&[]).unwrap();
        assert!(image.is_empty());
    }

    #[test]
    fn from_bytes_is_big_endian() {
        let image = ProgramImage::from_bytes(&[0x12, 0x34, 0x56, 0x78]).unwrap();
        assert_eq!(image.words, vec![0x1234_5678]);
    }

    #[test]
    fn from_bytes_rejects_partial_platters() {
        for len in [1usize, 2, 3, 5, 7] {
            let err = ProgramImage::from_bytes(&vec![0u8; len]).unwrap_err();
            assert!(matches!(err, MachineError::MalformedImage { len: l } if l == len));
        }
    }

    #[test]
    fn round_trip_preserves_words() {
        let image = ProgramImage::from_words(vec![0x7000_0000, 0xD000_0041, 0, u32::MAX]);
        let decoded = ProgramImage::from_bytes(&image.to_bytes()).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn from_file_reads_image() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x70, 0x00, 0x00, 0x00]).unwrap();
        let image = ProgramImage::from_file(file.path()).unwrap();
        assert_eq!(image.words, vec![0x7000_0000]);
    }

    #[test]
    fn from_file_missing_path() {
        let err = ProgramImage::from_file("/nonexistent/image.um").unwrap_err();
        assert!(matches!(err, MachineError::ImageIo(_)));
    }
}
