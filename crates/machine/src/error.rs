//! The one fallible machine-level operation: validating a raw floppy image buffer
//! before mounting it. Reading the image from disk is the out-of-scope loader's job;
//! this crate only guards against an absurd buffer once it already has the bytes.

use thiserror::Error;

/// An image larger than this can't represent a real floppy under this drive's
/// 2048-sector, 128-byte-sector addressing (`(MAX_SECTOR + 1) * SECTOR_SIZE`).
pub const MAX_FLOPPY_IMAGE_BYTES: usize = (crate::floppy::MAX_SECTOR as usize + 1) * crate::floppy::SECTOR_SIZE;

#[derive(Debug, Error)]
pub enum MachineError {
    #[error("floppy image is {actual} bytes, larger than the drive can address ({MAX_FLOPPY_IMAGE_BYTES} bytes)")]
    FloppyImageTooLarge { actual: usize },
}
