//! Error types for conditions that are genuinely fatal to a caller, as opposed to
//! CPU-internal faults (unknown opcode, RedBus timeout) which are recoverable by
//! design and surfaced as state, not `Result`s.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedpcError {
    #[error("no disk image argument was given")]
    MissingDiskImage,

    #[error("floppy image '{path}' could not be read: {source}")]
    UnreadableFloppyImage {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
