use badlads_types::WireError;
use thiserror::Error;

/// Errors raised by the owned-buffer protocol.
///
/// The facade treats every one of these as a protocol violation and panics;
/// the `try_*` decoders return them for callers that want to inspect the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("pointer {0:#x} is not a live guest allocation (already claimed, released, or never allocated)")]
    NotLive(usize),

    #[error("write of {len} bytes overflows allocation {ptr:#x} of {capacity} bytes")]
    Overflow {
        ptr: usize,
        len: usize,
        capacity: usize,
    },

    #[error("owned string is not valid UTF-8: {0}")]
    Utf8(String),

    #[error(transparent)]
    Wire(#[from] WireError),
}
