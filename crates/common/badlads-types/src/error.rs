use thiserror::Error;

/// Errors raised while interpreting values that arrived over the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("expected {expected} floats for {record}, got {found}")]
    FloatCount {
        record: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("buffer of {len} bytes is not a whole number of {element}-byte elements")]
    RaggedArray { len: usize, element: usize },

    #[error("unknown ban reply code: {0}")]
    UnknownBanReply(i32),

    #[error("unknown door state: {0}")]
    UnknownDoorState(i32),

    #[error("unknown collision channel: {0}")]
    UnknownCollisionChannel(u32),
}

/// Errors raised when object flags are used where a single category is required.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagError {
    #[error("no object category selected")]
    Empty,

    #[error("flags {0:#010b} select more than one object category")]
    MultipleBits(u8),

    #[error("the match-all sentinel cannot select a single object category")]
    Wildcard,

    #[error("flags {0:#010b} do not name a known object category")]
    Unknown(u8),
}
