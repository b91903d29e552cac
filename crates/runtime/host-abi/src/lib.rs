pub mod bindings;
pub mod error;
pub mod manifest;

pub use error::ManifestError;
pub use manifest::{
    FnShape, GuestEvent, MemoryExport, Signature, WireType, HOST_IMPORTS,
};

/// Wasm import module every host function is declared under.
pub const IMPORT_MODULE: &str = "badlads";

/// Class id passed to `__new` for plain byte buffers.
pub const ARRAY_BUFFER_CLASS_ID: u32 = 1;

/// Class id passed to `__new` for UTF-8 string buffers.
pub const STRING_CLASS_ID: u32 = 2;

pub const BADLADS_HOST_ABI_VERSION: u32 = 2; // 1 → 2 when line traces were added
