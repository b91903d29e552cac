use crate::alloc;
use crate::error::BufferError;
use badlads_types::{Bounds, ObjectHandle, Transform, WireError};
use std::fmt;

/// Raw pointer returned by an `*Owned*` host import. `0` means "no data".
///
/// Holding a `BufferPtr` does not own anything; [`OwnedBuffer::claim`] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct BufferPtr(usize);

impl BufferPtr {
    pub const NULL: BufferPtr = BufferPtr(0);

    #[inline]
    pub const fn from_wire(raw: usize) -> Self {
        BufferPtr(raw)
    }

    #[inline]
    pub const fn addr(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BufferPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A host→guest buffer the guest now exclusively owns.
///
/// Created by claiming the pointer an owned import returned. Every decoder takes
/// `self`, so a buffer is interpreted at most once, and its memory is freed when the
/// decoded value (or the buffer itself) is dropped.
#[derive(Debug, PartialEq, Eq)]
pub struct OwnedBuffer {
    bytes: Vec<u8>,
    class_id: u32,
}

impl OwnedBuffer {
    /// Takes ownership of the allocation at `ptr`.
    ///
    /// Returns `Ok(None)` for a null pointer. Claiming a pointer that is not a live
    /// allocation (for example, one that was already claimed) is
    /// [`BufferError::NotLive`].
    pub fn claim(ptr: BufferPtr) -> Result<Option<Self>, BufferError> {
        if ptr.is_null() {
            return Ok(None);
        }
        let claimed = alloc::claim(ptr.addr())?;
        Ok(Some(OwnedBuffer {
            bytes: claimed.bytes,
            class_id: claimed.class_id,
        }))
    }

    /// Class id the host passed to `__new`.
    pub fn class_id(&self) -> u32 {
        self.class_id
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Decodes UTF-8 text. A trailing NUL terminator, if the host added one, is dropped.
    pub fn try_into_string(self) -> Result<String, BufferError> {
        let mut bytes = self.bytes;
        if bytes.last() == Some(&0) {
            bytes.pop();
        }
        String::from_utf8(bytes).map_err(|e| BufferError::Utf8(e.utf8_error().to_string()))
    }

    /// Decodes UTF-8 text.
    ///
    /// # Panics
    ///
    /// Invalid UTF-8 is a protocol violation and aborts the current call.
    pub fn into_string(self) -> String {
        fatal(self.try_into_string())
    }

    /// Decodes a little-endian `u64` array.
    pub fn try_into_u64s(self) -> Result<Vec<u64>, BufferError> {
        elements::<8, u64>(&self.bytes, u64::from_le_bytes)
    }

    /// # Panics
    ///
    /// A byte length that is not a multiple of 8 is a protocol violation.
    pub fn into_u64s(self) -> Vec<u64> {
        fatal(self.try_into_u64s())
    }

    /// Decodes a handle array. An empty buffer is an empty result, not an error.
    ///
    /// # Panics
    ///
    /// A byte length that is not a multiple of 8 is a protocol violation.
    pub fn into_handles(self) -> Vec<ObjectHandle> {
        self.into_u64s()
            .into_iter()
            .map(ObjectHandle::from_wire)
            .collect()
    }

    /// Decodes a little-endian `f32` array.
    pub fn try_into_f32s(self) -> Result<Vec<f32>, BufferError> {
        elements::<4, f32>(&self.bytes, f32::from_le_bytes)
    }

    /// # Panics
    ///
    /// A byte length that is not a multiple of 4 is a protocol violation.
    pub fn into_f32s(self) -> Vec<f32> {
        fatal(self.try_into_f32s())
    }

    pub fn try_into_transform(self) -> Result<Transform, BufferError> {
        let floats = self.try_into_f32s()?;
        Ok(Transform::from_wire(&floats)?)
    }

    /// # Panics
    ///
    /// Anything other than exactly 9 floats is a protocol violation.
    pub fn into_transform(self) -> Transform {
        fatal(self.try_into_transform())
    }

    pub fn try_into_bounds(self) -> Result<Bounds, BufferError> {
        let floats = self.try_into_f32s()?;
        Ok(Bounds::from_wire(&floats)?)
    }

    /// # Panics
    ///
    /// Anything other than exactly 6 floats is a protocol violation.
    pub fn into_bounds(self) -> Bounds {
        fatal(self.try_into_bounds())
    }
}

fn elements<const N: usize, T>(bytes: &[u8], decode: fn([u8; N]) -> T) -> Result<Vec<T>, BufferError> {
    if bytes.len() % N != 0 {
        return Err(WireError::RaggedArray {
            len: bytes.len(),
            element: N,
        }
        .into());
    }
    Ok(bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut raw = [0u8; N];
            raw.copy_from_slice(chunk);
            decode(raw)
        })
        .collect())
}

/// Unwraps a protocol decode, aborting the current call on violation.
pub(crate) fn fatal<T>(result: Result<T, BufferError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("badlads protocol violation: {e}"),
    }
}

/// Guest→host UTF-8 text.
///
/// The guest keeps ownership; the host may only read `(ptr, wire_len)` for the duration
/// of the call that receives it. A NUL terminator is appended and counted in
/// `wire_len`, matching what the host has always been sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestText {
    bytes: Vec<u8>,
}

impl GuestText {
    pub fn encode(text: &str) -> Self {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        Self { bytes }
    }

    pub fn ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    /// Byte length sent to the host, terminator included.
    pub fn wire_len(&self) -> i32 {
        i32::try_from(self.bytes.len()).unwrap_or(i32::MAX)
    }

    /// The encoded bytes, terminator included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The text without its terminator.
    pub fn as_str(&self) -> &str {
        let text = &self.bytes[..self.bytes.len() - 1];
        // built from a &str plus a trailing NUL
        std::str::from_utf8(text).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use badlads_host_abi::{ARRAY_BUFFER_CLASS_ID, STRING_CLASS_ID};

    /// Does what the host does for an owned result: allocate, write, pin.
    fn host_serves(bytes: &[u8], class_id: u32) -> BufferPtr {
        let ptr = alloc::allocate(bytes.len(), class_id);
        alloc::fill(ptr, bytes).unwrap();
        BufferPtr::from_wire(alloc::pin(ptr))
    }

    #[test]
    fn null_pointer_is_absence() {
        assert_eq!(OwnedBuffer::claim(BufferPtr::NULL), Ok(None));
    }

    #[test]
    fn claim_consumes_the_allocation() {
        let before = alloc::live_count();
        let ptr = host_serves(b"hello", STRING_CLASS_ID);
        assert_eq!(alloc::live_count(), before + 1);

        let buffer = OwnedBuffer::claim(ptr).unwrap().unwrap();
        assert_eq!(alloc::live_count(), before);
        assert_eq!(buffer.class_id(), STRING_CLASS_ID);
        assert_eq!(buffer.into_string(), "hello");

        // A second claim of the same pointer is detected rather than decoding stale memory.
        assert_eq!(
            OwnedBuffer::claim(ptr),
            Err(BufferError::NotLive(ptr.addr()))
        );
    }

    #[test]
    fn zero_length_results_are_empty_not_absent() {
        let text = OwnedBuffer::claim(host_serves(b"", STRING_CLASS_ID))
            .unwrap()
            .expect("zero-length buffer is still data");
        assert_eq!(text.into_string(), "");

        let handles = OwnedBuffer::claim(host_serves(b"", ARRAY_BUFFER_CLASS_ID))
            .unwrap()
            .unwrap();
        assert!(handles.into_handles().is_empty());
    }

    #[test]
    fn strings_drop_a_trailing_terminator() {
        let buffer = OwnedBuffer::claim(host_serves(b"1.4.2\0", STRING_CLASS_ID))
            .unwrap()
            .unwrap();
        assert_eq!(buffer.into_string(), "1.4.2");
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let buffer = OwnedBuffer::claim(host_serves(&[0x66, 0xFF, 0x6F], STRING_CLASS_ID))
            .unwrap()
            .unwrap();
        assert!(matches!(buffer.try_into_string(), Err(BufferError::Utf8(_))));
    }

    #[test]
    #[should_panic(expected = "badlads protocol violation")]
    fn invalid_utf8_aborts_the_strict_decoder() {
        let buffer = OwnedBuffer::claim(host_serves(&[0xC3, 0x28], STRING_CLASS_ID))
            .unwrap()
            .unwrap();
        let _ = buffer.into_string();
    }

    #[test]
    fn handle_arrays_decode_little_endian() {
        let handles: [u64; 3] = [1, 0x0800_0000_0000_002A, u64::MAX];
        let bytes: Vec<u8> = handles.iter().flat_map(|h| h.to_le_bytes()).collect();
        let buffer = OwnedBuffer::claim(host_serves(&bytes, ARRAY_BUFFER_CLASS_ID))
            .unwrap()
            .unwrap();
        let decoded = buffer.into_handles();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[1].type_tag(), 0x08);
        assert_eq!(decoded[1].instance_id(), 42);
        assert_eq!(decoded[2].to_wire(), u64::MAX);
    }

    #[test]
    fn ragged_arrays_are_rejected() {
        let buffer = OwnedBuffer::claim(host_serves(&[0u8; 12], ARRAY_BUFFER_CLASS_ID))
            .unwrap()
            .unwrap();
        assert_eq!(
            buffer.try_into_u64s(),
            Err(BufferError::Wire(WireError::RaggedArray { len: 12, element: 8 }))
        );
    }

    #[test]
    fn transform_buffers_need_nine_floats() {
        let floats: Vec<u8> = (1..=9).flat_map(|i| (i as f32).to_le_bytes()).collect();
        let transform = OwnedBuffer::claim(host_serves(&floats, ARRAY_BUFFER_CLASS_ID))
            .unwrap()
            .unwrap()
            .into_transform();
        assert_eq!(transform.scale.z, 9.0);

        let short: Vec<u8> = (1..=6).flat_map(|i| (i as f32).to_le_bytes()).collect();
        let buffer = OwnedBuffer::claim(host_serves(&short, ARRAY_BUFFER_CLASS_ID))
            .unwrap()
            .unwrap();
        assert!(matches!(
            buffer.try_into_transform(),
            Err(BufferError::Wire(WireError::FloatCount { expected: 9, found: 6, .. }))
        ));
    }

    #[test]
    fn guest_text_counts_its_terminator() {
        let text = GuestText::encode("héllo");
        assert_eq!(text.wire_len(), 7);
        assert_eq!(text.as_bytes().last(), Some(&0));
        assert_eq!(text.as_str(), "héllo");
        assert_eq!(GuestText::encode("").wire_len(), 1);
    }
}
