use crate::flags::{ObjectFlags, ObjectKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a host-owned game object.
///
/// The host packs two fields into the 64-bit value:
///
/// - bits 56..64 (top byte of the upper word): the object type tag, one of the
///   [`ObjectFlags`] category bits
/// - bits 0..32: the instance id used for the host's bucket lookup
///
/// Bits 32..56 are reserved and never interpreted. The value `0` means "no object".
///
/// Handles only ever come from the host (query results, spawns, derived lookups)
/// and are passed back unmodified. There is no constructor taking a
/// tag and an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    /// The "no object" handle.
    pub const NONE: ObjectHandle = ObjectHandle(0);

    const TAG_SHIFT: u32 = 56;
    const ID_MASK: u64 = 0xFFFF_FFFF;

    /// Wraps a raw value received from the host.
    ///
    /// Only values that crossed the boundary from the host belong here. Binding code
    /// (the sdk, host runtimes, test doubles) calls this; plugins get handles from
    /// query results and events instead.
    #[doc(hidden)]
    #[inline]
    pub const fn from_wire(raw: u64) -> Self {
        ObjectHandle(raw)
    }

    /// The raw value to pass back to the host.
    #[inline]
    pub const fn to_wire(self) -> u64 {
        self.0
    }

    /// Type tag stored in the top byte of the upper word.
    #[inline]
    pub const fn type_tag(self) -> u8 {
        (self.0 >> Self::TAG_SHIFT) as u8
    }

    /// Instance id stored in the lower 32 bits.
    #[inline]
    pub const fn instance_id(self) -> u32 {
        (self.0 & Self::ID_MASK) as u32
    }

    /// `false` for the zero handle. Says nothing about whether the host object still exists.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// `None` when the handle is zero.
    #[inline]
    pub fn valid(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }

    /// Object category named by the type tag, if the tag is a single known category bit.
    pub fn kind(self) -> Option<ObjectKind> {
        ObjectKind::try_from(ObjectFlags::from_bits(self.type_tag())).ok()
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(tag: u8, reserved: u32, id: u32) -> u64 {
        ((tag as u64) << 56) | (((reserved & 0x00FF_FFFF) as u64) << 32) | id as u64
    }

    #[test]
    fn fields_decode_from_their_bit_ranges() {
        let tags = [0u8, 1, 2, 4, 8, 16, 32, 64, 0x80, 0xFF];
        let ids = [0u32, 1, 42, 0x7FFF_FFFF, 0x8000_0000, u32::MAX];
        let reserved = [0u32, 0x00AB_CDEF, 0x00FF_FFFF];

        for &tag in &tags {
            for &id in &ids {
                for &res in &reserved {
                    let value = raw(tag, res, id);
                    let handle = ObjectHandle::from_wire(value);
                    assert_eq!(handle.type_tag(), ((value >> 32) >> 24) as u8);
                    assert_eq!(handle.type_tag(), tag);
                    assert_eq!(handle.instance_id() as u64, value & 0xFFFF_FFFF);
                    assert_eq!(handle.instance_id(), id);
                    assert_eq!(handle.is_valid(), value != 0);
                    assert_eq!(handle.to_wire(), value);
                }
            }
        }
    }

    #[test]
    fn zero_is_the_only_invalid_handle() {
        assert!(!ObjectHandle::NONE.is_valid());
        assert!(!ObjectHandle::from_wire(0).is_valid());
        assert_eq!(ObjectHandle::from_wire(0).valid(), None);

        // tag = 0 with a live id is still a valid reference
        assert!(ObjectHandle::from_wire(7).is_valid());
        // id = 0 with a tag is also valid
        assert!(ObjectHandle::from_wire(raw(8, 0, 0)).is_valid());
    }

    #[test]
    fn kind_reads_single_category_tags_only() {
        let vehicle = ObjectHandle::from_wire(raw(ObjectFlags::VEHICLES.bits(), 0, 9));
        assert_eq!(vehicle.kind(), Some(ObjectKind::Vehicle));

        let wildcard = ObjectHandle::from_wire(raw(0xFF, 0, 9));
        assert_eq!(wildcard.kind(), None);

        let untagged = ObjectHandle::from_wire(9);
        assert_eq!(untagged.kind(), None);
    }

    #[test]
    fn serializes_as_the_bare_integer() {
        let handle = ObjectHandle::from_wire(raw(2, 0, 77));
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, raw(2, 0, 77).to_string());
    }
}
