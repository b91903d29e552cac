use crate::error::FlagError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use strum_macros::{Display, EnumIter};

/// Object category bitmask used to filter host queries.
///
/// Bits may be OR-combined for searches:
///
/// ```
/// use badlads_types::ObjectFlags;
///
/// let wheels_and_walls = ObjectFlags::VEHICLES | ObjectFlags::BUILDABLES;
/// assert!(wheels_and_walls.contains(ObjectFlags::VEHICLES));
/// ```
///
/// Operations that act on exactly one category take an [`ObjectKind`] instead;
/// use `ObjectKind::try_from(flags)` to narrow.
///
/// # Bit assignments
///
/// - bit 1 (`1 << 1`): player states
/// - bit 2 (`1 << 2`): player characters
/// - bit 3 (`1 << 3`): vehicles
/// - bit 4 (`1 << 4`): estate volumes
/// - bit 5 (`1 << 5`): estate objects
/// - bit 6 (`1 << 6`): buildables
///
/// [`ObjectFlags::ALL`] is `0xFF`, a wildcard the host matches against everything.
/// It is not the union of the named bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ObjectFlags(u8);

impl ObjectFlags {
    pub const NONE: ObjectFlags = ObjectFlags(0);
    pub const PLAYER_STATES: ObjectFlags = ObjectFlags(1 << 1);
    pub const PLAYER_CHARACTERS: ObjectFlags = ObjectFlags(1 << 2);
    pub const VEHICLES: ObjectFlags = ObjectFlags(1 << 3);
    pub const ESTATE_VOLUMES: ObjectFlags = ObjectFlags(1 << 4);
    pub const ESTATE_OBJECTS: ObjectFlags = ObjectFlags(1 << 5);
    pub const BUILDABLES: ObjectFlags = ObjectFlags(1 << 6);
    pub const ALL: ObjectFlags = ObjectFlags(u8::MAX);

    /// Union of the six named category bits.
    pub const KNOWN_MASK: u8 = 0b0111_1110;

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        ObjectFlags(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Value passed for `objectTypeFlags` parameters.
    #[inline]
    pub const fn to_wire(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_all(self) -> bool {
        self.0 == u8::MAX
    }

    /// `true` if every bit of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: ObjectFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// `true` if the handle's type tag is matched by this filter.
    pub fn matches_tag(self, tag: u8) -> bool {
        self.is_all() || (tag != 0 && self.0 & tag == tag)
    }

    /// Categories named by this mask. The wildcard yields every category.
    pub fn kinds(self) -> impl Iterator<Item = ObjectKind> {
        use strum::IntoEnumIterator;
        ObjectKind::iter().filter(move |kind| self.is_all() || self.contains(kind.flag()))
    }
}

impl BitOr for ObjectFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        ObjectFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ObjectFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<ObjectKind> for ObjectFlags {
    fn from(kind: ObjectKind) -> Self {
        kind.flag()
    }
}

impl fmt::Debug for ObjectFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("ObjectFlags(ALL)");
        }
        let names: Vec<String> = self.kinds().map(|kind| kind.to_string()).collect();
        write!(f, "ObjectFlags({:#010b} [{}])", self.0, names.join(" | "))
    }
}

/// Exactly one object category.
///
/// Discriminants equal the category bit so the value can go straight onto the wire
/// and be compared against a handle's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[repr(u8)]
pub enum ObjectKind {
    PlayerState = 1 << 1,
    PlayerCharacter = 1 << 2,
    Vehicle = 1 << 3,
    EstateVolume = 1 << 4,
    EstateObject = 1 << 5,
    Buildable = 1 << 6,
}

impl ObjectKind {
    #[inline]
    pub const fn flag(self) -> ObjectFlags {
        ObjectFlags(self as u8)
    }

    /// Value passed for single-flag `objectTypeFlag` parameters.
    #[inline]
    pub const fn to_wire(self) -> u32 {
        self as u32
    }
}

impl TryFrom<ObjectFlags> for ObjectKind {
    type Error = FlagError;

    fn try_from(flags: ObjectFlags) -> Result<Self, Self::Error> {
        let bits = flags.bits();
        if bits == 0 {
            return Err(FlagError::Empty);
        }
        if flags.is_all() {
            return Err(FlagError::Wildcard);
        }
        if !bits.is_power_of_two() {
            return Err(FlagError::MultipleBits(bits));
        }
        match bits {
            b if b == ObjectKind::PlayerState as u8 => Ok(ObjectKind::PlayerState),
            b if b == ObjectKind::PlayerCharacter as u8 => Ok(ObjectKind::PlayerCharacter),
            b if b == ObjectKind::Vehicle as u8 => Ok(ObjectKind::Vehicle),
            b if b == ObjectKind::EstateVolume as u8 => Ok(ObjectKind::EstateVolume),
            b if b == ObjectKind::EstateObject as u8 => Ok(ObjectKind::EstateObject),
            b if b == ObjectKind::Buildable as u8 => Ok(ObjectKind::Buildable),
            other => Err(FlagError::Unknown(other)),
        }
    }
}
