use crate::error::WireError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Trace channel passed to the host's line trace.
///
/// The ordinals follow the host engine's channel table. Slots the host does not use
/// are kept as `Reserved*` variants so every later channel keeps its number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[repr(u32)]
pub enum CollisionChannel {
    WorldStatic = 0,
    WorldDynamic = 1,
    Player = 2,
    Visibility = 3,
    Camera = 4,
    PhysicsBody = 5,
    Reserved6 = 6,
    Destructible = 7,
    Reserved8 = 8,
    Reserved9 = 9,
    Reserved10 = 10,
    Reserved11 = 11,
    Reserved12 = 12,
    Reserved13 = 13,
    Interactable = 14,
    Hitscan = 15,
}

impl CollisionChannel {
    #[inline]
    pub const fn to_wire(self) -> u32 {
        self as u32
    }

    pub const fn is_reserved(self) -> bool {
        matches!(
            self,
            CollisionChannel::Reserved6
                | CollisionChannel::Reserved8
                | CollisionChannel::Reserved9
                | CollisionChannel::Reserved10
                | CollisionChannel::Reserved11
                | CollisionChannel::Reserved12
                | CollisionChannel::Reserved13
        )
    }
}

impl TryFrom<u32> for CollisionChannel {
    type Error = WireError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        use strum::IntoEnumIterator;
        CollisionChannel::iter()
            .find(|channel| channel.to_wire() == value)
            .ok_or(WireError::UnknownCollisionChannel(value))
    }
}
