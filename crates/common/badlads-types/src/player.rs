use crate::error::WireError;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::Display;

/// Platform account id of a connected player (a 64-bit SteamId on Steam servers).
///
/// `0` means the player state could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(u64);

impl AccountId {
    pub const NONE: AccountId = AccountId(0);

    #[inline]
    pub const fn from_wire(raw: u64) -> Self {
        AccountId(raw)
    }

    #[inline]
    pub const fn to_wire(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a ban request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[repr(i32)]
pub enum BanReply {
    Banned = 0,
    AlreadyBanned = 1,
    InvalidPlayerId = 2,
}

impl BanReply {
    #[inline]
    pub const fn to_wire(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for BanReply {
    type Error = WireError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BanReply::Banned),
            1 => Ok(BanReply::AlreadyBanned),
            2 => Ok(BanReply::InvalidPlayerId),
            other => Err(WireError::UnknownBanReply(other)),
        }
    }
}

/// Requested state of an estate door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[repr(i32)]
pub enum DoorState {
    Closed = 0,
    OpenForwards = 1,
    OpenBackwards = -1,
}

impl DoorState {
    #[inline]
    pub const fn to_wire(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for DoorState {
    type Error = WireError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DoorState::Closed),
            1 => Ok(DoorState::OpenForwards),
            -1 => Ok(DoorState::OpenBackwards),
            other => Err(WireError::UnknownDoorState(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ban_reply_codes() {
        for reply in [BanReply::Banned, BanReply::AlreadyBanned, BanReply::InvalidPlayerId] {
            assert_eq!(BanReply::try_from(reply.to_wire()), Ok(reply));
        }
        assert_eq!(BanReply::try_from(3), Err(WireError::UnknownBanReply(3)));
    }

    #[test]
    fn door_state_codes() {
        assert_eq!(DoorState::OpenBackwards.to_wire(), -1);
        assert_eq!(DoorState::try_from(1), Ok(DoorState::OpenForwards));
        assert!(DoorState::try_from(2).is_err());
    }

    #[test]
    fn zero_account_is_invalid() {
        assert!(!AccountId::NONE.is_valid());
        assert!(AccountId::from_wire(76561198000000000).is_valid());
    }
}
