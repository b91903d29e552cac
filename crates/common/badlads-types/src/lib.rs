pub mod collision;
pub mod color;
pub mod error;
pub mod flags;
pub mod handle;
pub mod math;
pub mod player;

pub use collision::CollisionChannel;
pub use color::Color;
pub use error::{FlagError, WireError};
pub use flags::{ObjectFlags, ObjectKind};
pub use handle::ObjectHandle;
pub use math::{Bounds, Rotation, Transform, Vector};
pub use player::{AccountId, BanReply, DoorState};
