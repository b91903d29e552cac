//! Write BadLads server plugins in Rust.
//!
//! A plugin is a wasm module the game server loads. It implements [`Plugin`], exports
//! it with [`export_plugin!`], and talks to the game through a [`Server`]:
//!
//! ```ignore
//! use badlads_sdk::{ChatOptions, ChatVerdict, ObjectHandle, Plugin, Server, WasmHost};
//!
//! struct Greeter {
//!     server: Server<WasmHost>,
//! }
//!
//! impl Default for Greeter {
//!     fn default() -> Self {
//!         Self { server: Server::new(WasmHost) }
//!     }
//! }
//!
//! impl Plugin for Greeter {
//!     fn on_player_login(&mut self, player_state: ObjectHandle) {
//!         if let Some(name) = self.server.player_name(player_state) {
//!             self.server.broadcast(&format!("{name} joined"), ChatOptions::default());
//!         }
//!     }
//!
//!     fn on_chat_message(&mut self, _player: ObjectHandle, message: &str) -> ChatVerdict {
//!         ChatVerdict::from(!message.starts_with('!'))
//!     }
//! }
//!
//! badlads_sdk::export_plugin!(Greeter);
//! ```
//!
//! Handles, flags and value records come from `badlads-types` and are re-exported
//! here.

pub mod alloc;
pub mod buffer;
pub mod error;
pub mod events;
pub mod host;
pub mod options;
pub mod server;
pub mod testing;

pub use buffer::{BufferPtr, GuestText, OwnedBuffer};
pub use error::BufferError;
pub use events::{ChatVerdict, EventDispatcher, Plugin};
pub use host::HostCalls;
#[cfg(target_arch = "wasm32")]
pub use host::WasmHost;
pub use options::{ChatOptions, ItemGrant, JobChange, SpawnOptions};
pub use server::{Server, Spawned, TraceDistance};

pub use badlads_host_abi as abi;
pub use badlads_types::{
    AccountId, BanReply, Bounds, CollisionChannel, Color, DoorState, FlagError, ObjectFlags,
    ObjectHandle, ObjectKind, Rotation, Transform, Vector, WireError,
};
