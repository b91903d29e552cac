//! Typed facade over [`HostCalls`].
//!
//! This is where the boundary policy lives:
//!
//! - an invalid handle (or an unresolved account id) never reaches the host
//! - owned results are claimed and decoded exactly once
//! - rejected mutations come back as `false`, absence as `None` or an empty `Vec`
//! - malformed host data panics, which traps the plugin instance
//!
//! Nothing here retries. Every method issues at most one call per host primitive.

use crate::buffer::{fatal, BufferPtr, GuestText, OwnedBuffer};
use crate::host::HostCalls;
use crate::options::{ChatOptions, ItemGrant, JobChange, SpawnOptions};
use badlads_types::{
    AccountId, BanReply, Bounds, CollisionChannel, DoorState, ObjectFlags, ObjectHandle,
    ObjectKind, Transform, Vector,
};
use std::fmt;
use tracing::debug;

/// Outcome of [`Server::spawn_object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawned {
    /// Spawned synchronously.
    Ready(ObjectHandle),
    /// Queued on the host. There is no handle to use; find the object later with a query.
    Pending,
    /// The host returned no object.
    Failed,
}

impl Spawned {
    /// The new object, only for synchronous spawns that succeeded.
    pub fn handle(self) -> Option<ObjectHandle> {
        match self {
            Spawned::Ready(handle) => Some(handle),
            Spawned::Pending | Spawned::Failed => None,
        }
    }
}

/// Distance reported by a line trace.
///
/// Passed through exactly as the host returned it. What the host reports when
/// nothing is hit is host-defined, so no "hit" predicate is offered.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TraceDistance(f32);

impl TraceDistance {
    pub const fn raw(self) -> f32 {
        self.0
    }
}

impl fmt::Display for TraceDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The game server, as seen from a plugin.
#[derive(Debug, Clone, Default)]
pub struct Server<H> {
    host: H,
}

impl<H: HostCalls> Server<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    // --- chat ---

    pub fn send_message(&self, player_state: ObjectHandle, message: &str, options: ChatOptions) {
        if !player_state.is_valid() {
            debug!("send_message: invalid player state, not sent");
            return;
        }
        let text = GuestText::encode(message);
        self.host.post_player_chat_message(
            player_state,
            &text,
            options.color.to_packed_bgr(),
            options.eventful,
        );
    }

    pub fn broadcast(&self, message: &str, options: ChatOptions) {
        let text = GuestText::encode(message);
        self.host
            .post_global_chat_message(&text, options.color.to_packed_bgr(), options.eventful);
    }

    // --- objects ---

    /// All objects matching `flags`.
    ///
    /// [`ObjectFlags::ALL`] matches everything. No matches is an empty `Vec`.
    pub fn objects(&self, flags: ObjectFlags) -> Vec<ObjectHandle> {
        if flags.is_empty() {
            debug!("objects: empty filter matches nothing");
            return Vec::new();
        }
        claim(self.host.object_ids(flags))
            .map(OwnedBuffer::into_handles)
            .unwrap_or_default()
    }

    /// Host game version, e.g. `"1.4.2"`. Empty when the host does not report one.
    pub fn badlads_version(&self) -> String {
        claim(self.host.badlads_version())
            .map(OwnedBuffer::into_string)
            .unwrap_or_default()
    }

    /// `false` is a normal outcome: the object is gone, or the host refused.
    pub fn is_object_valid(&self, object: ObjectHandle) -> bool {
        object.is_valid() && self.host.is_object_valid(object)
    }

    pub fn object_transform(&self, object: ObjectHandle) -> Option<Transform> {
        if !object.is_valid() {
            return None;
        }
        claim(self.host.object_transform(object)).map(OwnedBuffer::into_transform)
    }

    pub fn set_object_transform(&self, object: ObjectHandle, transform: &Transform) -> bool {
        object.is_valid() && self.host.set_object_transform(object, transform)
    }

    pub fn set_object_health(&self, object: ObjectHandle, health: i32) -> bool {
        object.is_valid() && self.host.set_object_health(object, health)
    }

    pub fn object_bounds(&self, object: ObjectHandle) -> Option<Bounds> {
        if !object.is_valid() {
            return None;
        }
        claim(self.host.object_bounds(object)).map(OwnedBuffer::into_bounds)
    }

    /// Engine class name of a category, e.g. `"BP_PlayerState_C"`.
    ///
    /// Takes a single [`ObjectKind`]; convert a mask with `ObjectKind::try_from`, which
    /// rejects combined flags.
    pub fn object_class_name(&self, kind: ObjectKind) -> Option<String> {
        claim(self.host.object_class_name(kind)).map(OwnedBuffer::into_string)
    }

    /// Spawns the `index`-th object of `kind` (indices are per category).
    pub fn spawn_object(
        &self,
        kind: ObjectKind,
        index: u32,
        transform: &Transform,
        options: SpawnOptions,
    ) -> Spawned {
        let raw = self
            .host
            .spawn_object(kind, index, options.asynchronous, transform);
        if options.asynchronous {
            // whatever came back is not a handle
            return Spawned::Pending;
        }
        match raw.valid() {
            Some(handle) => Spawned::Ready(handle),
            None => Spawned::Failed,
        }
    }

    /// Traces from `start` to `end` on `channel`, ignoring `ignored` (pass
    /// [`ObjectHandle::NONE`] to ignore nothing).
    pub fn line_trace(
        &self,
        ignored: ObjectHandle,
        channel: CollisionChannel,
        start: Vector,
        end: Vector,
    ) -> TraceDistance {
        TraceDistance(self.host.line_trace(ignored, channel, start, end))
    }

    // --- players ---

    pub fn player_name(&self, player_state: ObjectHandle) -> Option<String> {
        if !player_state.is_valid() {
            return None;
        }
        claim(self.host.player_name(player_state)).map(OwnedBuffer::into_string)
    }

    /// [`AccountId::NONE`] when the player state does not resolve.
    pub fn player_account_id(&self, player_state: ObjectHandle) -> AccountId {
        if !player_state.is_valid() {
            return AccountId::NONE;
        }
        self.host.player_account_id(player_state)
    }

    /// Player character currently controlled by `player_state`.
    pub fn player_character(&self, player_state: ObjectHandle) -> Option<ObjectHandle> {
        if !player_state.is_valid() {
            return None;
        }
        self.host.player_character(player_state).valid()
    }

    /// Kicks the player's account. `false` without calling the host when the account
    /// does not resolve.
    pub fn kick_player(&self, player_state: ObjectHandle) -> bool {
        match self.resolve_account("kick_player", player_state) {
            Some(account) => self.host.kick_account(account),
            None => false,
        }
    }

    /// Bans the player's account. [`BanReply::InvalidPlayerId`] without calling the
    /// host when the account does not resolve.
    ///
    /// # Panics
    ///
    /// On a reply code the host never defined.
    pub fn ban_player(&self, player_state: ObjectHandle) -> BanReply {
        let Some(account) = self.resolve_account("ban_player", player_state) else {
            return BanReply::InvalidPlayerId;
        };
        let code = self.host.ban_account(account);
        fatal(BanReply::try_from(code).map_err(Into::into))
    }

    pub fn unban_player(&self, player_state: ObjectHandle) -> bool {
        match self.resolve_account("unban_player", player_state) {
            Some(account) => self.host.unban_account(account),
            None => false,
        }
    }

    pub fn is_player_banned(&self, player_state: ObjectHandle) -> bool {
        match self.resolve_account("is_player_banned", player_state) {
            Some(account) => self.host.is_account_banned(account),
            None => false,
        }
    }

    /// `false` is a normal outcome, e.g. a full inventory.
    pub fn give_item(&self, player_state: ObjectHandle, grant: ItemGrant) -> bool {
        player_state.is_valid()
            && self
                .host
                .give_item(player_state, grant.item_id, grant.stack_size, grant.auto_stack)
    }

    pub fn player_job(&self, player_state: ObjectHandle) -> Option<String> {
        if !player_state.is_valid() {
            return None;
        }
        claim(self.host.player_job(player_state)).map(OwnedBuffer::into_string)
    }

    pub fn set_player_job(&self, player_state: ObjectHandle, job_name: &str, change: JobChange) -> bool {
        if !player_state.is_valid() {
            return false;
        }
        let text = GuestText::encode(job_name);
        self.host.set_player_job(player_state, &text, &change)
    }

    // --- estates ---

    /// `false` when the door is already in that state, among others.
    pub fn set_door_state(&self, estate_object: ObjectHandle, state: DoorState) -> bool {
        estate_object.is_valid() && self.host.set_door_state(estate_object, state)
    }

    pub fn estate_buildables(&self, estate_volume: ObjectHandle) -> Vec<ObjectHandle> {
        if !estate_volume.is_valid() {
            return Vec::new();
        }
        claim(self.host.estate_buildables(estate_volume))
            .map(OwnedBuffer::into_handles)
            .unwrap_or_default()
    }

    fn resolve_account(&self, operation: &'static str, player_state: ObjectHandle) -> Option<AccountId> {
        let account = self.player_account_id(player_state);
        if !account.is_valid() {
            debug!(operation, %player_state, "account id did not resolve, host not called");
            return None;
        }
        Some(account)
    }
}

/// Claims an owned result. A pointer that is not live is a protocol violation.
fn claim(ptr: BufferPtr) -> Option<OwnedBuffer> {
    fatal(OwnedBuffer::claim(ptr))
}
