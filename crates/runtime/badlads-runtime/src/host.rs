//! The game side of the boundary.
//!
//! [`GameHost`] is what the linker forwards every `badlads` import to, already decoded:
//! handles are [`ObjectHandle`]s, guest text is `&str`, and owned results are plain
//! Rust values the linker writes back into guest memory.

use badlads_types::{
    AccountId, BanReply, Bounds, CollisionChannel, DoorState, ObjectFlags, ObjectHandle,
    ObjectKind, Transform, Vector,
};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Flags of a `__hostSetPlayerJob` call, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobFlags {
    pub broadcast_become: bool,
    pub check_for_availability: bool,
    pub try_respawn: bool,
    pub was_demoted: bool,
    pub force_respawn: bool,
}

/// Game operations a plugin can reach.
///
/// Methods returning `Option` or a `Vec` produce owned results: `None` reaches the
/// guest as a null pointer, an empty `Vec` as a zero-length buffer.
pub trait GameHost: Send {
    fn post_player_chat_message(&mut self, player_state: ObjectHandle, message: &str, color: i32, eventful: bool);
    fn post_global_chat_message(&mut self, message: &str, color: i32, eventful: bool);

    fn object_ids(&mut self, flags: ObjectFlags) -> Vec<ObjectHandle>;
    fn badlads_version(&mut self) -> Option<String>;
    fn set_object_transform(&mut self, object: ObjectHandle, transform: Transform) -> bool;
    fn object_transform(&mut self, object: ObjectHandle) -> Option<Transform>;
    fn set_object_health(&mut self, object: ObjectHandle, health: i32) -> bool;
    fn object_class_name(&mut self, kind: ObjectKind) -> Option<String>;
    fn spawn_object(&mut self, kind: ObjectKind, index: u32, asynchronous: bool, transform: Transform) -> ObjectHandle;
    fn is_object_valid(&mut self, object: ObjectHandle) -> bool;
    fn object_bounds(&mut self, object: ObjectHandle) -> Option<Bounds>;
    fn line_trace(&mut self, ignored: ObjectHandle, channel: CollisionChannel, start: Vector, end: Vector) -> f32;

    fn player_name(&mut self, player_state: ObjectHandle) -> Option<String>;
    fn player_account_id(&mut self, player_state: ObjectHandle) -> AccountId;
    fn kick_account(&mut self, account: AccountId) -> bool;
    fn ban_account(&mut self, account: AccountId) -> BanReply;
    fn unban_account(&mut self, account: AccountId) -> bool;
    fn is_account_banned(&mut self, account: AccountId) -> bool;
    fn give_item(&mut self, player_state: ObjectHandle, item_id: i32, stack_size: i32, auto_stack: bool) -> bool;
    fn set_player_job(&mut self, player_state: ObjectHandle, job_name: &str, flags: JobFlags) -> bool;
    fn player_job(&mut self, player_state: ObjectHandle) -> Option<String>;
    fn player_character(&mut self, player_state: ObjectHandle) -> ObjectHandle;

    fn set_door_state(&mut self, estate_object: ObjectHandle, state: DoorState) -> bool;
    fn estate_buildables(&mut self, estate_volume: ObjectHandle) -> Option<Vec<ObjectHandle>>;
}

/// A game shared between the plugin instance and whoever drives it. Hot reload hands
/// the same game to the replacement instance.
pub type SharedGame = Arc<Mutex<dyn GameHost>>;

pub fn shared<G: GameHost + 'static>(game: G) -> SharedGame {
    Arc::new(Mutex::new(game))
}

/// Store data for plugin instances.
pub struct StoreData {
    game: SharedGame,
}

impl StoreData {
    pub fn new(game: SharedGame) -> Self {
        Self { game }
    }

    pub fn game(&self) -> &SharedGame {
        &self.game
    }
}

/// A game with nothing in it. Logs every call and answers with absence or rejection.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGame;

impl GameHost for NullGame {
    fn post_player_chat_message(&mut self, player_state: ObjectHandle, message: &str, color: i32, eventful: bool) {
        debug!(%player_state, message, color, eventful, "chat to player");
    }

    fn post_global_chat_message(&mut self, message: &str, color: i32, eventful: bool) {
        debug!(message, color, eventful, "global chat");
    }

    fn object_ids(&mut self, flags: ObjectFlags) -> Vec<ObjectHandle> {
        debug!(?flags, "object query");
        Vec::new()
    }

    fn badlads_version(&mut self) -> Option<String> {
        debug!("version query");
        None
    }

    fn set_object_transform(&mut self, object: ObjectHandle, transform: Transform) -> bool {
        debug!(%object, %transform, "set transform rejected");
        false
    }

    fn object_transform(&mut self, object: ObjectHandle) -> Option<Transform> {
        debug!(%object, "transform query");
        None
    }

    fn set_object_health(&mut self, object: ObjectHandle, health: i32) -> bool {
        debug!(%object, health, "set health rejected");
        false
    }

    fn object_class_name(&mut self, kind: ObjectKind) -> Option<String> {
        debug!(%kind, "class name query");
        None
    }

    fn spawn_object(&mut self, kind: ObjectKind, index: u32, asynchronous: bool, transform: Transform) -> ObjectHandle {
        debug!(%kind, index, asynchronous, %transform, "spawn rejected");
        ObjectHandle::NONE
    }

    fn is_object_valid(&mut self, object: ObjectHandle) -> bool {
        debug!(%object, "validity query");
        false
    }

    fn object_bounds(&mut self, object: ObjectHandle) -> Option<Bounds> {
        debug!(%object, "bounds query");
        None
    }

    fn line_trace(&mut self, ignored: ObjectHandle, channel: CollisionChannel, start: Vector, end: Vector) -> f32 {
        debug!(%ignored, %channel, %start, %end, "line trace");
        0.0
    }

    fn player_name(&mut self, player_state: ObjectHandle) -> Option<String> {
        debug!(%player_state, "player name query");
        None
    }

    fn player_account_id(&mut self, player_state: ObjectHandle) -> AccountId {
        debug!(%player_state, "account id query");
        AccountId::NONE
    }

    fn kick_account(&mut self, account: AccountId) -> bool {
        debug!(%account, "kick rejected");
        false
    }

    fn ban_account(&mut self, account: AccountId) -> BanReply {
        debug!(%account, "ban rejected");
        BanReply::InvalidPlayerId
    }

    fn unban_account(&mut self, account: AccountId) -> bool {
        debug!(%account, "unban rejected");
        false
    }

    fn is_account_banned(&mut self, account: AccountId) -> bool {
        debug!(%account, "ban query");
        false
    }

    fn give_item(&mut self, player_state: ObjectHandle, item_id: i32, stack_size: i32, auto_stack: bool) -> bool {
        debug!(%player_state, item_id, stack_size, auto_stack, "give item rejected");
        false
    }

    fn set_player_job(&mut self, player_state: ObjectHandle, job_name: &str, flags: JobFlags) -> bool {
        debug!(%player_state, job_name, ?flags, "set job rejected");
        false
    }

    fn player_job(&mut self, player_state: ObjectHandle) -> Option<String> {
        debug!(%player_state, "job query");
        None
    }

    fn player_character(&mut self, player_state: ObjectHandle) -> ObjectHandle {
        debug!(%player_state, "character query");
        ObjectHandle::NONE
    }

    fn set_door_state(&mut self, estate_object: ObjectHandle, state: DoorState) -> bool {
        debug!(%estate_object, %state, "set door rejected");
        false
    }

    fn estate_buildables(&mut self, estate_volume: ObjectHandle) -> Option<Vec<ObjectHandle>> {
        debug!(%estate_volume, "buildables query");
        None
    }
}
