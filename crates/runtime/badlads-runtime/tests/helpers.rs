#![allow(dead_code)]

use badlads_runtime::{GameHost, JobFlags, SharedGame};
use badlads_types::{
    AccountId, BanReply, Bounds, CollisionChannel, DoorState, ObjectFlags, ObjectHandle, ObjectKind, Transform,
    Vector,
};
use std::sync::{Arc, Mutex};

/// Bump allocator satisfying the allocator exports. `$last_size` holds the size of
/// the most recent `__new` so test plugins know how long an owned buffer is.
pub const ALLOCATOR: &str = r#"
    (memory (export "memory") 1)
    (global $next (mut i32) (i32.const 1024))
    (global $last_size (mut i32) (i32.const 0))
    (func (export "__new") (param $size i32) (param $class i32) (result i32)
        (local $ptr i32)
        (local.set $ptr (global.get $next))
        (global.set $last_size (local.get $size))
        (global.set $next
            (i32.and (i32.add (i32.add (global.get $next) (local.get $size)) (i32.const 7)) (i32.const -8)))
        (local.get $ptr))
    (func (export "__pin") (param i32) (result i32) (local.get 0))
    (func (export "__unpin") (param i32))
"#;

pub const VEHICLE_A: ObjectHandle = ObjectHandle::from_wire(0x0800_0000_0000_0001);
pub const VEHICLE_B: ObjectHandle = ObjectHandle::from_wire(0x0800_0000_0000_0002);
pub const PLAYER: ObjectHandle = ObjectHandle::from_wire(0x0200_0000_0000_0003);

/// Builds a plugin module from its imports and body.
pub fn plugin(imports: &str, body: &str) -> String {
    format!("(module {imports} {ALLOCATOR} {body})")
}

/// A plugin that announces `onStart`, `onTick` and `onStop` in global chat as
/// `<name>:start`, `<name>:tick` and `<name>:stop`.
pub fn lifecycle_plugin(name: &str) -> String {
    let start = format!("{name}:start");
    let tick = format!("{name}:tick");
    let stop = format!("{name}:stop");
    plugin(
        r#"(import "badlads" "__hostGlobalPostChatMessage" (func $say (param i32 i32 i32 i32)))"#,
        &format!(
            r#"
            (data (i32.const 16) "{start}")
            (data (i32.const 128) "{tick}")
            (data (i32.const 256) "{stop}")
            (func (export "onStart") (call $say (i32.const 16) (i32.const {}) (i32.const 0) (i32.const 0)))
            (func (export "onTick") (param f32) (call $say (i32.const 128) (i32.const {}) (i32.const 0) (i32.const 0)))
            (func (export "onStop") (call $say (i32.const 256) (i32.const {}) (i32.const 0) (i32.const 0)))
            "#,
            start.len(),
            tick.len(),
            stop.len(),
        ),
    )
}

/// In-memory game that records what plugins do to it.
#[derive(Debug, Default)]
pub struct TestGame {
    pub version: Option<String>,
    pub objects: Vec<ObjectHandle>,
    pub queried_flags: Vec<ObjectFlags>,
    pub global_chat: Vec<String>,
    pub player_chat: Vec<(ObjectHandle, String, i32)>,
    pub health: Vec<(ObjectHandle, i32)>,
    pub jobs: Vec<(ObjectHandle, String, JobFlags)>,
    pub traces: Vec<CollisionChannel>,
    pub doors: Vec<(ObjectHandle, DoorState)>,
}

impl TestGame {
    pub fn with_objects(objects: &[ObjectHandle]) -> Self {
        Self {
            objects: objects.to_vec(),
            ..Self::default()
        }
    }
}

/// Returns the game twice: typed for assertions, and as the host sees it.
pub fn share(game: TestGame) -> (Arc<Mutex<TestGame>>, SharedGame) {
    let game = Arc::new(Mutex::new(game));
    let shared: SharedGame = game.clone();
    (game, shared)
}

impl GameHost for TestGame {
    fn post_player_chat_message(&mut self, player_state: ObjectHandle, message: &str, color: i32, _eventful: bool) {
        self.player_chat.push((player_state, message.to_owned(), color));
    }

    fn post_global_chat_message(&mut self, message: &str, _color: i32, _eventful: bool) {
        self.global_chat.push(message.to_owned());
    }

    fn object_ids(&mut self, flags: ObjectFlags) -> Vec<ObjectHandle> {
        self.queried_flags.push(flags);
        self.objects
            .iter()
            .copied()
            .filter(|object| flags.matches_tag(object.type_tag()))
            .collect()
    }

    fn badlads_version(&mut self) -> Option<String> {
        self.version.clone()
    }

    fn set_object_transform(&mut self, _object: ObjectHandle, _transform: Transform) -> bool {
        false
    }

    fn object_transform(&mut self, _object: ObjectHandle) -> Option<Transform> {
        None
    }

    fn set_object_health(&mut self, object: ObjectHandle, health: i32) -> bool {
        self.health.push((object, health));
        true
    }

    fn object_class_name(&mut self, _kind: ObjectKind) -> Option<String> {
        None
    }

    fn spawn_object(&mut self, _kind: ObjectKind, _index: u32, _asynchronous: bool, _transform: Transform) -> ObjectHandle {
        ObjectHandle::NONE
    }

    fn is_object_valid(&mut self, object: ObjectHandle) -> bool {
        self.objects.contains(&object)
    }

    fn object_bounds(&mut self, _object: ObjectHandle) -> Option<Bounds> {
        None
    }

    fn line_trace(&mut self, _ignored: ObjectHandle, channel: CollisionChannel, _start: Vector, _end: Vector) -> f32 {
        self.traces.push(channel);
        42.5
    }

    fn player_name(&mut self, _player_state: ObjectHandle) -> Option<String> {
        None
    }

    fn player_account_id(&mut self, _player_state: ObjectHandle) -> AccountId {
        AccountId::NONE
    }

    fn kick_account(&mut self, _account: AccountId) -> bool {
        false
    }

    fn ban_account(&mut self, _account: AccountId) -> BanReply {
        BanReply::InvalidPlayerId
    }

    fn unban_account(&mut self, _account: AccountId) -> bool {
        false
    }

    fn is_account_banned(&mut self, _account: AccountId) -> bool {
        false
    }

    fn give_item(&mut self, _player_state: ObjectHandle, _item_id: i32, _stack_size: i32, _auto_stack: bool) -> bool {
        false
    }

    fn set_player_job(&mut self, player_state: ObjectHandle, job_name: &str, flags: JobFlags) -> bool {
        self.jobs.push((player_state, job_name.to_owned(), flags));
        true
    }

    fn player_job(&mut self, _player_state: ObjectHandle) -> Option<String> {
        None
    }

    fn player_character(&mut self, _player_state: ObjectHandle) -> ObjectHandle {
        ObjectHandle::NONE
    }

    fn set_door_state(&mut self, estate_object: ObjectHandle, state: DoorState) -> bool {
        self.doors.push((estate_object, state));
        true
    }

    fn estate_buildables(&mut self, _estate_volume: ObjectHandle) -> Option<Vec<ObjectHandle>> {
        None
    }
}
