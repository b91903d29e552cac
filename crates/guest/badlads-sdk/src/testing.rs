//! An in-process host for testing plugins without a game server.
//!
//! [`RecordingHost`] answers from a [`Fixture`] and logs every boundary call as a
//! [`HostCall`]. Owned results go through the real guest allocator, exactly as the
//! host writes them, so claims and double claims behave as they do in wasm.

use crate::alloc;
use crate::buffer::{BufferPtr, GuestText};
use crate::host::HostCalls;
use crate::options::JobChange;
use badlads_host_abi::{ARRAY_BUFFER_CLASS_ID, STRING_CLASS_ID};
use badlads_types::{
    AccountId, Bounds, CollisionChannel, DoorState, ObjectFlags, ObjectHandle, ObjectKind,
    Transform, Vector,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// One boundary call, with its decoded arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    PostPlayerChatMessage { player_state: ObjectHandle, message: String, color: i32, eventful: bool },
    PostGlobalChatMessage { message: String, color: i32, eventful: bool },
    ObjectIds(ObjectFlags),
    BadLadsVersion,
    SetObjectTransform(ObjectHandle, Transform),
    ObjectTransform(ObjectHandle),
    SetObjectHealth(ObjectHandle, i32),
    ObjectClassName(ObjectKind),
    SpawnObject { kind: ObjectKind, index: u32, asynchronous: bool, transform: Transform },
    IsObjectValid(ObjectHandle),
    ObjectBounds(ObjectHandle),
    LineTrace { ignored: ObjectHandle, channel: CollisionChannel, start: Vector, end: Vector },
    PlayerName(ObjectHandle),
    PlayerAccountId(ObjectHandle),
    KickAccount(AccountId),
    BanAccount(AccountId),
    UnbanAccount(AccountId),
    IsAccountBanned(AccountId),
    GiveItem { player_state: ObjectHandle, item_id: i32, stack_size: i32, auto_stack: bool },
    SetPlayerJob { player_state: ObjectHandle, job_name: String, change: JobChange },
    PlayerJob(ObjectHandle),
    PlayerCharacter(ObjectHandle),
    SetDoorState(ObjectHandle, DoorState),
    EstateBuildables(ObjectHandle),
}

/// A connected player as the fixture host sees it.
#[derive(Debug, Clone, Default)]
pub struct FixturePlayer {
    pub name: Option<String>,
    pub account: AccountId,
    pub job: Option<String>,
    pub character: ObjectHandle,
}

/// Canned world state behind a [`RecordingHost`].
#[derive(Debug, Clone)]
pub struct Fixture {
    pub version: Option<String>,
    /// Every object the host knows about. Queries filter these by type tag.
    pub objects: Vec<ObjectHandle>,
    pub players: HashMap<ObjectHandle, FixturePlayer>,
    pub transforms: HashMap<ObjectHandle, Transform>,
    pub bounds: HashMap<ObjectHandle, Bounds>,
    pub class_names: HashMap<ObjectKind, String>,
    pub buildables: HashMap<ObjectHandle, Vec<ObjectHandle>>,
    /// Raw value returned by every spawn.
    pub spawn_result: ObjectHandle,
    /// Raw value returned by every line trace.
    pub trace_distance: f32,
    /// Result of every mutation that reaches the host.
    pub accept_mutations: bool,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            version: None,
            objects: Vec::new(),
            players: HashMap::new(),
            transforms: HashMap::new(),
            bounds: HashMap::new(),
            class_names: HashMap::new(),
            buildables: HashMap::new(),
            spawn_result: ObjectHandle::NONE,
            trace_distance: 0.0,
            accept_mutations: true,
        }
    }
}

/// A [`HostCalls`] test double.
#[derive(Debug, Default)]
pub struct RecordingHost {
    fixture: Fixture,
    banned: RefCell<HashSet<AccountId>>,
    calls: RefCell<Vec<HostCall>>,
}

impl RecordingHost {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            banned: RefCell::default(),
            calls: RefCell::default(),
        }
    }

    /// Calls made so far, oldest first.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }

    fn player(&self, player_state: ObjectHandle) -> Option<&FixturePlayer> {
        self.fixture.players.get(&player_state)
    }

    fn known(&self, object: ObjectHandle) -> bool {
        self.fixture.objects.contains(&object)
    }
}

/// Writes an owned result the way the host does: `__new`, fill, `__pin`.
pub fn serve_bytes(bytes: &[u8], class_id: u32) -> BufferPtr {
    let ptr = alloc::allocate(bytes.len(), class_id);
    if let Err(e) = alloc::fill(ptr, bytes) {
        panic!("fixture host could not fill its own allocation: {e}");
    }
    BufferPtr::from_wire(alloc::pin(ptr))
}

pub fn serve_string(text: &str) -> BufferPtr {
    serve_bytes(text.as_bytes(), STRING_CLASS_ID)
}

pub fn serve_u64s(values: &[u64]) -> BufferPtr {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    serve_bytes(&bytes, ARRAY_BUFFER_CLASS_ID)
}

pub fn serve_f32s(values: &[f32]) -> BufferPtr {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    serve_bytes(&bytes, ARRAY_BUFFER_CLASS_ID)
}

fn serve_handles<'a>(handles: impl Iterator<Item = &'a ObjectHandle>) -> BufferPtr {
    let raw: Vec<u64> = handles.map(|h| h.to_wire()).collect();
    serve_u64s(&raw)
}

fn serve_optional_string(text: Option<&String>) -> BufferPtr {
    text.map(|t| serve_string(t)).unwrap_or(BufferPtr::NULL)
}

impl HostCalls for RecordingHost {
    fn post_player_chat_message(&self, player_state: ObjectHandle, message: &GuestText, color: i32, eventful: bool) {
        self.record(HostCall::PostPlayerChatMessage {
            player_state,
            message: message.as_str().to_owned(),
            color,
            eventful,
        });
    }

    fn post_global_chat_message(&self, message: &GuestText, color: i32, eventful: bool) {
        self.record(HostCall::PostGlobalChatMessage {
            message: message.as_str().to_owned(),
            color,
            eventful,
        });
    }

    fn object_ids(&self, flags: ObjectFlags) -> BufferPtr {
        self.record(HostCall::ObjectIds(flags));
        serve_handles(
            self.fixture
                .objects
                .iter()
                .filter(|h| flags.matches_tag(h.type_tag())),
        )
    }

    fn badlads_version(&self) -> BufferPtr {
        self.record(HostCall::BadLadsVersion);
        serve_optional_string(self.fixture.version.as_ref())
    }

    fn set_object_transform(&self, object: ObjectHandle, transform: &Transform) -> bool {
        self.record(HostCall::SetObjectTransform(object, *transform));
        self.fixture.accept_mutations && self.known(object)
    }

    fn object_transform(&self, object: ObjectHandle) -> BufferPtr {
        self.record(HostCall::ObjectTransform(object));
        match self.fixture.transforms.get(&object) {
            Some(transform) => serve_f32s(&transform.to_wire()),
            None => BufferPtr::NULL,
        }
    }

    fn set_object_health(&self, object: ObjectHandle, health: i32) -> bool {
        self.record(HostCall::SetObjectHealth(object, health));
        self.fixture.accept_mutations && self.known(object)
    }

    fn object_class_name(&self, kind: ObjectKind) -> BufferPtr {
        self.record(HostCall::ObjectClassName(kind));
        serve_optional_string(self.fixture.class_names.get(&kind))
    }

    fn spawn_object(&self, kind: ObjectKind, index: u32, asynchronous: bool, transform: &Transform) -> ObjectHandle {
        self.record(HostCall::SpawnObject {
            kind,
            index,
            asynchronous,
            transform: *transform,
        });
        self.fixture.spawn_result
    }

    fn is_object_valid(&self, object: ObjectHandle) -> bool {
        self.record(HostCall::IsObjectValid(object));
        self.known(object)
    }

    fn object_bounds(&self, object: ObjectHandle) -> BufferPtr {
        self.record(HostCall::ObjectBounds(object));
        match self.fixture.bounds.get(&object) {
            Some(bounds) => serve_f32s(&bounds.to_wire()),
            None => BufferPtr::NULL,
        }
    }

    fn line_trace(&self, ignored: ObjectHandle, channel: CollisionChannel, start: Vector, end: Vector) -> f32 {
        self.record(HostCall::LineTrace {
            ignored,
            channel,
            start,
            end,
        });
        self.fixture.trace_distance
    }

    fn player_name(&self, player_state: ObjectHandle) -> BufferPtr {
        self.record(HostCall::PlayerName(player_state));
        serve_optional_string(self.player(player_state).and_then(|p| p.name.as_ref()))
    }

    fn player_account_id(&self, player_state: ObjectHandle) -> AccountId {
        self.record(HostCall::PlayerAccountId(player_state));
        self.player(player_state)
            .map(|p| p.account)
            .unwrap_or(AccountId::NONE)
    }

    fn kick_account(&self, account: AccountId) -> bool {
        self.record(HostCall::KickAccount(account));
        self.fixture.accept_mutations
    }

    fn ban_account(&self, account: AccountId) -> i32 {
        self.record(HostCall::BanAccount(account));
        if self.banned.borrow_mut().insert(account) {
            badlads_types::BanReply::Banned.to_wire()
        } else {
            badlads_types::BanReply::AlreadyBanned.to_wire()
        }
    }

    fn unban_account(&self, account: AccountId) -> bool {
        self.record(HostCall::UnbanAccount(account));
        self.banned.borrow_mut().remove(&account)
    }

    fn is_account_banned(&self, account: AccountId) -> bool {
        self.record(HostCall::IsAccountBanned(account));
        self.banned.borrow().contains(&account)
    }

    fn give_item(&self, player_state: ObjectHandle, item_id: i32, stack_size: i32, auto_stack: bool) -> bool {
        self.record(HostCall::GiveItem {
            player_state,
            item_id,
            stack_size,
            auto_stack,
        });
        self.fixture.accept_mutations && self.player(player_state).is_some()
    }

    fn set_player_job(&self, player_state: ObjectHandle, job_name: &GuestText, change: &JobChange) -> bool {
        self.record(HostCall::SetPlayerJob {
            player_state,
            job_name: job_name.as_str().to_owned(),
            change: *change,
        });
        self.fixture.accept_mutations && self.player(player_state).is_some()
    }

    fn player_job(&self, player_state: ObjectHandle) -> BufferPtr {
        self.record(HostCall::PlayerJob(player_state));
        serve_optional_string(self.player(player_state).and_then(|p| p.job.as_ref()))
    }

    fn player_character(&self, player_state: ObjectHandle) -> ObjectHandle {
        self.record(HostCall::PlayerCharacter(player_state));
        self.player(player_state)
            .map(|p| p.character)
            .unwrap_or(ObjectHandle::NONE)
    }

    fn set_door_state(&self, estate_object: ObjectHandle, state: DoorState) -> bool {
        self.record(HostCall::SetDoorState(estate_object, state));
        self.fixture.accept_mutations && self.known(estate_object)
    }

    fn estate_buildables(&self, estate_volume: ObjectHandle) -> BufferPtr {
        self.record(HostCall::EstateBuildables(estate_volume));
        match self.fixture.buildables.get(&estate_volume) {
            Some(handles) => serve_handles(handles.iter()),
            None => BufferPtr::NULL,
        }
    }
}
