//! The host call surface as a trait.
//!
//! [`HostCalls`] mirrors the raw imports one to one, with typed parameters but no
//! policy: no short-circuits, no decoding, no retries. Owned results come back as a
//! [`BufferPtr`] for [`crate::Server`] to claim. Inside a plugin the implementation
//! is [`WasmHost`]; tests use [`crate::testing::RecordingHost`].

use crate::buffer::{BufferPtr, GuestText};
use crate::options::JobChange;
use badlads_types::{
    AccountId, CollisionChannel, DoorState, ObjectFlags, ObjectHandle, ObjectKind, Transform,
    Vector,
};

pub trait HostCalls {
    // chat
    fn post_player_chat_message(&self, player_state: ObjectHandle, message: &GuestText, color: i32, eventful: bool);
    fn post_global_chat_message(&self, message: &GuestText, color: i32, eventful: bool);

    // objects
    fn object_ids(&self, flags: ObjectFlags) -> BufferPtr;
    fn badlads_version(&self) -> BufferPtr;
    fn set_object_transform(&self, object: ObjectHandle, transform: &Transform) -> bool;
    fn object_transform(&self, object: ObjectHandle) -> BufferPtr;
    fn set_object_health(&self, object: ObjectHandle, health: i32) -> bool;
    fn object_class_name(&self, kind: ObjectKind) -> BufferPtr;
    fn spawn_object(&self, kind: ObjectKind, index: u32, asynchronous: bool, transform: &Transform) -> ObjectHandle;
    fn is_object_valid(&self, object: ObjectHandle) -> bool;
    fn object_bounds(&self, object: ObjectHandle) -> BufferPtr;
    fn line_trace(&self, ignored: ObjectHandle, channel: CollisionChannel, start: Vector, end: Vector) -> f32;

    // players
    fn player_name(&self, player_state: ObjectHandle) -> BufferPtr;
    fn player_account_id(&self, player_state: ObjectHandle) -> AccountId;
    fn kick_account(&self, account: AccountId) -> bool;
    /// Raw ban reply code.
    fn ban_account(&self, account: AccountId) -> i32;
    fn unban_account(&self, account: AccountId) -> bool;
    fn is_account_banned(&self, account: AccountId) -> bool;
    fn give_item(&self, player_state: ObjectHandle, item_id: i32, stack_size: i32, auto_stack: bool) -> bool;
    fn set_player_job(&self, player_state: ObjectHandle, job_name: &GuestText, change: &JobChange) -> bool;
    fn player_job(&self, player_state: ObjectHandle) -> BufferPtr;
    fn player_character(&self, player_state: ObjectHandle) -> ObjectHandle;

    // estates
    fn set_door_state(&self, estate_object: ObjectHandle, state: DoorState) -> bool;
    fn estate_buildables(&self, estate_volume: ObjectHandle) -> BufferPtr;
}

/// The real host, reached through the `badlads` wasm imports.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmHost;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use super::*;
    use badlads_host_abi::bindings as ffi;

    #[inline]
    fn flag(value: bool) -> i32 {
        i32::from(value)
    }

    // SAFETY (all calls below): the imports take plain values plus guest pointers that
    // stay valid for the duration of the call, and return plain values.
    impl HostCalls for WasmHost {
        fn post_player_chat_message(&self, player_state: ObjectHandle, message: &GuestText, color: i32, eventful: bool) {
            unsafe {
                ffi::host_post_player_chat_message(
                    player_state.to_wire(),
                    message.ptr(),
                    message.wire_len(),
                    color,
                    flag(eventful),
                )
            }
        }

        fn post_global_chat_message(&self, message: &GuestText, color: i32, eventful: bool) {
            unsafe {
                ffi::host_global_post_chat_message(message.ptr(), message.wire_len(), color, flag(eventful))
            }
        }

        fn object_ids(&self, flags: ObjectFlags) -> BufferPtr {
            BufferPtr::from_wire(unsafe { ffi::host_get_object_ids_owned_u64s(flags.to_wire()) })
        }

        fn badlads_version(&self) -> BufferPtr {
            BufferPtr::from_wire(unsafe { ffi::host_get_badlads_version_owned_string() })
        }

        fn set_object_transform(&self, object: ObjectHandle, transform: &Transform) -> bool {
            let [x, y, z, pitch, yaw, roll, sx, sy, sz] = transform.to_wire();
            unsafe {
                ffi::host_set_object_transform(object.to_wire(), x, y, z, pitch, yaw, roll, sx, sy, sz) != 0
            }
        }

        fn object_transform(&self, object: ObjectHandle) -> BufferPtr {
            BufferPtr::from_wire(unsafe { ffi::host_get_object_transform_owned_f32s(object.to_wire()) })
        }

        fn set_object_health(&self, object: ObjectHandle, health: i32) -> bool {
            unsafe { ffi::host_set_object_health(object.to_wire(), health) != 0 }
        }

        fn object_class_name(&self, kind: ObjectKind) -> BufferPtr {
            BufferPtr::from_wire(unsafe { ffi::host_get_object_class_name_owned_string(kind.to_wire()) })
        }

        fn spawn_object(&self, kind: ObjectKind, index: u32, asynchronous: bool, transform: &Transform) -> ObjectHandle {
            let [x, y, z, pitch, yaw, roll, sx, sy, sz] = transform.to_wire();
            ObjectHandle::from_wire(unsafe {
                ffi::host_spawn_object(
                    kind.to_wire(),
                    index,
                    flag(asynchronous),
                    x,
                    y,
                    z,
                    pitch,
                    yaw,
                    roll,
                    sx,
                    sy,
                    sz,
                )
            })
        }

        fn is_object_valid(&self, object: ObjectHandle) -> bool {
            unsafe { ffi::host_is_object_valid(object.to_wire()) != 0 }
        }

        fn object_bounds(&self, object: ObjectHandle) -> BufferPtr {
            BufferPtr::from_wire(unsafe { ffi::host_get_object_bounds_owned_f32s(object.to_wire()) })
        }

        fn line_trace(&self, ignored: ObjectHandle, channel: CollisionChannel, start: Vector, end: Vector) -> f32 {
            unsafe {
                ffi::host_line_trace_single_by_channel(
                    ignored.to_wire(),
                    channel.to_wire(),
                    start.x,
                    start.y,
                    start.z,
                    end.x,
                    end.y,
                    end.z,
                )
            }
        }

        fn player_name(&self, player_state: ObjectHandle) -> BufferPtr {
            BufferPtr::from_wire(unsafe { ffi::host_get_player_name_owned_string(player_state.to_wire()) })
        }

        fn player_account_id(&self, player_state: ObjectHandle) -> AccountId {
            AccountId::from_wire(unsafe { ffi::host_get_player_account_id(player_state.to_wire()) })
        }

        fn kick_account(&self, account: AccountId) -> bool {
            unsafe { ffi::host_kick_player_account_id(account.to_wire()) != 0 }
        }

        fn ban_account(&self, account: AccountId) -> i32 {
            unsafe { ffi::host_ban_player_account_id(account.to_wire()) }
        }

        fn unban_account(&self, account: AccountId) -> bool {
            unsafe { ffi::host_unban_player_account_id(account.to_wire()) != 0 }
        }

        fn is_account_banned(&self, account: AccountId) -> bool {
            unsafe { ffi::host_is_player_account_id_banned(account.to_wire()) != 0 }
        }

        fn give_item(&self, player_state: ObjectHandle, item_id: i32, stack_size: i32, auto_stack: bool) -> bool {
            unsafe {
                ffi::host_give_player_state_item(player_state.to_wire(), item_id, stack_size, flag(auto_stack)) != 0
            }
        }

        fn set_player_job(&self, player_state: ObjectHandle, job_name: &GuestText, change: &JobChange) -> bool {
            unsafe {
                ffi::host_set_player_job(
                    player_state.to_wire(),
                    job_name.ptr(),
                    job_name.wire_len() as u32,
                    flag(change.broadcast_become),
                    flag(change.check_for_availability),
                    flag(change.try_respawn),
                    flag(change.was_demoted),
                    flag(change.force_respawn),
                ) != 0
            }
        }

        fn player_job(&self, player_state: ObjectHandle) -> BufferPtr {
            BufferPtr::from_wire(unsafe { ffi::host_get_player_job_owned_string(player_state.to_wire()) })
        }

        fn player_character(&self, player_state: ObjectHandle) -> ObjectHandle {
            ObjectHandle::from_wire(unsafe { ffi::host_get_player_state_character(player_state.to_wire()) })
        }

        fn set_door_state(&self, estate_object: ObjectHandle, state: DoorState) -> bool {
            unsafe { ffi::host_set_door_state(estate_object.to_wire(), state.to_wire()) != 0 }
        }

        fn estate_buildables(&self, estate_volume: ObjectHandle) -> BufferPtr {
            BufferPtr::from_wire(unsafe { ffi::host_get_estate_buildable_objects_u64s(estate_volume.to_wire()) })
        }
    }
}
