//! Binds every `badlads` import to the [`GameHost`] held in the store.
//!
//! Decoding rules on the host side of the boundary:
//!
//! - guest text is `(ptr, len)`; a trailing NUL is dropped and invalid UTF-8 traps
//! - owned results are written through the guest's `__new`/`__pin`; `None` is a null
//!   pointer
//! - an unknown collision channel or door state traps; a flag argument that is not a
//!   single category is answered with absence

use crate::guest::{caller_memory, read_text, GuestMemory};
use crate::host::{GameHost, JobFlags, StoreData};
use anyhow::{anyhow, Result};
use badlads_host_abi::{ARRAY_BUFFER_CLASS_ID, IMPORT_MODULE, STRING_CLASS_ID};
use badlads_types::{
    AccountId, CollisionChannel, DoorState, ObjectFlags, ObjectHandle, ObjectKind, Rotation, Transform,
    Vector,
};
use tracing::warn;
use wasmtime::{Caller, Linker};

fn with_game<R>(caller: &Caller<'_, StoreData>, call: impl FnOnce(&mut dyn GameHost) -> R) -> Result<R> {
    let mut game = caller
        .data()
        .game()
        .lock()
        .map_err(|_| anyhow!("game host lock poisoned"))?;
    Ok(call(&mut *game))
}

fn handle(raw: u64) -> ObjectHandle {
    ObjectHandle::from_wire(raw)
}

fn account_id(raw: u64) -> AccountId {
    AccountId::from_wire(raw)
}

fn flag(raw: i32) -> bool {
    raw != 0
}

fn object_kind(raw: u32) -> Option<ObjectKind> {
    let bits = u8::try_from(raw).ok()?;
    ObjectKind::try_from(ObjectFlags::from_bits(bits)).ok()
}

#[allow(clippy::too_many_arguments)]
fn transform(x: f32, y: f32, z: f32, pitch: f32, yaw: f32, roll: f32, sx: f32, sy: f32, sz: f32) -> Transform {
    Transform::new(
        Vector::new(x, y, z),
        Rotation::new(pitch, yaw, roll),
        Vector::new(sx, sy, sz),
    )
}

fn owned_string(caller: &mut Caller<'_, StoreData>, text: Option<String>) -> Result<i32> {
    match text {
        Some(text) => GuestMemory::from_caller(caller)?.write_owned(&mut *caller, text.as_bytes(), STRING_CLASS_ID),
        None => Ok(0),
    }
}

fn owned_handles(caller: &mut Caller<'_, StoreData>, handles: Option<Vec<ObjectHandle>>) -> Result<i32> {
    match handles {
        Some(handles) => {
            let bytes: Vec<u8> = handles.iter().flat_map(|h| h.to_wire().to_le_bytes()).collect();
            GuestMemory::from_caller(caller)?.write_owned(&mut *caller, &bytes, ARRAY_BUFFER_CLASS_ID)
        }
        None => Ok(0),
    }
}

fn owned_f32s(caller: &mut Caller<'_, StoreData>, floats: Option<&[f32]>) -> Result<i32> {
    match floats {
        Some(floats) => {
            let bytes: Vec<u8> = floats.iter().flat_map(|f| f.to_le_bytes()).collect();
            GuestMemory::from_caller(caller)?.write_owned(&mut *caller, &bytes, ARRAY_BUFFER_CLASS_ID)
        }
        None => Ok(0),
    }
}

fn guest_text(caller: &mut Caller<'_, StoreData>, ptr: i32, len: i32) -> Result<String> {
    let memory = caller_memory(caller)?;
    read_text(&memory, &*caller, ptr, len)
}

/// Registers all host imports under [`IMPORT_MODULE`].
pub fn register_host_functions(linker: &mut Linker<StoreData>) -> Result<()> {
    // --- Chat ---

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostPostPlayerChatMessage",
        |mut caller: Caller<'_, StoreData>, player_state: u64, ptr: i32, len: i32, color: i32, eventful: i32| -> Result<()> {
            let message = guest_text(&mut caller, ptr, len)?;
            with_game(&caller, |game| {
                game.post_player_chat_message(handle(player_state), &message, color, flag(eventful))
            })
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGlobalPostChatMessage",
        |mut caller: Caller<'_, StoreData>, ptr: i32, len: i32, color: i32, eventful: i32| -> Result<()> {
            let message = guest_text(&mut caller, ptr, len)?;
            with_game(&caller, |game| game.post_global_chat_message(&message, color, flag(eventful)))
        },
    )?;

    // --- Objects ---

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGetObjectIdsOwnedUInt64s",
        |mut caller: Caller<'_, StoreData>, flags: u32| -> Result<i32> {
            // Only the low byte carries category bits.
            let flags = ObjectFlags::from_bits(flags as u8);
            let ids = with_game(&caller, |game| game.object_ids(flags))?;
            owned_handles(&mut caller, Some(ids))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGetBadLadsVersionOwnedString",
        |mut caller: Caller<'_, StoreData>| -> Result<i32> {
            let version = with_game(&caller, |game| game.badlads_version())?;
            owned_string(&mut caller, version)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostSetObjectTransform",
        |caller: Caller<'_, StoreData>,
         object: u64,
         x: f32,
         y: f32,
         z: f32,
         pitch: f32,
         yaw: f32,
         roll: f32,
         sx: f32,
         sy: f32,
         sz: f32|
         -> Result<i32> {
            let transform = transform(x, y, z, pitch, yaw, roll, sx, sy, sz);
            let applied = with_game(&caller, |game| game.set_object_transform(handle(object), transform))?;
            Ok(i32::from(applied))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGetObjectTranformOwnedF32s",
        |mut caller: Caller<'_, StoreData>, object: u64| -> Result<i32> {
            let transform = with_game(&caller, |game| game.object_transform(handle(object)))?;
            owned_f32s(&mut caller, transform.map(Transform::to_wire).as_ref().map(|f| &f[..]))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostSetObjectHealth",
        |caller: Caller<'_, StoreData>, object: u64, health: i32| -> Result<i32> {
            let applied = with_game(&caller, |game| game.set_object_health(handle(object), health))?;
            Ok(i32::from(applied))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGetObjectClassNameOwnedString",
        |mut caller: Caller<'_, StoreData>, flag: u32| -> Result<i32> {
            let Some(kind) = object_kind(flag) else {
                warn!(flag, "class name requested for a flag that is not a single category");
                return Ok(0);
            };
            let name = with_game(&caller, |game| game.object_class_name(kind))?;
            owned_string(&mut caller, name)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostSpawnObject",
        |caller: Caller<'_, StoreData>,
         flag: u32,
         index: u32,
         asynchronous: i32,
         x: f32,
         y: f32,
         z: f32,
         pitch: f32,
         yaw: f32,
         roll: f32,
         sx: f32,
         sy: f32,
         sz: f32|
         -> Result<u64> {
            let Some(kind) = object_kind(flag) else {
                warn!(flag, "spawn requested for a flag that is not a single category");
                return Ok(0);
            };
            let transform = transform(x, y, z, pitch, yaw, roll, sx, sy, sz);
            let spawned = with_game(&caller, |game| {
                game.spawn_object(kind, index, asynchronous != 0, transform)
            })?;
            Ok(spawned.to_wire())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostIsObjectValid",
        |caller: Caller<'_, StoreData>, object: u64| -> Result<i32> {
            let valid = with_game(&caller, |game| game.is_object_valid(handle(object)))?;
            Ok(i32::from(valid))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGetObjectBoundsOwnedF32s",
        |mut caller: Caller<'_, StoreData>, object: u64| -> Result<i32> {
            let bounds = with_game(&caller, |game| game.object_bounds(handle(object)))?;
            let floats = bounds.map(|b| b.to_wire());
            owned_f32s(&mut caller, floats.as_ref().map(|f| &f[..]))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostLineTraceSingleByChannel",
        |caller: Caller<'_, StoreData>,
         ignored: u64,
         channel: u32,
         start_x: f32,
         start_y: f32,
         start_z: f32,
         end_x: f32,
         end_y: f32,
         end_z: f32|
         -> Result<f32> {
            let channel = CollisionChannel::try_from(channel)?;
            let start = Vector::new(start_x, start_y, start_z);
            let end = Vector::new(end_x, end_y, end_z);
            with_game(&caller, |game| game.line_trace(handle(ignored), channel, start, end))
        },
    )?;

    // --- Players ---

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGetPlayerNameOwnedString",
        |mut caller: Caller<'_, StoreData>, player_state: u64| -> Result<i32> {
            let name = with_game(&caller, |game| game.player_name(handle(player_state)))?;
            owned_string(&mut caller, name)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGetPlayerAccountId",
        |caller: Caller<'_, StoreData>, player_state: u64| -> Result<u64> {
            let account = with_game(&caller, |game| game.player_account_id(handle(player_state)))?;
            Ok(account.to_wire())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostKickPlayerAccountId",
        |caller: Caller<'_, StoreData>, account: u64| -> Result<i32> {
            let kicked = with_game(&caller, |game| game.kick_account(account_id(account)))?;
            Ok(i32::from(kicked))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostBanPlayerAccountId",
        |caller: Caller<'_, StoreData>, account: u64| -> Result<i32> {
            let reply = with_game(&caller, |game| game.ban_account(account_id(account)))?;
            Ok(reply.to_wire())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostUnbanPlayerAccountId",
        |caller: Caller<'_, StoreData>, account: u64| -> Result<i32> {
            let unbanned = with_game(&caller, |game| game.unban_account(account_id(account)))?;
            Ok(i32::from(unbanned))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostIsPlayerAccountIdBanned",
        |caller: Caller<'_, StoreData>, account: u64| -> Result<i32> {
            let banned = with_game(&caller, |game| game.is_account_banned(account_id(account)))?;
            Ok(i32::from(banned))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGivePlayerStateItem",
        |caller: Caller<'_, StoreData>, player_state: u64, item_id: i32, stack_size: i32, auto_stack: i32| -> Result<i32> {
            let given = with_game(&caller, |game| {
                game.give_item(handle(player_state), item_id, stack_size, flag(auto_stack))
            })?;
            Ok(i32::from(given))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostSetPlayerJob",
        |mut caller: Caller<'_, StoreData>,
         player_state: u64,
         ptr: i32,
         len: i32,
         broadcast_become: i32,
         check_for_availability: i32,
         try_respawn: i32,
         was_demoted: i32,
         force_respawn: i32|
         -> Result<i32> {
            let job_name = guest_text(&mut caller, ptr, len)?;
            let flags = JobFlags {
                broadcast_become: flag(broadcast_become),
                check_for_availability: flag(check_for_availability),
                try_respawn: flag(try_respawn),
                was_demoted: flag(was_demoted),
                force_respawn: flag(force_respawn),
            };
            let changed = with_game(&caller, |game| game.set_player_job(handle(player_state), &job_name, flags))?;
            Ok(i32::from(changed))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGetPlayerJobOwnedString",
        |mut caller: Caller<'_, StoreData>, player_state: u64| -> Result<i32> {
            let job = with_game(&caller, |game| game.player_job(handle(player_state)))?;
            owned_string(&mut caller, job)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGetPlayerStateCharacter",
        |caller: Caller<'_, StoreData>, player_state: u64| -> Result<u64> {
            let character = with_game(&caller, |game| game.player_character(handle(player_state)))?;
            Ok(character.to_wire())
        },
    )?;

    // --- Estates ---

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostSetDoorState",
        |caller: Caller<'_, StoreData>, estate_object: u64, state: i32| -> Result<i32> {
            let state = DoorState::try_from(state)?;
            let applied = with_game(&caller, |game| game.set_door_state(handle(estate_object), state))?;
            Ok(i32::from(applied))
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "__hostGetEstateBuildableObjectsUInt64s",
        |mut caller: Caller<'_, StoreData>, estate_volume: u64| -> Result<i32> {
            let buildables = with_game(&caller, |game| game.estate_buildables(handle(estate_volume)))?;
            owned_handles(&mut caller, buildables)
        },
    )?;

    Ok(())
}
