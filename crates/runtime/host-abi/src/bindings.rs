//! Raw host imports.
//!
//! Conventions shared by every declaration:
//!
//! - object handles and account ids travel as `u64`
//! - booleans travel as `i32` (`0` = false, anything else = true)
//! - guest→host text is `(ptr, byte_len)`, valid only for the duration of the call
//! - `*Owned*` imports return a pointer to a buffer the host allocated through the
//!   guest's `__new` export; the guest owns it from then on. `0` means "no data".
//!
//! The same imports are listed in [`crate::manifest::HOST_IMPORTS`], which hosts
//! check modules against. A test in `manifest` compares the two.

#[cfg(target_arch = "wasm32")]
#[link(wasm_import_module = "badlads")]
extern "C" {
    // --- Chat ---

    #[link_name = "__hostPostPlayerChatMessage"]
    pub fn host_post_player_chat_message(
        player_state: u64,
        message_ptr: *const u8,
        message_len: i32,
        color: i32,
        is_eventful: i32,
    );

    #[link_name = "__hostGlobalPostChatMessage"]
    pub fn host_global_post_chat_message(
        message_ptr: *const u8,
        message_len: i32,
        color: i32,
        is_eventful: i32,
    );

    // --- Objects ---

    /// Owned `u64` array of handles matching `object_type_flags`.
    #[link_name = "__hostGetObjectIdsOwnedUInt64s"]
    pub fn host_get_object_ids_owned_u64s(object_type_flags: u32) -> usize;

    /// Owned UTF-8 string.
    #[link_name = "__hostGetBadLadsVersionOwnedString"]
    pub fn host_get_badlads_version_owned_string() -> usize;

    #[link_name = "__hostSetObjectTransform"]
    pub fn host_set_object_transform(
        object: u64,
        x: f32,
        y: f32,
        z: f32,
        pitch: f32,
        yaw: f32,
        roll: f32,
        scale_x: f32,
        scale_y: f32,
        scale_z: f32,
    ) -> i32;

    /// Owned `f32` array of 9 transform floats. The import name is spelled as the host exports it.
    #[link_name = "__hostGetObjectTranformOwnedF32s"]
    pub fn host_get_object_transform_owned_f32s(object: u64) -> usize;

    #[link_name = "__hostSetObjectHealth"]
    pub fn host_set_object_health(object: u64, new_health: i32) -> i32;

    /// Owned UTF-8 string. `object_type_flag` must be a single category bit.
    #[link_name = "__hostGetObjectClassNameOwnedString"]
    pub fn host_get_object_class_name_owned_string(object_type_flag: u32) -> usize;

    /// Returns the new handle, or a meaningless value when `async_spawn` is set.
    #[link_name = "__hostSpawnObject"]
    pub fn host_spawn_object(
        object_type_flag: u32,
        object_index: u32,
        async_spawn: i32,
        x: f32,
        y: f32,
        z: f32,
        pitch: f32,
        yaw: f32,
        roll: f32,
        scale_x: f32,
        scale_y: f32,
        scale_z: f32,
    ) -> u64;

    #[link_name = "__hostIsObjectValid"]
    pub fn host_is_object_valid(object: u64) -> i32;

    /// Owned `f32` array of 6 bounds floats.
    #[link_name = "__hostGetObjectBoundsOwnedF32s"]
    pub fn host_get_object_bounds_owned_f32s(object: u64) -> usize;

    /// Distance to the first hit. The no-hit value is host-defined.
    #[link_name = "__hostLineTraceSingleByChannel"]
    pub fn host_line_trace_single_by_channel(
        ignored: u64,
        channel: u32,
        start_x: f32,
        start_y: f32,
        start_z: f32,
        end_x: f32,
        end_y: f32,
        end_z: f32,
    ) -> f32;

    // --- Players ---

    /// Owned UTF-8 string.
    #[link_name = "__hostGetPlayerNameOwnedString"]
    pub fn host_get_player_name_owned_string(player_state: u64) -> usize;

    /// 0 when the player state is not found.
    #[link_name = "__hostGetPlayerAccountId"]
    pub fn host_get_player_account_id(player_state: u64) -> u64;

    #[link_name = "__hostKickPlayerAccountId"]
    pub fn host_kick_player_account_id(account_id: u64) -> i32;

    /// `BanReply` code.
    #[link_name = "__hostBanPlayerAccountId"]
    pub fn host_ban_player_account_id(account_id: u64) -> i32;

    #[link_name = "__hostUnbanPlayerAccountId"]
    pub fn host_unban_player_account_id(account_id: u64) -> i32;

    #[link_name = "__hostIsPlayerAccountIdBanned"]
    pub fn host_is_player_account_id_banned(account_id: u64) -> i32;

    #[link_name = "__hostGivePlayerStateItem"]
    pub fn host_give_player_state_item(
        player_state: u64,
        item_id: i32,
        stack_size: i32,
        auto_stack: i32,
    ) -> i32;

    #[link_name = "__hostSetPlayerJob"]
    pub fn host_set_player_job(
        player_state: u64,
        job_name_ptr: *const u8,
        job_name_len: u32,
        broadcast_become: i32,
        check_for_availability: i32,
        try_respawn: i32,
        was_demoted: i32,
        force_respawn: i32,
    ) -> i32;

    /// Owned UTF-8 string.
    #[link_name = "__hostGetPlayerJobOwnedString"]
    pub fn host_get_player_job_owned_string(player_state: u64) -> usize;

    /// Player character controlled by a player state, 0 when there is none.
    #[link_name = "__hostGetPlayerStateCharacter"]
    pub fn host_get_player_state_character(player_state: u64) -> u64;

    // --- Estates ---

    /// `state_and_side`: 0 closed, 1 open forwards, -1 open backwards.
    #[link_name = "__hostSetDoorState"]
    pub fn host_set_door_state(estate_object: u64, state_and_side: i32) -> i32;

    /// Owned `u64` array of buildable handles.
    #[link_name = "__hostGetEstateBuildableObjectsUInt64s"]
    pub fn host_get_estate_buildable_objects_u64s(estate_volume: u64) -> usize;
}
