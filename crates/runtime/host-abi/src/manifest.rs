//! Static manifest of the boundary: every host import, every recognized guest event
//! export, and the memory exports the host needs to hand buffers to the guest.
//!
//! The host never asks a plugin which events it handles. It scans the module's export
//! table against [`GuestEvent`] at load and on every hot reload, so the names and
//! signatures below are the whole registration mechanism.

use crate::error::ManifestError;
use serde::Serialize;
use std::collections::HashSet;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Core wasm value types that appear at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WireType {
    I32,
    I64,
    F32,
    F64,
}

use WireType::{F32, I32, I64};

/// Parameter and result types of a boundary function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Signature {
    pub params: &'static [WireType],
    pub result: Option<WireType>,
}

impl Signature {
    pub const fn new(params: &'static [WireType], result: Option<WireType>) -> Self {
        Self { params, result }
    }

    /// `true` if `params`/`results` describe exactly this signature.
    pub fn matches(&self, params: &[WireType], results: &[WireType]) -> bool {
        let expected_results: &[WireType] = match &self.result {
            Some(result) => std::slice::from_ref(result),
            None => &[],
        };
        self.params == params && expected_results == results
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(f, "({})", params.join(", "))?;
        if let Some(result) = self.result {
            write!(f, " -> {result}")?;
        }
        Ok(())
    }
}

/// A named boundary function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FnShape {
    pub name: &'static str,
    pub signature: Signature,
}

const fn shape(name: &'static str, params: &'static [WireType], result: Option<WireType>) -> FnShape {
    FnShape {
        name,
        signature: Signature::new(params, result),
    }
}

/// Every function the host provides under [`crate::IMPORT_MODULE`].
///
/// Mirrors the `extern "C"` block in [`crate::bindings`]; a test keeps the two in step.
pub const HOST_IMPORTS: &[FnShape] = &[
    shape("__hostPostPlayerChatMessage", &[I64, I32, I32, I32, I32], None),
    shape("__hostGlobalPostChatMessage", &[I32, I32, I32, I32], None),
    shape("__hostGetObjectIdsOwnedUInt64s", &[I32], Some(I32)),
    shape("__hostGetBadLadsVersionOwnedString", &[], Some(I32)),
    shape(
        "__hostSetObjectTransform",
        &[I64, F32, F32, F32, F32, F32, F32, F32, F32, F32],
        Some(I32),
    ),
    shape("__hostGetObjectTranformOwnedF32s", &[I64], Some(I32)),
    shape("__hostSetObjectHealth", &[I64, I32], Some(I32)),
    shape("__hostGetObjectClassNameOwnedString", &[I32], Some(I32)),
    shape(
        "__hostSpawnObject",
        &[I32, I32, I32, F32, F32, F32, F32, F32, F32, F32, F32, F32],
        Some(I64),
    ),
    shape("__hostGetPlayerNameOwnedString", &[I64], Some(I32)),
    shape("__hostGetPlayerAccountId", &[I64], Some(I64)),
    shape("__hostKickPlayerAccountId", &[I64], Some(I32)),
    shape("__hostBanPlayerAccountId", &[I64], Some(I32)),
    shape("__hostUnbanPlayerAccountId", &[I64], Some(I32)),
    shape("__hostIsPlayerAccountIdBanned", &[I64], Some(I32)),
    shape("__hostSetDoorState", &[I64, I32], Some(I32)),
    shape("__hostGetEstateBuildableObjectsUInt64s", &[I64], Some(I32)),
    shape("__hostGivePlayerStateItem", &[I64, I32, I32, I32], Some(I32)),
    shape("__hostGetObjectBoundsOwnedF32s", &[I64], Some(I32)),
    shape(
        "__hostSetPlayerJob",
        &[I64, I32, I32, I32, I32, I32, I32, I32],
        Some(I32),
    ),
    shape("__hostGetPlayerJobOwnedString", &[I64], Some(I32)),
    shape("__hostIsObjectValid", &[I64], Some(I32)),
    shape("__hostGetPlayerStateCharacter", &[I64], Some(I64)),
    shape(
        "__hostLineTraceSingleByChannel",
        &[I64, I32, F32, F32, F32, F32, F32, F32],
        Some(F32),
    ),
];

/// Looks up a host import by name.
pub fn host_import(name: &str) -> Option<&'static FnShape> {
    HOST_IMPORTS.iter().find(|import| import.name == name)
}

/// Event handlers a plugin may export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, Display)]
pub enum GuestEvent {
    Start,
    Stop,
    Tick,
    PlayerLogin,
    PlayerLogout,
    ChatMessage,
    LivingDeath,
    PlayerJobChange,
}

impl GuestEvent {
    pub const fn export_name(self) -> &'static str {
        match self {
            GuestEvent::Start => "onStart",
            GuestEvent::Stop => "onStop",
            GuestEvent::Tick => "onTick",
            GuestEvent::PlayerLogin => "onPlayerLogin",
            GuestEvent::PlayerLogout => "onPlayerLogout",
            GuestEvent::ChatMessage => "onChatMessage",
            GuestEvent::LivingDeath => "onLivingDeath",
            GuestEvent::PlayerJobChange => "onPlayerJobChange",
        }
    }

    pub const fn signature(self) -> Signature {
        match self {
            GuestEvent::Start | GuestEvent::Stop => Signature::new(&[], None),
            // delta seconds
            GuestEvent::Tick => Signature::new(&[F32], None),
            GuestEvent::PlayerLogin | GuestEvent::PlayerLogout => Signature::new(&[I64], None),
            // player state, owned message buffer -> deliver (0 suppresses)
            GuestEvent::ChatMessage => Signature::new(&[I64, I32], Some(I32)),
            // victim, killer
            GuestEvent::LivingDeath => Signature::new(&[I64, I64], None),
            // player state, owned job name buffer
            GuestEvent::PlayerJobChange => Signature::new(&[I64, I32], None),
        }
    }

    pub fn shape(self) -> FnShape {
        FnShape {
            name: self.export_name(),
            signature: self.signature(),
        }
    }

    /// Only the chat handler can veto host behavior.
    pub const fn can_veto(self) -> bool {
        matches!(self, GuestEvent::ChatMessage)
    }

    pub fn from_export_name(name: &str) -> Option<Self> {
        GuestEvent::iter().find(|event| event.export_name() == name)
    }
}

/// Memory management exports every plugin must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, Display)]
pub enum MemoryExport {
    /// `(size, class_id) -> ptr`
    New,
    /// `(ptr) -> ptr`, keeps an in-flight buffer alive.
    Pin,
    /// `(ptr)`, releases a buffer the host never handed over.
    Unpin,
}

impl MemoryExport {
    /// Linear memory export the host reads and writes buffers through.
    pub const MEMORY: &'static str = "memory";

    pub const fn export_name(self) -> &'static str {
        match self {
            MemoryExport::New => "__new",
            MemoryExport::Pin => "__pin",
            MemoryExport::Unpin => "__unpin",
        }
    }

    pub const fn signature(self) -> Signature {
        match self {
            MemoryExport::New => Signature::new(&[I32, I32], Some(I32)),
            MemoryExport::Pin => Signature::new(&[I32], Some(I32)),
            MemoryExport::Unpin => Signature::new(&[I32], None),
        }
    }

    pub fn from_export_name(name: &str) -> Option<Self> {
        MemoryExport::iter().find(|export| export.export_name() == name)
    }
}

/// Checks that no name is declared twice and that exports and imports don't share names.
pub fn validate() -> Result<(), ManifestError> {
    let mut imports = HashSet::new();
    for import in HOST_IMPORTS {
        if !imports.insert(import.name) {
            return Err(ManifestError::DuplicateImport(import.name));
        }
    }

    let mut exports = HashSet::new();
    let names = GuestEvent::iter()
        .map(GuestEvent::export_name)
        .chain(MemoryExport::iter().map(MemoryExport::export_name))
        .chain(std::iter::once(MemoryExport::MEMORY));
    for name in names {
        if !exports.insert(name) {
            return Err(ManifestError::DuplicateExport(name));
        }
        if imports.contains(name) {
            return Err(ManifestError::ExportShadowsImport(name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_is_consistent() {
        assert_eq!(validate(), Ok(()));
        assert_eq!(HOST_IMPORTS.len(), 24);
    }

    #[test]
    fn every_event_resolves_by_export_name() {
        for event in GuestEvent::iter() {
            assert_eq!(GuestEvent::from_export_name(event.export_name()), Some(event));
        }
        assert_eq!(GuestEvent::from_export_name("on_start"), None);
        assert_eq!(GuestEvent::from_export_name("onstart"), None);
    }

    #[test]
    fn only_chat_returns_a_value() {
        for event in GuestEvent::iter() {
            assert_eq!(event.signature().result.is_some(), event.can_veto());
        }
    }

    #[test]
    fn signature_matching_is_exact() {
        let chat = GuestEvent::ChatMessage.signature();
        assert!(chat.matches(&[I64, I32], &[I32]));
        assert!(!chat.matches(&[I64, I32], &[]));
        assert!(!chat.matches(&[I32, I32], &[I32]));

        let tick = GuestEvent::Tick.signature();
        assert!(tick.matches(&[F32], &[]));
        assert!(!tick.matches(&[WireType::F64], &[]));
    }

    #[test]
    fn signatures_render_like_wat() {
        assert_eq!(GuestEvent::ChatMessage.signature().to_string(), "(i64, i32) -> i32");
        assert_eq!(MemoryExport::Unpin.signature().to_string(), "(i32)");
    }

    #[test]
    fn manifest_serializes_for_reports() {
        let json = serde_json::to_value(GuestEvent::Tick.shape()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "onTick",
                "signature": { "params": ["f32"], "result": null }
            })
        );
    }

    /// `(name, params, result)` of every declaration in `bindings.rs`, with wasm32 sizes.
    fn declared_bindings() -> Vec<(String, Vec<WireType>, Option<WireType>)> {
        fn wire(ty: &str) -> WireType {
            match ty.trim() {
                "u64" | "i64" => I64,
                "u32" | "i32" | "usize" | "*const u8" => I32,
                "f32" => F32,
                other => panic!("unexpected binding type `{other}`"),
            }
        }

        include_str!("bindings.rs")
            .split("#[link_name = \"")
            .skip(1)
            .map(|declaration| {
                let (name, rest) = declaration.split_once('"').unwrap();
                let rest = &rest[rest.find("pub fn").unwrap()..];
                let open = rest.find('(').unwrap();
                let close = rest.find(')').unwrap();
                let params: Vec<WireType> = rest[open + 1..close]
                    .split(',')
                    .filter(|param| !param.trim().is_empty())
                    .map(|param| wire(param.split_once(':').unwrap().1))
                    .collect();
                let result = rest[close + 1..rest.find(';').unwrap()]
                    .split_once("->")
                    .map(|(_, ty)| wire(ty));
                (name.to_owned(), params, result)
            })
            .collect()
    }

    #[test]
    fn raw_bindings_match_the_import_table() {
        let declared = declared_bindings();
        assert_eq!(declared.len(), HOST_IMPORTS.len());
        for (name, params, result) in &declared {
            let shape = host_import(name).unwrap_or_else(|| panic!("`{name}` is not in HOST_IMPORTS"));
            assert_eq!(shape.signature.params, &params[..], "{name}");
            assert_eq!(shape.signature.result, *result, "{name}");
        }
    }

    #[test]
    fn imports_are_found_by_name() {
        let spawn = host_import("__hostSpawnObject").unwrap();
        assert_eq!(spawn.signature.params.len(), 12);
        assert_eq!(spawn.signature.result, Some(I64));
        assert!(host_import("__hostGetObjectTransformOwnedF32s").is_none());
    }
}
