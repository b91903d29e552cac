//! Static signature scan of a plugin module.
//!
//! Plugins never register handlers. At load and at every hot reload the host walks
//! the module's export table and wires each export whose name and signature match a
//! [`GuestEvent`]. Unrecognized exports are ignored; a recognized name with the wrong
//! signature rejects the whole module.

use crate::error::ScanError;
use crate::metrics;
use badlads_host_abi::{
    manifest::host_import, GuestEvent, MemoryExport, Signature, WireType,
    BADLADS_HOST_ABI_VERSION, IMPORT_MODULE,
};
use serde::Serialize;
use std::collections::HashSet;
use strum::IntoEnumIterator;
use tracing::{debug, warn};
use wasmtime::{ExternType, FuncType, Module, ValType};

/// Events a module handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerTable {
    events: HashSet<GuestEvent>,
}

impl HandlerTable {
    pub fn contains(&self, event: GuestEvent) -> bool {
        self.events.contains(&event)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Handled events, in manifest order.
    pub fn events(&self) -> impl Iterator<Item = GuestEvent> + '_ {
        GuestEvent::iter().filter(move |event| self.events.contains(event))
    }
}

/// What the scan found, for `badlads-host inspect` and logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub abi_version: u32,
    /// Event exports that will be called.
    pub handlers: Vec<&'static str>,
    /// Events the module does not handle.
    pub unhandled: Vec<&'static str>,
    /// Exports that are neither events nor allocator exports.
    pub ignored_exports: Vec<String>,
    /// Host imports the module uses.
    pub imports: Vec<String>,
    /// Imports this host does not provide. Always empty in strict mode.
    pub unknown_imports: Vec<String>,
}

/// Scans `module` against the manifest.
///
/// With `strict_imports`, any import that is not a host function under
/// [`IMPORT_MODULE`] rejects the module.
pub fn scan_module(module: &Module, strict_imports: bool) -> Result<(HandlerTable, ScanReport), ScanError> {
    metrics::record_module_scanned();
    let scanned = scan(module, strict_imports);
    if let Err(e) = &scanned {
        metrics::record_scan_rejection();
        warn!(error = %e, "plugin module rejected");
    }
    scanned
}

fn scan(module: &Module, strict_imports: bool) -> Result<(HandlerTable, ScanReport), ScanError> {
    let mut table = HandlerTable::default();
    let mut report = ScanReport {
        abi_version: BADLADS_HOST_ABI_VERSION,
        ..ScanReport::default()
    };
    let mut has_memory = false;
    let mut allocator = HashSet::new();

    for export in module.exports() {
        let name = export.name();
        match export.ty() {
            ExternType::Func(ty) => {
                if let Some(event) = GuestEvent::from_export_name(name) {
                    check_signature(name, event.signature(), &ty)?;
                    debug!(export = name, "event handler found");
                    table.events.insert(event);
                } else if let Some(memory_export) = MemoryExport::from_export_name(name) {
                    check_signature(name, memory_export.signature(), &ty)?;
                    allocator.insert(memory_export);
                } else {
                    report.ignored_exports.push(name.to_owned());
                }
            }
            ExternType::Memory(_) if name == MemoryExport::MEMORY => has_memory = true,
            other => {
                // Event and allocator names are reserved for functions.
                if let Some(expected) = recognized_signature(name) {
                    return Err(ScanError::SignatureMismatch {
                        name: name.to_owned(),
                        expected: expected.to_string(),
                        found: extern_kind(&other).to_owned(),
                    });
                }
                report.ignored_exports.push(name.to_owned());
            }
        }
    }

    if !has_memory {
        return Err(ScanError::MissingExport(MemoryExport::MEMORY));
    }
    if let Some(missing) = MemoryExport::iter().find(|export| !allocator.contains(export)) {
        return Err(ScanError::MissingExport(missing.export_name()));
    }

    for import in module.imports() {
        let label = format!("{}::{}", import.module(), import.name());
        let provided = match import.ty() {
            ExternType::Func(ty) if import.module() == IMPORT_MODULE => {
                host_import(import.name()).map(|shape| (shape, ty))
            }
            _ => None,
        };
        match provided {
            Some((shape, ty)) => {
                if !matches(shape.signature, &ty) {
                    return Err(ScanError::ImportMismatch {
                        name: shape.name,
                        expected: shape.signature.to_string(),
                        found: render(&ty),
                    });
                }
                report.imports.push(label);
            }
            None if strict_imports => {
                return Err(ScanError::UnknownImport {
                    module: import.module().to_owned(),
                    name: import.name().to_owned(),
                });
            }
            None => {
                warn!(import = %label, "unknown import will trap if called");
                report.unknown_imports.push(label);
            }
        }
    }

    for event in GuestEvent::iter() {
        if table.contains(event) {
            report.handlers.push(event.export_name());
        } else {
            report.unhandled.push(event.export_name());
        }
    }
    Ok((table, report))
}

fn recognized_signature(name: &str) -> Option<Signature> {
    GuestEvent::from_export_name(name)
        .map(GuestEvent::signature)
        .or_else(|| MemoryExport::from_export_name(name).map(MemoryExport::signature))
}

fn extern_kind(ty: &ExternType) -> &'static str {
    match ty {
        ExternType::Func(_) => "func",
        ExternType::Global(_) => "global",
        ExternType::Table(_) => "table",
        ExternType::Memory(_) => "memory",
        #[allow(unreachable_patterns)]
        _ => "extern",
    }
}

fn check_signature(name: &str, expected: Signature, ty: &FuncType) -> Result<(), ScanError> {
    if matches(expected, ty) {
        return Ok(());
    }
    Err(ScanError::SignatureMismatch {
        name: name.to_owned(),
        expected: expected.to_string(),
        found: render(ty),
    })
}

fn matches(expected: Signature, ty: &FuncType) -> bool {
    let params: Option<Vec<WireType>> = ty.params().map(|t| wire_type(&t)).collect();
    let results: Option<Vec<WireType>> = ty.results().map(|t| wire_type(&t)).collect();
    match (params, results) {
        (Some(params), Some(results)) => expected.matches(&params, &results),
        _ => false,
    }
}

fn wire_type(ty: &ValType) -> Option<WireType> {
    match ty {
        ValType::I32 => Some(WireType::I32),
        ValType::I64 => Some(WireType::I64),
        ValType::F32 => Some(WireType::F32),
        ValType::F64 => Some(WireType::F64),
        _ => None,
    }
}

/// Renders a function type the way [`Signature`] displays.
fn render(ty: &FuncType) -> String {
    let params: Vec<String> = ty.params().map(|t| t.to_string()).collect();
    let results: Vec<String> = ty.results().map(|t| t.to_string()).collect();
    let mut rendered = format!("({})", params.join(", "));
    match results.len() {
        0 => {}
        1 => rendered.push_str(&format!(" -> {}", results[0])),
        _ => rendered.push_str(&format!(" -> ({})", results.join(", "))),
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmtime::Engine;

    const ALLOCATOR: &str = r#"
        (memory (export "memory") 1)
        (func (export "__new") (param i32 i32) (result i32) i32.const 16)
        (func (export "__pin") (param i32) (result i32) local.get 0)
        (func (export "__unpin") (param i32))
    "#;

    fn module(body: &str) -> Module {
        let text = format!("(module {body})");
        Module::new(&Engine::default(), wat::parse_str(text).unwrap()).unwrap()
    }

    #[test]
    fn recognized_exports_are_wired_and_others_ignored() {
        let module = module(&format!(
            r#"{ALLOCATOR}
            (func (export "onStart"))
            (func (export "onChatMessage") (param i64 i32) (result i32) i32.const 1)
            (func (export "helper") (param i32) (result i32) local.get 0)
            (global (export "version") i32 (i32.const 1))
            "#
        ));
        let (table, report) = scan_module(&module, true).unwrap();
        assert_eq!(table.events().collect::<Vec<_>>(), [GuestEvent::Start, GuestEvent::ChatMessage]);
        assert!(!table.contains(GuestEvent::Tick));
        assert_eq!(report.handlers, ["onStart", "onChatMessage"]);
        assert_eq!(report.unhandled.len(), 6);
        assert_eq!(report.ignored_exports, ["helper", "version"]);
    }

    #[test]
    fn wrong_event_signature_rejects_the_module() {
        // Chat handler that forgot its verdict.
        let module = module(&format!(
            r#"{ALLOCATOR} (func (export "onChatMessage") (param i64 i32))"#
        ));
        assert_eq!(
            scan_module(&module, true).unwrap_err(),
            ScanError::SignatureMismatch {
                name: "onChatMessage".into(),
                expected: "(i64, i32) -> i32".into(),
                found: "(i64, i32)".into(),
            }
        );
    }

    #[test]
    fn event_names_on_non_functions_reject_the_module() {
        let global = module(&format!(
            r#"{ALLOCATOR} (global (export "onTick") i32 (i32.const 0))"#
        ));
        assert_eq!(
            scan_module(&global, true).unwrap_err(),
            ScanError::SignatureMismatch {
                name: "onTick".into(),
                expected: "(f32)".into(),
                found: "global".into(),
            }
        );

        let table = module(&format!(
            r#"{ALLOCATOR} (table (export "onChatMessage") 1 funcref)"#
        ));
        assert!(matches!(
            scan_module(&table, true).unwrap_err(),
            ScanError::SignatureMismatch { found, .. } if found == "table"
        ));
    }

    #[test]
    fn allocator_names_on_non_functions_reject_the_module() {
        let module = module(
            r#"
            (memory (export "memory") 1)
            (global (export "__new") i32 (i32.const 1024))
            (func (export "__pin") (param i32) (result i32) local.get 0)
            (func (export "__unpin") (param i32))
            "#,
        );
        assert_eq!(
            scan_module(&module, true).unwrap_err(),
            ScanError::SignatureMismatch {
                name: "__new".into(),
                expected: "(i32, i32) -> i32".into(),
                found: "global".into(),
            }
        );
    }

    #[test]
    fn allocator_exports_are_required() {
        let no_memory = module(
            r#"
            (func (export "__new") (param i32 i32) (result i32) i32.const 0)
            (func (export "__pin") (param i32) (result i32) local.get 0)
            (func (export "__unpin") (param i32))
            "#,
        );
        assert_eq!(scan_module(&no_memory, true).unwrap_err(), ScanError::MissingExport("memory"));

        let no_unpin = module(
            r#"
            (memory (export "memory") 1)
            (func (export "__new") (param i32 i32) (result i32) i32.const 0)
            (func (export "__pin") (param i32) (result i32) local.get 0)
            "#,
        );
        assert_eq!(scan_module(&no_unpin, true).unwrap_err(), ScanError::MissingExport("__unpin"));
    }

    #[test]
    fn unknown_imports_depend_on_strictness() {
        let module = module(&format!(
            r#"
            (import "env" "abort" (func (param i32 i32 i32 i32)))
            (import "badlads" "__hostIsObjectValid" (func (param i64) (result i32)))
            {ALLOCATOR}
            "#
        ));
        assert_eq!(
            scan_module(&module, true).unwrap_err(),
            ScanError::UnknownImport {
                module: "env".into(),
                name: "abort".into(),
            }
        );

        let (_, report) = scan_module(&module, false).unwrap();
        assert_eq!(report.imports, ["badlads::__hostIsObjectValid"]);
        assert_eq!(report.unknown_imports, ["env::abort"]);
    }

    #[test]
    fn mistyped_host_import_is_always_rejected() {
        let module = module(&format!(
            r#"
            (import "badlads" "__hostIsObjectValid" (func (param i32) (result i32)))
            {ALLOCATOR}
            "#
        ));
        assert!(matches!(
            scan_module(&module, false).unwrap_err(),
            ScanError::ImportMismatch { name: "__hostIsObjectValid", .. }
        ));
    }
}
