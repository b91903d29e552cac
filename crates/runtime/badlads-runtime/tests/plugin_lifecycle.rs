mod helpers;

use badlads_host_abi::GuestEvent;
use badlads_runtime::{PluginHost, RuntimeError, ScanError};
use helpers::{lifecycle_plugin, plugin, share, TestGame, PLAYER};
use std::fs::{self, File};
use std::time::{Duration, SystemTime};

fn chat(game: &std::sync::Mutex<TestGame>) -> Vec<String> {
    game.lock().unwrap().global_chat.clone()
}

#[test]
fn only_exported_events_are_dispatched() -> anyhow::Result<()> {
    let (game, shared) = share(TestGame::default());
    let mut host = PluginHost::new(shared, true)?;

    let report = host.load(lifecycle_plugin("a").as_bytes())?;
    assert_eq!(report.handlers, ["onStart", "onStop", "onTick"]);
    assert!(report.unhandled.contains(&"onChatMessage"));
    assert!(host.handles(GuestEvent::Tick));
    assert!(!host.handles(GuestEvent::PlayerLogin));

    host.start()?;
    host.player_login(PLAYER)?;
    host.tick(0.033)?;
    // No chat handler: everything is delivered.
    assert!(host.chat_message(PLAYER, "hello")?);
    host.living_death(PLAYER, PLAYER)?;
    host.player_job_change(PLAYER, "Mayor")?;
    host.player_logout(PLAYER)?;
    host.stop()?;

    assert_eq!(chat(&game), ["a:start", "a:tick", "a:stop"]);
    Ok(())
}

#[test]
fn events_need_a_loaded_plugin() -> anyhow::Result<()> {
    let (_, shared) = share(TestGame::default());
    let mut host = PluginHost::new(shared, true)?;
    assert!(!host.is_loaded());
    assert!(host.report().is_none());
    assert!(matches!(host.start(), Err(RuntimeError::NotLoaded)));
    Ok(())
}

#[test]
fn mistyped_handler_fails_the_load() -> anyhow::Result<()> {
    let (_, shared) = share(TestGame::default());
    let mut host = PluginHost::new(shared, true)?;

    let wat = plugin("", r#"(func (export "onTick") (param f64))"#);
    match host.load(wat.as_bytes()) {
        Err(RuntimeError::Scan(ScanError::SignatureMismatch { name, expected, found })) => {
            assert_eq!(name, "onTick");
            assert_eq!(expected, "(f32)");
            assert_eq!(found, "(f64)");
        }
        other => panic!("expected a signature mismatch, got {other:?}"),
    }
    assert!(!host.is_loaded());
    Ok(())
}

#[test]
fn inspect_does_not_load() -> anyhow::Result<()> {
    let (game, shared) = share(TestGame::default());
    let host = PluginHost::new(shared, true)?;

    let report = host.inspect(lifecycle_plugin("a").as_bytes())?;
    assert_eq!(report.imports, ["badlads::__hostGlobalPostChatMessage"]);
    assert!(!host.is_loaded());
    assert!(chat(&game).is_empty());
    Ok(())
}

#[test]
fn reload_stops_the_old_build_and_starts_the_new_one() -> anyhow::Result<()> {
    let (game, shared) = share(TestGame::default());
    let mut host = PluginHost::new(shared, true)?;
    host.load(lifecycle_plugin("a").as_bytes())?;
    host.start()?;

    host.reload(lifecycle_plugin("b").as_bytes())?;
    host.tick(0.033)?;

    assert_eq!(chat(&game), ["a:start", "a:stop", "b:start", "b:tick"]);
    Ok(())
}

#[test]
fn failed_reload_keeps_the_running_plugin() -> anyhow::Result<()> {
    let (game, shared) = share(TestGame::default());
    let mut host = PluginHost::new(shared, true)?;
    host.load(lifecycle_plugin("a").as_bytes())?;
    host.start()?;

    assert!(matches!(host.reload(b"(module"), Err(RuntimeError::Compile(_))));
    let mistyped = plugin("", r#"(func (export "onStart") (param i32))"#);
    assert!(matches!(host.reload(mistyped.as_bytes()), Err(RuntimeError::Scan(_))));

    host.tick(0.033)?;
    assert_eq!(chat(&game), ["a:start", "a:tick"]);
    Ok(())
}

#[test]
fn changed_plugin_file_is_reloaded_once() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("plugin.wat");
    fs::write(&path, lifecycle_plugin("a"))?;

    let (game, shared) = share(TestGame::default());
    let mut host = PluginHost::new(shared, true)?;
    host.load_file(&path)?;
    host.start()?;
    assert!(!host.reload_if_changed()?);

    fs::write(&path, lifecycle_plugin("b"))?;
    // Coarse filesystem clocks could otherwise report the same mtime.
    File::options()
        .write(true)
        .open(&path)?
        .set_modified(SystemTime::now() + Duration::from_secs(60))?;

    assert!(host.reload_if_changed()?);
    assert!(!host.reload_if_changed()?);
    assert_eq!(chat(&game), ["a:start", "a:stop", "b:start"]);
    Ok(())
}

#[test]
fn missing_plugin_file_is_an_io_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (_, shared) = share(TestGame::default());
    let mut host = PluginHost::new(shared, true)?;
    assert!(matches!(
        host.load_file(&dir.path().join("missing.wasm")),
        Err(RuntimeError::Io { .. })
    ));
    Ok(())
}

/// Announces `name` on start and calls an `env::abort` the host does not provide on tick.
fn aborting_plugin(name: &str, abort_param: &str) -> String {
    plugin(
        &format!(
            r#"
            (import "env" "abort" (func $abort (param {abort_param})))
            (import "badlads" "__hostGlobalPostChatMessage" (func $say (param i32 i32 i32 i32)))"#
        ),
        &format!(
            r#"
            (data (i32.const 16) "{name}")
            (func (export "onStart") (call $say (i32.const 16) (i32.const {}) (i32.const 0) (i32.const 0)))
            (func (export "onTick") (param f32) (call $abort ({abort_param}.const 0)))
            "#,
            name.len()
        ),
    )
}

#[test]
fn lenient_reload_accepts_a_retyped_unknown_import() -> anyhow::Result<()> {
    let (game, shared) = share(TestGame::default());
    let mut host = PluginHost::new(shared, false)?;
    host.load(aborting_plugin("a", "i32").as_bytes())?;
    host.start()?;

    let report = host.reload(aborting_plugin("b", "i64").as_bytes())?;
    assert_eq!(report.unknown_imports, ["env::abort"]);
    assert_eq!(chat(&game), ["a", "b"]);
    assert!(matches!(host.tick(0.033), Err(RuntimeError::Trap { event: "onTick", .. })));

    // And back again.
    host.reload(aborting_plugin("c", "i32").as_bytes())?;
    assert_eq!(chat(&game), ["a", "b", "c"]);
    Ok(())
}

#[test]
fn start_failure_after_reload_is_reported_separately() -> anyhow::Result<()> {
    let (game, shared) = share(TestGame::default());
    let mut host = PluginHost::new(shared, true)?;
    host.load(lifecycle_plugin("a").as_bytes())?;
    host.start()?;

    let crashing = plugin("", r#"(func (export "onStart") unreachable)"#);
    match host.reload(crashing.as_bytes()) {
        Err(RuntimeError::ReloadStart(cause)) => {
            assert!(matches!(*cause, RuntimeError::Trap { event: "onStart", .. }));
        }
        other => panic!("expected a start failure, got {other:?}"),
    }

    // The old build was stopped and the new one stays loaded.
    assert_eq!(chat(&game), ["a:start", "a:stop"]);
    assert!(!host.handles(GuestEvent::Tick));
    assert_eq!(host.report().map(|report| report.handlers.clone()), Some(vec!["onStart"]));
    Ok(())
}
