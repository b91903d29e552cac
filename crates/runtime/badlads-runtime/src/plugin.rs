//! Loading, dispatching to and hot-reloading a plugin.

use crate::error::RuntimeError;
use crate::guest::GuestMemory;
use crate::host::{SharedGame, StoreData};
use crate::linker::register_host_functions;
use crate::metrics;
use crate::scan::{scan_module, HandlerTable, ScanReport};
use badlads_host_abi::{GuestEvent, STRING_CLASS_ID};
use badlads_types::ObjectHandle;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tracing::{debug, info, warn};
use wasmtime::{Config, Engine, Instance, Linker, Module, OptLevel, Store, WasmParams, WasmResults};

struct LoadedPlugin {
    store: Store<StoreData>,
    instance: Instance,
    handlers: HandlerTable,
    report: ScanReport,
}

/// Where the current plugin came from, for reload polling.
struct Source {
    path: PathBuf,
    modified: Option<SystemTime>,
}

/// Runs one plugin against a game.
pub struct PluginHost {
    engine: Engine,
    linker: Linker<StoreData>,
    game: SharedGame,
    strict_imports: bool,
    loaded: Option<LoadedPlugin>,
    source: Option<Source>,
}

impl PluginHost {
    pub fn new(game: SharedGame, strict_imports: bool) -> Result<Self, RuntimeError> {
        let mut config = Config::new();
        config.cranelift_opt_level(OptLevel::Speed);
        let engine = Engine::new(&config).map_err(|e| RuntimeError::Compile(e.to_string()))?;

        let mut linker = Linker::new(&engine);
        register_host_functions(&mut linker).map_err(|e| RuntimeError::Instantiate(e.to_string()))?;

        Ok(Self {
            engine,
            linker,
            game,
            strict_imports,
            loaded: None,
            source: None,
        })
    }

    pub fn game(&self) -> &SharedGame {
        &self.game
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Scan result of the running plugin.
    pub fn report(&self) -> Option<&ScanReport> {
        self.loaded.as_ref().map(|plugin| &plugin.report)
    }

    pub fn handles(&self, event: GuestEvent) -> bool {
        self.loaded
            .as_ref()
            .map(|plugin| plugin.handlers.contains(event))
            .unwrap_or(false)
    }

    /// Compiles and scans `bytes` without running anything.
    pub fn inspect(&self, bytes: &[u8]) -> Result<ScanReport, RuntimeError> {
        let module = self.compile(bytes)?;
        let (_, report) = scan_module(&module, self.strict_imports)?;
        Ok(report)
    }

    /// Loads a plugin from wasm (or wat) bytes. Does not call `onStart`.
    ///
    /// Replaces the running plugin without calling its `onStop`; use [`Self::reload`]
    /// for that.
    pub fn load(&mut self, bytes: &[u8]) -> Result<&ScanReport, RuntimeError> {
        let plugin = self.prepare(bytes)?;
        info!(handlers = ?plugin.report.handlers, "plugin loaded");
        let plugin = self.loaded.insert(plugin);
        Ok(&plugin.report)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<&ScanReport, RuntimeError> {
        let (bytes, modified) = read_plugin(path)?;
        self.source = Some(Source {
            path: path.to_path_buf(),
            modified,
        });
        self.load(&bytes)
    }

    /// Swaps in a new build of the plugin.
    ///
    /// The new module is compiled, scanned and instantiated first. If any of that
    /// fails the running plugin is left untouched. Otherwise the old instance gets
    /// `onStop`, the instances are swapped, and the new one gets `onStart`. A trap in
    /// that `onStart` is [`RuntimeError::ReloadStart`]: the new build stays loaded.
    pub fn reload(&mut self, bytes: &[u8]) -> Result<&ScanReport, RuntimeError> {
        let next = match self.prepare(bytes) {
            Ok(next) => next,
            Err(e) => {
                warn!(error = %e, "reload rejected, keeping the running plugin");
                return Err(e);
            }
        };
        if self.loaded.is_some() {
            if let Err(e) = self.stop() {
                warn!(error = %e, "old plugin trapped in onStop during reload");
            }
        }
        self.loaded = Some(next);
        info!("plugin reloaded");
        self.start().map_err(|e| RuntimeError::ReloadStart(Box::new(e)))?;
        self.report().ok_or(RuntimeError::NotLoaded)
    }

    /// Reloads from the file given to [`Self::load_file`] if it changed since.
    ///
    /// Returns `Ok(true)` when a reload happened.
    pub fn reload_if_changed(&mut self) -> Result<bool, RuntimeError> {
        let Some(source) = &self.source else {
            return Ok(false);
        };
        let path = source.path.clone();
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
        if modified.is_none() || modified == source.modified {
            return Ok(false);
        }

        debug!(path = %path.display(), "plugin file changed");
        if let Some(source) = self.source.as_mut() {
            // Recorded before reloading so a broken build is not retried every poll.
            source.modified = modified;
        }
        let (bytes, _) = read_plugin(&path)?;
        self.reload(&bytes)?;
        Ok(true)
    }

    fn compile(&self, bytes: &[u8]) -> Result<Module, RuntimeError> {
        Module::new(&self.engine, bytes).map_err(|e| RuntimeError::Compile(format!("{e:#}")))
    }

    fn prepare(&self, bytes: &[u8]) -> Result<LoadedPlugin, RuntimeError> {
        let module = self.compile(bytes)?;
        let (handlers, report) = scan_module(&module, self.strict_imports)?;
        let instantiate = |e: anyhow::Error| RuntimeError::Instantiate(format!("{e:#}"));

        let mut store = Store::new(&self.engine, StoreData::new(self.game.clone()));
        let instance = if self.strict_imports {
            self.linker.instantiate(&mut store, &module).map_err(instantiate)?
        } else {
            // Unknown-import traps are typed per module, so they never outlive the build
            // they were made for.
            let mut linker = self.linker.clone();
            linker.define_unknown_imports_as_traps(&module).map_err(instantiate)?;
            linker.instantiate(&mut store, &module).map_err(instantiate)?
        };
        Ok(LoadedPlugin {
            store,
            instance,
            handlers,
            report,
        })
    }

    // --- events ---

    pub fn start(&mut self) -> Result<(), RuntimeError> {
        self.call::<(), ()>(GuestEvent::Start, ()).map(drop)
    }

    pub fn stop(&mut self) -> Result<(), RuntimeError> {
        self.call::<(), ()>(GuestEvent::Stop, ()).map(drop)
    }

    pub fn tick(&mut self, delta_seconds: f32) -> Result<(), RuntimeError> {
        self.call::<f32, ()>(GuestEvent::Tick, delta_seconds).map(drop)
    }

    pub fn player_login(&mut self, player_state: ObjectHandle) -> Result<(), RuntimeError> {
        self.call::<i64, ()>(GuestEvent::PlayerLogin, wire(player_state)).map(drop)
    }

    pub fn player_logout(&mut self, player_state: ObjectHandle) -> Result<(), RuntimeError> {
        self.call::<i64, ()>(GuestEvent::PlayerLogout, wire(player_state)).map(drop)
    }

    /// Returns whether the message should be delivered. A plugin without a chat
    /// handler lets everything through.
    pub fn chat_message(&mut self, player_state: ObjectHandle, message: &str) -> Result<bool, RuntimeError> {
        if !self.handles(GuestEvent::ChatMessage) {
            return Ok(true);
        }
        let ptr = self.write_event_text(GuestEvent::ChatMessage, message)?;
        let verdict = self.call::<(i64, i32), i32>(GuestEvent::ChatMessage, (wire(player_state), ptr))?;
        Ok(verdict.map_or(true, |verdict| verdict != 0))
    }

    pub fn living_death(&mut self, victim: ObjectHandle, killer: ObjectHandle) -> Result<(), RuntimeError> {
        self.call::<(i64, i64), ()>(GuestEvent::LivingDeath, (wire(victim), wire(killer)))
            .map(drop)
    }

    pub fn player_job_change(&mut self, player_state: ObjectHandle, job_name: &str) -> Result<(), RuntimeError> {
        if !self.handles(GuestEvent::PlayerJobChange) {
            return Ok(());
        }
        let ptr = self.write_event_text(GuestEvent::PlayerJobChange, job_name)?;
        self.call::<(i64, i32), ()>(GuestEvent::PlayerJobChange, (wire(player_state), ptr))
            .map(drop)
    }

    /// Calls `event` if the plugin exports it. `Ok(None)` when it does not.
    fn call<P, R>(&mut self, event: GuestEvent, params: P) -> Result<Option<R>, RuntimeError>
    where
        P: WasmParams,
        R: WasmResults,
    {
        let plugin = self.loaded.as_mut().ok_or(RuntimeError::NotLoaded)?;
        if !plugin.handlers.contains(event) {
            return Ok(None);
        }
        let name = event.export_name();
        let trap = |e: anyhow::Error| RuntimeError::Trap {
            event: name,
            message: format!("{e:#}"),
        };

        let func = plugin
            .instance
            .get_typed_func::<P, R>(&mut plugin.store, name)
            .map_err(trap)?;
        let started = Instant::now();
        let result = func.call(&mut plugin.store, params).map_err(trap);
        metrics::record_event_dispatched(name, started.elapsed().as_secs_f64());
        result.map(Some)
    }

    fn write_event_text(&mut self, event: GuestEvent, text: &str) -> Result<i32, RuntimeError> {
        let plugin = self.loaded.as_mut().ok_or(RuntimeError::NotLoaded)?;
        let trap = |e: anyhow::Error| RuntimeError::Trap {
            event: event.export_name(),
            message: format!("{e:#}"),
        };
        let memory = GuestMemory::from_instance(&plugin.instance, &mut plugin.store).map_err(trap)?;
        memory
            .write_owned(&mut plugin.store, text.as_bytes(), STRING_CLASS_ID)
            .map_err(trap)
    }
}

fn wire(handle: ObjectHandle) -> i64 {
    handle.to_wire() as i64
}

fn read_plugin(path: &Path) -> Result<(Vec<u8>, Option<SystemTime>), RuntimeError> {
    let io = |source| RuntimeError::Io {
        path: path.to_path_buf(),
        source,
    };
    let bytes = fs::read(path).map_err(io)?;
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
    Ok((bytes, modified))
}
