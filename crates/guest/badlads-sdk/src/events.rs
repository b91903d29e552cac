//! Guest event handlers and the exports the host discovers them through.
//!
//! The host never asks which events a plugin handles. It scans the module's export
//! table for the names in [`badlads_host_abi::GuestEvent`] and calls whatever it finds.
//! [`export_plugin!`](crate::export_plugin) emits every one of those exports, plus the
//! `__new`/`__pin`/`__unpin` memory exports, as unconditional top-level functions that
//! forward to a [`Plugin`] through an [`EventDispatcher`].

use crate::buffer::{fatal, BufferPtr, OwnedBuffer};
use badlads_types::ObjectHandle;
use tracing::debug;

/// What happens to a chat message after the plugin saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatVerdict {
    /// Let the host deliver it as usual.
    #[default]
    Deliver,
    /// Drop it.
    Suppress,
}

impl ChatVerdict {
    /// `1` delivers, `0` suppresses.
    pub const fn to_wire(self) -> i32 {
        match self {
            ChatVerdict::Deliver => 1,
            ChatVerdict::Suppress => 0,
        }
    }
}

impl From<bool> for ChatVerdict {
    /// `true` delivers.
    fn from(deliver: bool) -> Self {
        if deliver {
            ChatVerdict::Deliver
        } else {
            ChatVerdict::Suppress
        }
    }
}

/// Event handlers. Every method has a no-op default; implement the ones you need.
///
/// The host runs one handler at a time, to completion.
pub trait Plugin {
    fn on_start(&mut self) {}

    fn on_stop(&mut self) {}

    /// Called once per server tick.
    fn on_tick(&mut self, _delta_seconds: f32) {}

    fn on_player_login(&mut self, _player_state: ObjectHandle) {}

    fn on_player_logout(&mut self, _player_state: ObjectHandle) {}

    /// The only handler that can veto the host. Delivers by default.
    fn on_chat_message(&mut self, _player_state: ObjectHandle, _message: &str) -> ChatVerdict {
        ChatVerdict::Deliver
    }

    /// `killer` may be [`ObjectHandle::NONE`].
    fn on_living_death(&mut self, _victim: ObjectHandle, _killer: ObjectHandle) {}

    fn on_player_job_change(&mut self, _player_state: ObjectHandle, _job_name: &str) {}
}

/// Turns wire-level event calls into [`Plugin`] calls.
#[derive(Debug, Default)]
pub struct EventDispatcher<P> {
    plugin: P,
}

impl<P: Plugin> EventDispatcher<P> {
    pub fn new(plugin: P) -> Self {
        Self { plugin }
    }

    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    pub fn plugin_mut(&mut self) -> &mut P {
        &mut self.plugin
    }

    pub fn start(&mut self) {
        debug!("onStart");
        self.plugin.on_start();
    }

    pub fn stop(&mut self) {
        debug!("onStop");
        self.plugin.on_stop();
    }

    pub fn tick(&mut self, delta_seconds: f32) {
        self.plugin.on_tick(delta_seconds);
    }

    pub fn player_login(&mut self, player_state: u64) {
        self.plugin.on_player_login(ObjectHandle::from_wire(player_state));
    }

    pub fn player_logout(&mut self, player_state: u64) {
        self.plugin.on_player_logout(ObjectHandle::from_wire(player_state));
    }

    /// Claims the message buffer and returns the wire verdict.
    pub fn chat_message(&mut self, player_state: u64, message_ptr: usize) -> i32 {
        let message = event_text(message_ptr);
        let verdict = self
            .plugin
            .on_chat_message(ObjectHandle::from_wire(player_state), &message);
        debug!(?verdict, "onChatMessage");
        verdict.to_wire()
    }

    pub fn living_death(&mut self, victim: u64, killer: u64) {
        self.plugin
            .on_living_death(ObjectHandle::from_wire(victim), ObjectHandle::from_wire(killer));
    }

    /// Claims the job name buffer.
    pub fn player_job_change(&mut self, player_state: u64, job_name_ptr: usize) {
        let job_name = event_text(job_name_ptr);
        self.plugin
            .on_player_job_change(ObjectHandle::from_wire(player_state), &job_name);
    }
}

/// Event strings are owned buffers; a null pointer is an empty string.
fn event_text(ptr: usize) -> String {
    fatal(OwnedBuffer::claim(BufferPtr::from_wire(ptr)))
        .map(OwnedBuffer::into_string)
        .unwrap_or_default()
}

/// Exports a [`Plugin`] type to the host.
///
/// Invoke once, at the root of the plugin crate:
///
/// ```ignore
/// #[derive(Default)]
/// struct Greeter;
///
/// impl badlads_sdk::Plugin for Greeter {}
///
/// badlads_sdk::export_plugin!(Greeter);
/// // or, with a constructor:
/// badlads_sdk::export_plugin!(Greeter, || Greeter);
/// ```
///
/// Emits the event exports `onStart`, `onStop`, `onTick`, `onPlayerLogin`,
/// `onPlayerLogout`, `onChatMessage`, `onLivingDeath` and `onPlayerJobChange`, and
/// the memory exports `__new`, `__pin` and `__unpin`. The plugin value is created on
/// the first event.
#[macro_export]
macro_rules! export_plugin {
    ($plugin:ty) => {
        $crate::export_plugin!($plugin, <$plugin as ::core::default::Default>::default);
    };
    ($plugin:ty, $init:expr) => {
        ::std::thread_local! {
            static __BADLADS_DISPATCHER: ::core::cell::RefCell<$crate::EventDispatcher<$plugin>> =
                ::core::cell::RefCell::new($crate::EventDispatcher::new(($init)()));
        }

        fn __badlads_dispatch<R>(event: impl FnOnce(&mut $crate::EventDispatcher<$plugin>) -> R) -> R {
            __BADLADS_DISPATCHER.with(|dispatcher| event(&mut dispatcher.borrow_mut()))
        }

        #[export_name = "onStart"]
        pub extern "C" fn __badlads_on_start() {
            __badlads_dispatch(|d| d.start())
        }

        #[export_name = "onStop"]
        pub extern "C" fn __badlads_on_stop() {
            __badlads_dispatch(|d| d.stop())
        }

        #[export_name = "onTick"]
        pub extern "C" fn __badlads_on_tick(delta_seconds: f32) {
            __badlads_dispatch(|d| d.tick(delta_seconds))
        }

        #[export_name = "onPlayerLogin"]
        pub extern "C" fn __badlads_on_player_login(player_state: u64) {
            __badlads_dispatch(|d| d.player_login(player_state))
        }

        #[export_name = "onPlayerLogout"]
        pub extern "C" fn __badlads_on_player_logout(player_state: u64) {
            __badlads_dispatch(|d| d.player_logout(player_state))
        }

        #[export_name = "onChatMessage"]
        pub extern "C" fn __badlads_on_chat_message(player_state: u64, message: usize) -> i32 {
            __badlads_dispatch(|d| d.chat_message(player_state, message))
        }

        #[export_name = "onLivingDeath"]
        pub extern "C" fn __badlads_on_living_death(victim: u64, killer: u64) {
            __badlads_dispatch(|d| d.living_death(victim, killer))
        }

        #[export_name = "onPlayerJobChange"]
        pub extern "C" fn __badlads_on_player_job_change(player_state: u64, job_name: usize) {
            __badlads_dispatch(|d| d.player_job_change(player_state, job_name))
        }

        #[export_name = "__new"]
        pub extern "C" fn __badlads_new(size: usize, class_id: u32) -> usize {
            $crate::alloc::allocate(size, class_id)
        }

        #[export_name = "__pin"]
        pub extern "C" fn __badlads_pin(ptr: usize) -> usize {
            $crate::alloc::pin(ptr)
        }

        #[export_name = "__unpin"]
        pub extern "C" fn __badlads_unpin(ptr: usize) {
            $crate::alloc::unpin(ptr)
        }
    };
}
