//! Drives the functions `export_plugin!` generates, the way the host calls them.

use badlads_sdk::abi::STRING_CLASS_ID;
use badlads_sdk::{alloc, ChatVerdict, ObjectHandle, Plugin};
use std::cell::RefCell;

thread_local! {
    static LOG: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

fn log(entry: String) {
    LOG.with(|log| log.borrow_mut().push(entry));
}

fn take_log() -> Vec<String> {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

struct ChatFilter {
    banned_word: &'static str,
}

impl Plugin for ChatFilter {
    fn on_start(&mut self) {
        log("start".to_owned());
    }

    fn on_tick(&mut self, delta_seconds: f32) {
        log(format!("tick {delta_seconds}"));
    }

    fn on_chat_message(&mut self, player_state: ObjectHandle, message: &str) -> ChatVerdict {
        log(format!("chat {} {message}", player_state.instance_id()));
        ChatVerdict::from(!message.contains(self.banned_word))
    }

    fn on_player_job_change(&mut self, _player_state: ObjectHandle, job_name: &str) {
        log(format!("job {job_name}"));
    }
}

badlads_sdk::export_plugin!(ChatFilter, || ChatFilter { banned_word: "grief" });

/// Host side of an owned event buffer: `__new`, write, `__pin`.
fn host_sends(text: &str) -> usize {
    let ptr = __badlads_new(text.len(), STRING_CLASS_ID);
    alloc::fill(ptr, text.as_bytes()).unwrap();
    __badlads_pin(ptr)
}

#[test]
fn generated_exports_forward_to_the_plugin() {
    __badlads_on_start();
    __badlads_on_tick(0.5);
    __badlads_on_player_login(1);
    __badlads_on_living_death(2, 0);
    __badlads_on_player_job_change(0x0200_0000_0000_0001, host_sends("Medic"));
    __badlads_on_stop();

    assert_eq!(take_log(), ["start", "tick 0.5", "job Medic"]);
}

#[test]
fn chat_export_returns_the_wire_verdict() {
    assert_eq!(__badlads_on_chat_message(0x0200_0000_0000_0005, host_sends("hi all")), 1);
    assert_eq!(__badlads_on_chat_message(0x0200_0000_0000_0005, host_sends("let's grief")), 0);
    assert_eq!(take_log(), ["chat 5 hi all", "chat 5 let's grief"]);
}

#[test]
fn memory_exports_follow_the_allocator_contract() {
    let before = alloc::live_count();

    let abandoned = __badlads_new(32, STRING_CLASS_ID);
    assert_ne!(abandoned, 0);
    assert_eq!(__badlads_pin(abandoned), abandoned);
    __badlads_unpin(abandoned);
    assert_eq!(alloc::live_count(), before);

    // Claimed during dispatch, so a late unpin is a no-op.
    let delivered = host_sends("ok");
    __badlads_on_chat_message(1, delivered);
    __badlads_unpin(delivered);
    assert_eq!(alloc::live_count(), before);
    take_log();
}
