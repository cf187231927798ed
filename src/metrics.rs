//! Process-wide counters for command dispatch and GUI lifecycle.
//! Cheap relaxed atomics; read them through [`snapshot`].
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::command::Stage;

static COMMANDS_DISPATCHED: AtomicU64 = AtomicU64::new(0);
static REJECTED_PERMISSION: AtomicU64 = AtomicU64::new(0);
static REJECTED_SENDER: AtomicU64 = AtomicU64::new(0);
static REJECTED_ARGUMENTS: AtomicU64 = AtomicU64::new(0);
static REJECTED_CUSTOM: AtomicU64 = AtomicU64::new(0);
static CALLBACK_FAILURES: AtomicU64 = AtomicU64::new(0);
static GUIS_OPENED: AtomicU64 = AtomicU64::new(0);
static GUIS_CLOSED: AtomicU64 = AtomicU64::new(0);
static GUIS_SWEPT: AtomicU64 = AtomicU64::new(0);
static PAGE_TURNS: AtomicU64 = AtomicU64::new(0);

static COMMAND_COUNTERS: OnceLock<Mutex<HashMap<String, CommandCounter>>> = OnceLock::new();

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommandCounter {
    pub dispatched: u64,
    pub rejected: u64,
    pub failed: u64,
}

fn command_counter_lock() -> &'static Mutex<HashMap<String, CommandCounter>> {
    COMMAND_COUNTERS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn bump_command(name: &str, f: impl FnOnce(&mut CommandCounter)) {
    let mut guard = command_counter_lock()
        .lock()
        .expect("command counter mutex poisoned");
    f(guard.entry(name.to_string()).or_default());
}

pub fn record_dispatch(command: &str) {
    COMMANDS_DISPATCHED.fetch_add(1, Ordering::Relaxed);
    bump_command(command, |c| c.dispatched = c.dispatched.saturating_add(1));
}

pub fn record_rejection(command: &str, stage: Stage) {
    let counter = match stage {
        Stage::Permission => &REJECTED_PERMISSION,
        Stage::SenderKind => &REJECTED_SENDER,
        Stage::ArgumentCount => &REJECTED_ARGUMENTS,
        Stage::CustomError => &REJECTED_CUSTOM,
    };
    counter.fetch_add(1, Ordering::Relaxed);
    bump_command(command, |c| c.rejected = c.rejected.saturating_add(1));
}

pub fn record_callback_failure(command: &str) {
    CALLBACK_FAILURES.fetch_add(1, Ordering::Relaxed);
    bump_command(command, |c| c.failed = c.failed.saturating_add(1));
}

pub fn inc_gui_opened() {
    GUIS_OPENED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_gui_closed() {
    GUIS_CLOSED.fetch_add(1, Ordering::Relaxed);
}

pub fn add_gui_swept(n: u64) {
    GUIS_SWEPT.fetch_add(n, Ordering::Relaxed);
}

pub fn inc_page_turn() {
    PAGE_TURNS.fetch_add(1, Ordering::Relaxed);
}

pub fn command_counters_snapshot() -> HashMap<String, CommandCounter> {
    command_counter_lock()
        .lock()
        .expect("command counter mutex poisoned")
        .clone()
}

#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub commands_dispatched: u64,
    pub rejected_permission: u64,
    pub rejected_sender: u64,
    pub rejected_arguments: u64,
    pub rejected_custom: u64,
    pub callback_failures: u64,
    pub guis_opened: u64,
    pub guis_closed: u64,
    pub guis_swept: u64,
    pub page_turns: u64,
}

impl Snapshot {
    pub fn rejected_total(&self) -> u64 {
        self.rejected_permission
            + self.rejected_sender
            + self.rejected_arguments
            + self.rejected_custom
    }
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        commands_dispatched: COMMANDS_DISPATCHED.load(Ordering::Relaxed),
        rejected_permission: REJECTED_PERMISSION.load(Ordering::Relaxed),
        rejected_sender: REJECTED_SENDER.load(Ordering::Relaxed),
        rejected_arguments: REJECTED_ARGUMENTS.load(Ordering::Relaxed),
        rejected_custom: REJECTED_CUSTOM.load(Ordering::Relaxed),
        callback_failures: CALLBACK_FAILURES.load(Ordering::Relaxed),
        guis_opened: GUIS_OPENED.load(Ordering::Relaxed),
        guis_closed: GUIS_CLOSED.load(Ordering::Relaxed),
        guis_swept: GUIS_SWEPT.load(Ordering::Relaxed),
        page_turns: PAGE_TURNS.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are process-wide and other tests bump them concurrently, so
    // assert on deltas for a command name nobody else uses.
    #[test]
    fn per_command_counters_accumulate() {
        let before = snapshot();
        record_dispatch("metrics-test-cmd");
        record_rejection("metrics-test-cmd", Stage::ArgumentCount);
        record_callback_failure("metrics-test-cmd");

        let counters = command_counters_snapshot();
        let c = counters.get("metrics-test-cmd").expect("counter present");
        assert_eq!(c.dispatched, 1);
        assert_eq!(c.rejected, 1);
        assert_eq!(c.failed, 1);

        let after = snapshot();
        assert!(after.commands_dispatched > before.commands_dispatched);
        assert!(after.rejected_arguments > before.rejected_arguments);
        assert!(after.rejected_total() > before.rejected_total());
    }
}
