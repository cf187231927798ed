//! Shared fixtures for integration tests.

use plugkit::command::{CommandHandler, CommandHandlerBuilder};
use plugkit::host::memory::MemoryHost;
use plugkit::host::{Actor, ItemStack};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Counts callback runs and records the arguments each run saw.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<AtomicUsize>,
    args: Arc<Mutex<Vec<Vec<String>>>>,
}

#[allow(dead_code)] // not every test binary uses every helper
impl CallLog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_args(&self) -> Option<Vec<String>> {
        self.args.lock().unwrap().last().cloned()
    }

    /// Install a callback that only records into this log.
    pub fn finish(
        &self,
        builder: CommandHandlerBuilder<MemoryHost>,
    ) -> CommandHandler<MemoryHost> {
        let log = self.clone();
        builder
            .on_execute(move |_, exec| {
                log.calls.fetch_add(1, Ordering::SeqCst);
                log.args.lock().unwrap().push(exec.raw_args().to_vec());
                Ok(())
            })
            .expect("valid handler")
    }
}

#[allow(dead_code)]
pub fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[allow(dead_code)]
pub fn numbered_items(n: usize) -> Vec<ItemStack> {
    (0..n)
        .map(|i| ItemStack::new("STONE").with_title(format!("Item {}", i)))
        .collect()
}

#[allow(dead_code)]
pub fn host_with_player(name: &str) -> (MemoryHost, Actor) {
    (MemoryHost::new(), Actor::player(name))
}
