//! # Task Scheduling
//!
//! Four scheduling behaviours as data rather than a type per behaviour:
//!
//! | context      | once                      | repeating                  |
//! |--------------|---------------------------|----------------------------|
//! | `Main`       | [`TaskKind::sync_later`]  | [`TaskKind::sync_timer`]   |
//! | `Background` | [`TaskKind::async_later`] | [`TaskKind::async_timer`]  |
//!
//! Delays and periods are in server ticks. Main-context jobs run on the event
//! thread when the host calls [`TaskScheduler::tick`], in the order they were
//! scheduled. Background jobs run on the current tokio runtime, with one tick
//! taken as [`TICK`].
//!
//! A job receives a [`TaskRun`] it can use to cancel itself; once a job is
//! cancelled it never runs again. A [`TaskChain`] runs one-shot jobs one after
//! another in a single context.
//!
//! Delays and periods too large to represent are clamped to the last tick, so
//! such a job simply never comes due.
mod chain;

pub use chain::TaskChain;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{KitError, KitResult};

/// Wall-clock length of one tick for background jobs.
pub const TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskContext {
    Main,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Schedule {
    Once { delay: u64 },
    Repeating { delay: u64, period: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskKind {
    pub context: TaskContext,
    pub schedule: Schedule,
}

impl TaskKind {
    pub fn sync_later(delay: u64) -> Self {
        Self {
            context: TaskContext::Main,
            schedule: Schedule::Once { delay },
        }
    }

    pub fn sync_timer(delay: u64, period: u64) -> Self {
        Self {
            context: TaskContext::Main,
            schedule: Schedule::Repeating { delay, period },
        }
    }

    pub fn async_later(delay: u64) -> Self {
        Self {
            context: TaskContext::Background,
            schedule: Schedule::Once { delay },
        }
    }

    pub fn async_timer(delay: u64, period: u64) -> Self {
        Self {
            context: TaskContext::Background,
            schedule: Schedule::Repeating { delay, period },
        }
    }

    fn delay(&self) -> u64 {
        match self.schedule {
            Schedule::Once { delay } | Schedule::Repeating { delay, .. } => delay,
        }
    }

    fn period(&self) -> Option<u64> {
        match self.schedule {
            Schedule::Once { .. } => None,
            Schedule::Repeating { period, .. } => Some(period),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0.simple())
    }
}

/// Per-task state handed to each run of a job.
#[derive(Debug)]
pub struct TaskRun {
    id: TaskId,
    runs: u64,
    cancelled: bool,
}

impl TaskRun {
    fn new(id: TaskId) -> Self {
        Self {
            id,
            runs: 0,
            cancelled: false,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Completed runs before the current one.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Stop after the current run.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

type Job = Box<dyn FnMut(&mut TaskRun) + Send>;

struct MainTask {
    due: u64,
    period: Option<u64>,
    run: TaskRun,
    job: Job,
}

struct BackgroundTask {
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct TaskScheduler {
    current_tick: u64,
    main: Vec<MainTask>,
    background: HashMap<TaskId, BackgroundTask>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `job`. A zero period is a configuration error; background
    /// jobs need a running tokio runtime.
    pub fn schedule(
        &mut self,
        kind: TaskKind,
        job: impl FnMut(&mut TaskRun) + Send + 'static,
    ) -> KitResult<TaskId> {
        if kind.period() == Some(0) {
            return Err(KitError::config("repeating task period must be at least 1 tick"));
        }
        let id = TaskId(Uuid::new_v4());
        match kind.context {
            TaskContext::Main => {
                self.main.push(MainTask {
                    due: self.current_tick.saturating_add(kind.delay().max(1)),
                    period: kind.period(),
                    run: TaskRun::new(id),
                    job: Box::new(job),
                });
            }
            TaskContext::Background => {
                let handle = Handle::try_current().map_err(|_| KitError::NoRuntime)?;
                let cancelled = Arc::new(AtomicBool::new(false));
                let task = run_background(id, kind, Box::new(job), cancelled.clone());
                let handle = handle.spawn(task);
                self.background.insert(id, BackgroundTask { cancelled, handle });
            }
        }
        debug!("scheduled {} as {:?}", id, kind);
        Ok(id)
    }

    /// Cancel a pending task. Returns false if it is unknown or already done.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if let Some(pos) = self.main.iter().position(|t| t.run.id == id) {
            self.main.remove(pos);
            debug!("cancelled {}", id);
            return true;
        }
        match self.background.remove(&id) {
            Some(task) => {
                let live = !task.handle.is_finished();
                task.cancelled.store(true, Ordering::SeqCst);
                task.handle.abort();
                debug!("cancelled {}", id);
                live
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) -> usize {
        let ids: Vec<TaskId> = self
            .main
            .iter()
            .map(|t| t.run.id)
            .chain(self.background.keys().copied())
            .collect();
        ids.into_iter().filter(|id| self.cancel(*id)).count()
    }

    /// Advance one tick and run every main-context job now due, in schedule
    /// order. Returns how many jobs ran.
    pub fn tick(&mut self) -> usize {
        self.current_tick = self.current_tick.saturating_add(1);
        let now = self.current_tick;
        let mut ran = 0;
        self.main.retain_mut(|task| {
            if task.due > now {
                return true;
            }
            (task.job)(&mut task.run);
            task.run.runs += 1;
            ran += 1;
            match task.period {
                Some(period) if !task.run.cancelled => {
                    task.due = now.saturating_add(period);
                    true
                }
                _ => {
                    trace!("{} finished after {} run(s)", task.run.id, task.run.runs);
                    false
                }
            }
        });
        ran
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Tasks still pending or running.
    pub fn len(&mut self) -> usize {
        self.background.retain(|_, t| !t.handle.is_finished());
        self.main.len() + self.background.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        for (_, task) in self.background.drain() {
            task.cancelled.store(true, Ordering::SeqCst);
            task.handle.abort();
        }
    }
}

fn ticks(n: u64) -> Duration {
    TICK * u32::try_from(n).unwrap_or(u32::MAX)
}

async fn run_background(id: TaskId, kind: TaskKind, mut job: Job, cancelled: Arc<AtomicBool>) {
    tokio::time::sleep(ticks(kind.delay())).await;
    let mut run = TaskRun::new(id);
    loop {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }
        job(&mut run);
        run.runs += 1;
        let Some(period) = kind.period() else { break };
        if run.cancelled {
            break;
        }
        tokio::time::sleep(ticks(period)).await;
    }
    trace!("{} finished after {} run(s)", id, run.runs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn main_tasks_run_in_schedule_order_when_due() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut sched = TaskScheduler::new();
        for (name, delay) in [("b", 2), ("a", 1), ("c", 2)] {
            let log = log.clone();
            sched
                .schedule(TaskKind::sync_later(delay), move |_| log.lock().unwrap().push(name))
                .unwrap();
        }
        assert_eq!(sched.tick(), 1);
        assert_eq!(sched.tick(), 2);
        assert_eq!(sched.tick(), 0);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert!(sched.is_empty());
    }

    #[test]
    fn repeating_task_cancels_itself() {
        let mut sched = TaskScheduler::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        sched
            .schedule(TaskKind::sync_timer(0, 2), move |run| {
                s.lock().unwrap().push(run.runs());
                if run.runs() == 2 {
                    run.cancel();
                }
            })
            .unwrap();
        for _ in 0..10 {
            sched.tick();
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert!(sched.is_empty());
    }

    #[test]
    fn zero_period_and_missing_runtime_are_errors() {
        let mut sched = TaskScheduler::new();
        assert!(matches!(
            sched.schedule(TaskKind::sync_timer(1, 0), |_| {}),
            Err(KitError::Configuration(_))
        ));
        assert!(matches!(
            sched.schedule(TaskKind::async_later(1), |_| {}),
            Err(KitError::NoRuntime)
        ));
    }

    #[test]
    fn cancel_removes_pending_main_task() {
        let mut sched = TaskScheduler::new();
        let id = sched.schedule(TaskKind::sync_later(5), |_| panic!("must not run")).unwrap();
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));
        for _ in 0..6 {
            sched.tick();
        }
    }

    #[test]
    fn huge_delays_and_periods_clamp_instead_of_overflowing() {
        let mut sched = TaskScheduler::new();
        sched.tick();
        let ran = Arc::new(Mutex::new(0u32));
        let r = ran.clone();
        sched
            .schedule(TaskKind::sync_later(u64::MAX), move |_| *r.lock().unwrap() += 1)
            .unwrap();
        let r = ran.clone();
        sched
            .schedule(TaskKind::sync_timer(0, u64::MAX), move |_| *r.lock().unwrap() += 10)
            .unwrap();
        for _ in 0..5 {
            sched.tick();
        }
        assert_eq!(*ran.lock().unwrap(), 10);
        assert_eq!(sched.len(), 2);
    }

    #[tokio::test]
    async fn background_once_runs_on_runtime() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sched = TaskScheduler::new();
        sched
            .schedule(TaskKind::async_later(1), move |run| {
                let _ = tx.send(run.runs());
            })
            .unwrap();
        let got = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timeout waiting for background task");
        assert_eq!(got, Some(0));
    }
}
