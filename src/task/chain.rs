//! Sequential job chains.
//!
//! A chain is a queue of one-shot jobs plus an optional final job, all run in
//! one [`TaskContext`]. Each job runs on its own scheduler run, in the order it
//! was added, and the final job runs on the run after the last queued job.
use log::{debug, trace};
use std::collections::VecDeque;

use super::{Schedule, TaskContext, TaskId, TaskKind, TaskScheduler};
use crate::error::KitResult;

type ChainJob = Box<dyn FnOnce() + Send>;

pub struct TaskChain {
    context: TaskContext,
    jobs: VecDeque<ChainJob>,
    final_job: Option<ChainJob>,
}

impl TaskChain {
    pub fn new(context: TaskContext) -> Self {
        Self {
            context,
            jobs: VecDeque::new(),
            final_job: None,
        }
    }

    /// Chain on the main thread, one job per tick.
    pub fn sync() -> Self {
        Self::new(TaskContext::Main)
    }

    /// Chain on the tokio runtime, one job per tick.
    pub fn background() -> Self {
        Self::new(TaskContext::Background)
    }

    pub fn add_task(mut self, job: impl FnOnce() + Send + 'static) -> Self {
        self.jobs.push_back(Box::new(job));
        self
    }

    /// Job to run once every queued job has finished. Setting it again
    /// replaces the previous one.
    pub fn final_task(mut self, job: impl FnOnce() + Send + 'static) -> Self {
        self.final_job = Some(Box::new(job));
        self
    }

    pub fn context(&self) -> TaskContext {
        self.context
    }

    /// Queued jobs, not counting the final job.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Hand the chain to `scheduler`. The returned id cancels whatever part
    /// of the chain has not run yet, final job included.
    pub fn execute(self, scheduler: &mut TaskScheduler) -> KitResult<TaskId> {
        let Self {
            context,
            mut jobs,
            mut final_job,
        } = self;
        let kind = TaskKind {
            context,
            schedule: Schedule::Repeating {
                delay: 0,
                period: 1,
            },
        };
        debug!("starting chain of {} job(s) in {:?} context", jobs.len(), context);
        scheduler.schedule(kind, move |run| {
            if let Some(job) = jobs.pop_front() {
                job();
                return;
            }
            if let Some(job) = final_job.take() {
                job();
            }
            trace!("{} chain finished", run.id());
            run.cancel();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn push(log: &Log, name: &'static str) -> impl FnOnce() + Send + 'static {
        let log = log.clone();
        move || log.lock().unwrap().push(name)
    }

    #[test]
    fn sync_chain_runs_one_job_per_tick_then_final() {
        let log = Log::default();
        let mut sched = TaskScheduler::new();
        let chain = TaskChain::sync()
            .final_task(push(&log, "done"))
            .add_task(push(&log, "first"))
            .add_task(push(&log, "second"));
        assert_eq!(chain.len(), 2);
        chain.execute(&mut sched).unwrap();

        assert_eq!(sched.tick(), 1);
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
        sched.tick();
        sched.tick();
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "done"]);
        assert!(sched.is_empty());
        assert_eq!(sched.tick(), 0);
    }

    #[test]
    fn empty_chain_finishes_without_running_anything() {
        let mut sched = TaskScheduler::new();
        TaskChain::sync().execute(&mut sched).unwrap();
        assert_eq!(sched.tick(), 1);
        assert!(sched.is_empty());
    }

    #[test]
    fn cancelling_a_chain_skips_the_rest() {
        let log = Log::default();
        let mut sched = TaskScheduler::new();
        let id = TaskChain::sync()
            .add_task(push(&log, "a"))
            .add_task(push(&log, "b"))
            .final_task(push(&log, "done"))
            .execute(&mut sched)
            .unwrap();
        sched.tick();
        assert!(sched.cancel(id));
        for _ in 0..4 {
            sched.tick();
        }
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn background_chain_needs_runtime() {
        let mut sched = TaskScheduler::new();
        let err = TaskChain::background().add_task(|| {}).execute(&mut sched);
        assert!(matches!(err, Err(crate::error::KitError::NoRuntime)));
    }
}
