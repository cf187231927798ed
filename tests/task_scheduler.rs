use plugkit::task::{Schedule, TaskChain, TaskContext, TaskKind, TaskScheduler};
use plugkit::KitError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[test]
fn kinds_are_plain_data() {
    let kind = TaskKind::async_timer(5, 20);
    assert_eq!(kind.context, TaskContext::Background);
    assert_eq!(kind.schedule, Schedule::Repeating { delay: 5, period: 20 });
    let json = serde_json::to_string(&TaskKind::sync_later(3)).unwrap();
    let back: TaskKind = serde_json::from_str(&json).unwrap();
    assert_eq!(back, TaskKind::sync_later(3));
}

#[test]
fn zero_delay_runs_on_next_tick() {
    let mut sched = TaskScheduler::new();
    let ran = Arc::new(AtomicU64::new(0));
    let r = ran.clone();
    sched
        .schedule(TaskKind::sync_later(0), move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(sched.tick(), 1);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn repeating_timer_fires_every_period() {
    let mut sched = TaskScheduler::new();
    let fired_at = Arc::new(Mutex::new(Vec::new()));
    let f = fired_at.clone();
    let tick = Arc::new(AtomicU64::new(0));
    let t = tick.clone();
    sched
        .schedule(TaskKind::sync_timer(2, 3), move |_| {
            f.lock().unwrap().push(t.load(Ordering::SeqCst));
        })
        .unwrap();
    for i in 1..=11 {
        tick.store(i, Ordering::SeqCst);
        sched.tick();
    }
    assert_eq!(*fired_at.lock().unwrap(), vec![2, 5, 8, 11]);
}

#[test]
fn cancel_all_clears_main_tasks() {
    let mut sched = TaskScheduler::new();
    for delay in 1..=4 {
        sched.schedule(TaskKind::sync_later(delay), |_| {}).unwrap();
    }
    sched.schedule(TaskKind::sync_timer(1, 1), |_| {}).unwrap();
    assert_eq!(sched.len(), 5);
    assert_eq!(sched.cancel_all(), 5);
    assert!(sched.is_empty());
    assert_eq!(sched.tick(), 0);
}

#[test]
fn background_without_runtime_fails() {
    let mut sched = TaskScheduler::new();
    let err = sched.schedule(TaskKind::async_timer(0, 1), |_| {}).unwrap_err();
    assert!(matches!(err, KitError::NoRuntime));
}

#[tokio::test]
async fn background_timer_stops_when_it_cancels_itself() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut sched = TaskScheduler::new();
    sched
        .schedule(TaskKind::async_timer(0, 1), move |run| {
            let _ = tx.send(run.runs());
            if run.runs() == 2 {
                run.cancel();
            }
        })
        .unwrap();

    let mut seen = Vec::new();
    while let Ok(Some(n)) = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
        seen.push(n);
    }
    assert_eq!(seen, vec![0, 1, 2]);
    assert!(sched.is_empty());
}

#[tokio::test]
async fn cancelled_background_task_stops_running() {
    let count = Arc::new(AtomicU64::new(0));
    let c = count.clone();
    let mut sched = TaskScheduler::new();
    let id = sched
        .schedule(TaskKind::async_timer(0, 1), move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(sched.cancel(id));
    let after_cancel = count.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(count.load(Ordering::SeqCst), after_cancel);
    assert!(after_cancel >= 1);
}

#[tokio::test]
async fn background_chain_runs_in_order_and_final_job_last() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut sched = TaskScheduler::new();
    let mut chain = TaskChain::background();
    for step in 1..=3 {
        let tx = tx.clone();
        chain = chain.add_task(move || {
            let _ = tx.send(step);
        });
    }
    chain
        .final_task(move || {
            let _ = tx.send(0);
        })
        .execute(&mut sched)
        .unwrap();

    let mut seen = Vec::new();
    while let Ok(Some(n)) = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
        seen.push(n);
    }
    assert_eq!(seen, vec![1, 2, 3, 0]);
}
