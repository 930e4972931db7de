//! Concurrency tests for the task manager.
//!
//! Creates race with each other and with a running due-task scanner; the
//! collection must end up complete with unique ids and nothing may deadlock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::{NaiveDate, TimeDelta};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use taskbell::tasks::notification_channel;
use taskbell::{DueScanner, ManualClock, Task, TaskManager, TaskPatch, TaskStore};
use tokio_util::sync::CancellationToken;

const WRITERS: usize = 32;

fn manual_clock() -> Arc<ManualClock> {
    let now = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    Arc::new(ManualClock::new(now))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_while_scanning_keep_every_task() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path().join("tasks.json"));
    TaskManager::open(store.clone())
        .unwrap()
        .create(Task::new("seed").with_due_date("2024-01-01"))
        .unwrap();

    let clock = manual_clock();
    let manager = Arc::new(TaskManager::open(store).unwrap().with_clock(clock.clone()));
    let prior = manager.read().unwrap().len();

    let cancel = CancellationToken::new();
    let (tx, mut rx) = notification_channel(256);
    let scanner = DueScanner::new(Arc::clone(&manager), tx, cancel.clone())
        .with_tick_interval(Duration::from_millis(5))
        .spawn();

    let mut writers = Vec::with_capacity(WRITERS);
    for i in 0..WRITERS {
        let manager = Arc::clone(&manager);
        writers.push(tokio::task::spawn_blocking(move || {
            manager
                .create(Task::new(format!("task-{i}")).with_due_date("2024-05-31"))
                .unwrap()
        }));
    }

    let created = tokio::time::timeout(Duration::from_secs(10), async {
        let mut created = Vec::with_capacity(WRITERS);
        for writer in writers {
            created.push(writer.await.unwrap());
        }
        created
    })
    .await
    .expect("creates should not deadlock");

    let tasks = manager.read().unwrap();
    assert_eq!(tasks.len(), WRITERS + prior);
    let ids: HashSet<_> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids.len(), tasks.len(), "ids must be unique");
    assert!(created.iter().all(|t| ids.contains(t.id.as_str())));

    // Every task is overdue, so each one is emitted exactly once.
    let mut seen = HashSet::new();
    tokio::time::timeout(Duration::from_secs(10), async {
        while seen.len() < tasks.len() {
            let task = rx.recv().await.expect("scanner closed early");
            assert!(seen.insert(task.id.clone()), "duplicate emission");
        }
    })
    .await
    .expect("every overdue task should be emitted");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), scanner)
        .await
        .expect("scanner should stop after cancel")
        .unwrap()
        .unwrap();

    // The file reflects the final collection, notifications included.
    let reopened = TaskManager::open(TaskStore::new(dir.path().join("tasks.json"))).unwrap();
    let persisted = reopened.read().unwrap();
    assert_eq!(persisted.len(), tasks.len());
    assert!(persisted.iter().all(Task::was_notified));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_operations_do_not_deadlock() {
    let dir = tempfile::tempdir().unwrap();
    let clock = manual_clock();
    let manager = Arc::new(
        TaskManager::open(TaskStore::new(dir.path().join("tasks.json")))
            .unwrap()
            .with_clock(clock.clone())
            .with_cooldown(TimeDelta::seconds(1)),
    );

    let cancel = CancellationToken::new();
    let (tx, mut rx) = notification_channel(4);
    let scanner = DueScanner::new(Arc::clone(&manager), tx, cancel.clone())
        .with_tick_interval(Duration::from_millis(2))
        .spawn();
    let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

    let mut workers = Vec::new();
    for i in 0..8 {
        let manager = Arc::clone(&manager);
        let clock = clock.clone();
        workers.push(tokio::task::spawn_blocking(move || {
            for round in 0..10 {
                let task = manager
                    .create(Task::new(format!("w{i}-r{round}")).with_due_date("2024-05-01"))
                    .unwrap();
                manager
                    .update(TaskPatch::new(task.id.clone()).name(format!("w{i}-r{round}-renamed")))
                    .unwrap();
                clock.advance(TimeDelta::seconds(2));
                if round % 2 == 0 {
                    assert!(manager.delete(&task.id).unwrap());
                }
                let _ = manager.read().unwrap();
            }
        }));
    }

    tokio::time::timeout(Duration::from_secs(20), async {
        for worker in workers {
            worker.await.unwrap();
        }
    })
    .await
    .expect("mixed operations should not deadlock");

    let tasks = manager.read().unwrap();
    assert_eq!(tasks.len(), 8 * 5);
    assert!(tasks.iter().all(|t| t.name.ends_with("-renamed")));

    cancel.cancel();
    scanner.await.unwrap().unwrap();
    drain.await.unwrap();
}
