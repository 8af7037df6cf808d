// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/frigate-notify

//! Task scheduler for timed operations

use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error};

struct ScheduledTask {
    name: String,
    interval: Duration,
    handle: JoinHandle<()>,
}

/// Runs periodic background jobs until shutdown
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Runs `task` every `interval`, first after one full interval. A run in
    /// progress is finished before the shutdown signal is observed.
    pub fn add_task<F, Fut>(
        &mut self,
        name: &str,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
        task: F,
    ) where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task_name = name.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => task().await,
                    _ = shutdown.recv() => break,
                }
            }
            debug!("Scheduled task '{}' stopped", task_name);
        });

        self.tasks.push(ScheduledTask {
            name: name.to_string(),
            interval,
            handle,
        });
        debug!("Scheduled task '{}' with interval {:?}", name, interval);
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn interval(&self, name: &str) -> Option<Duration> {
        self.tasks.iter().find(|t| t.name == name).map(|t| t.interval)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every task to observe shutdown
    pub async fn join_all(&mut self) {
        for task in self.tasks.drain(..) {
            if let Err(e) = task.handle.await {
                error!("Scheduled task '{}' ended abnormally: {}", task.name, e);
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_task_repeats_until_shutdown() {
        let (tx, _) = broadcast::channel(1);
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();

        let counter = runs.clone();
        scheduler.add_task("count", Duration::from_millis(20), tx.subscribe(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(scheduler.task_names(), vec!["count"]);
        assert_eq!(scheduler.interval("count"), Some(Duration::from_millis(20)));

        tokio::time::sleep(Duration::from_millis(110)).await;
        tx.send(()).unwrap();
        scheduler.join_all().await;

        let seen = runs.load(Ordering::SeqCst);
        assert!(seen >= 2, "expected repeated runs, got {}", seen);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), seen);
        assert!(scheduler.is_empty());
    }

    #[tokio::test]
    async fn test_first_run_waits_one_interval() {
        let (tx, _) = broadcast::channel(1);
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();

        let counter = runs.clone();
        scheduler.add_task("slow", Duration::from_secs(3600), tx.subscribe(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();
        scheduler.join_all().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
