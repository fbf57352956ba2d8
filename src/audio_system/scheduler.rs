/// Deferred execution of delayed cues

use std::thread;
use std::time::Duration;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed
    fn schedule(&self, delay: Duration, task: Task);
}

/// Sleeps on a short-lived thread per task
#[derive(Debug, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        if delay.is_zero() {
            task();
            return;
        }

        let spawned = thread::Builder::new()
            .name("gemplay-cue-delay".to_string())
            .spawn(move || {
                thread::sleep(delay);
                task();
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to schedule delayed cue: {}", e);
        }
    }
}

/// Runs tasks immediately, ignoring the delay
#[derive(Debug, Default)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    fn schedule(&self, _delay: Duration, task: Task) {
        task();
    }
}
