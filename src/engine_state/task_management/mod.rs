//! # Task Management System
//!
//! Executes work on a pool of worker threads and hands the results back to
//! the thread that owns the [`TaskManager`].
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: distributes tasks and collects results
//! - `Task`: a unit of work, see [`task::Task`]
//! - `TaskChannel`: one worker thread with its task and result channels
//!
//! Each worker has a dedicated channel pair. Tasks are handed out round-robin
//! to workers with free capacity; when every worker is busy they wait in a
//! FIFO queue until a result comes back.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager sends them to available worker channels
//! 3. Workers process tasks and send back results
//! 4. Results are collected on the owning thread in `process_completed_tasks()`
//!
//! ## Example Usage
//! ```ignore
//! let mut task_manager = TaskManager::<u64>::new(4)?;
//! task_manager.publish_task(Box::new(|| 6 * 7));
//!
//! // In the update loop:
//! for result in task_manager.process_completed_tasks() {
//!     // ...
//! }
//! ```

pub mod task;

use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{info, warn};
use task::Task;

type BoxedTask<R> = Box<dyn Task<R>>;

/// A communication channel between the owning thread and one worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tasks sent but not yet answered
/// - `worker`: Handle to the worker thread, joined on shutdown
struct TaskChannel<R> {
    task_sender: Sender<BoxedTask<R>>,
    result_receiver: Receiver<R>,
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// Dropping the manager closes every task channel and joins the workers,
/// after they finish the task they are currently running.
pub struct TaskManager<R> {
    channels: Vec<TaskChannel<R>>,
    queued_tasks: VecDeque<BoxedTask<R>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Keeping this at 1 leaves unstarted work in the shared queue, where any
/// worker that frees up can pick it.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl<R: Send + 'static> TaskManager<R> {
    /// Creates a new `TaskManager` with `num_workers` worker threads.
    ///
    /// # Errors
    /// Returns the OS error if a worker thread cannot be spawned.
    pub fn new(num_workers: usize) -> io::Result<Self> {
        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<BoxedTask<R>>();
            let (result_tx, result_rx) = channel::<R>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    if result_tx.send(task.process()).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("chunk-worker-{index}"))
                .spawn(task_closure)?;

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                worker,
            });
        }

        info!(
            "Spawned {} workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        Ok(TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        })
    }
}

impl<R> TaskManager<R> {
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of tasks published but not yet collected.
    pub fn pending_count(&self) -> usize {
        self.queued_tasks.len()
            + self
                .channels
                .iter()
                .map(|channel| channel.num_tasks_in_flight)
                .sum::<usize>()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was sent
    /// - `Err(task)` if the worker is gone, handing the task back for requeueing
    fn try_send_task(&mut self, task: BoxedTask<R>, channel_idx: usize) -> Result<(), BoxedTask<R>> {
        let channel = &mut self.channels[channel_idx];
        match channel.task_sender.send(task) {
            Ok(()) => {
                channel.num_tasks_in_flight += 1;
                Ok(())
            }
            Err(err) => Err(err.0),
        }
    }

    /// Finds a worker with free capacity, round-robin from the last one used.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|offset| (self.current_channel + offset) % count)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was sent to a worker right away
    /// - `false` if it was queued because every worker is busy
    pub fn publish_task(&mut self, task: BoxedTask<R>) -> bool {
        let Some(channel_idx) = self.find_available_channel() else {
            self.queued_tasks.push_back(task);
            return false;
        };

        match self.try_send_task(task, channel_idx) {
            Ok(()) => {
                self.current_channel = (channel_idx + 1) % self.channels.len();
                true
            }
            Err(task) => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Sends queued tasks, oldest first, to workers that have capacity.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(()) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // worker disconnected, keep the task and stop
                    self.queued_tasks.push_front(task);
                    return;
                }
            }
        }
    }

    /// Collects every result that is ready, without blocking, then refills
    /// the freed workers from the queue.
    pub fn process_completed_tasks(&mut self) -> Vec<R> {
        let mut results = Vec::new();
        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                results.push(result);
            }
        }
        self.process_queued_tasks();
        results
    }

    /// Blocks until every published task has finished and returns all
    /// results not collected yet.
    ///
    /// Tasks owned by a worker that died are dropped with a warning.
    pub fn wait_for_all(&mut self) -> Vec<R> {
        let mut results = Vec::new();
        loop {
            self.process_queued_tasks();
            let Some(idx) = self
                .channels
                .iter()
                .position(|channel| channel.num_tasks_in_flight > 0)
            else {
                break;
            };

            let channel = &mut self.channels[idx];
            match channel.result_receiver.recv() {
                Ok(result) => {
                    channel.num_tasks_in_flight -= 1;
                    results.push(result);
                }
                Err(_) => {
                    warn!(
                        "Worker {} disconnected with {} tasks in flight",
                        idx, channel.num_tasks_in_flight
                    );
                    channel.num_tasks_in_flight = 0;
                }
            }
        }

        if !self.queued_tasks.is_empty() {
            warn!(
                "Dropping {} queued tasks, no worker accepts them",
                self.queued_tasks.len()
            );
            self.queued_tasks.clear();
        }
        results
    }
}

impl<R> Drop for TaskManager<R> {
    fn drop(&mut self) {
        self.queued_tasks.clear();
        for channel in self.channels.drain(..) {
            let TaskChannel {
                task_sender,
                result_receiver,
                worker,
                ..
            } = channel;
            drop(task_sender);
            drop(result_receiver);
            if worker.join().is_err() {
                warn!("Worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_wait_for_all_returns_every_result() {
        let mut manager = TaskManager::<u64>::new(3).unwrap();
        for i in 0..20u64 {
            manager.publish_task(Box::new(move || i * i));
        }

        let mut results = manager.wait_for_all();
        results.sort_unstable();
        assert_eq!(results, (0..20u64).map(|i| i * i).collect::<Vec<_>>());
        assert_eq!(manager.pending_count(), 0);
    }

    #[test]
    fn test_publish_queues_when_workers_are_busy() {
        let mut manager = TaskManager::<usize>::new(1).unwrap();
        assert!(manager.publish_task(Box::new(|| 1)));
        assert!(!manager.publish_task(Box::new(|| 2)));
        assert_eq!(manager.pending_count(), 2);

        let mut results = manager.wait_for_all();
        results.sort_unstable();
        assert_eq!(results, vec![1, 2]);
    }

    #[test]
    fn test_process_completed_tasks_is_non_blocking() {
        let mut manager = TaskManager::<u32>::new(2).unwrap();
        for i in 0..6 {
            manager.publish_task(Box::new(move || i));
        }

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut collected = Vec::new();
        while collected.len() < 6 && Instant::now() < deadline {
            collected.extend(manager.process_completed_tasks());
            thread::sleep(Duration::from_millis(1));
        }

        collected.sort_unstable();
        assert_eq!(collected, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_drop_joins_workers() {
        let mut manager = TaskManager::<()>::new(2).unwrap();
        for _ in 0..4 {
            manager.publish_task(Box::new(|| thread::sleep(Duration::from_millis(5))));
        }
        drop(manager);
    }

    #[test]
    fn test_zero_workers_queues_everything() {
        let mut manager = TaskManager::<u8>::new(0).unwrap();
        assert!(!manager.publish_task(Box::new(|| 1)));
        assert!(manager.process_completed_tasks().is_empty());
        assert!(manager.wait_for_all().is_empty());
        assert_eq!(manager.pending_count(), 0);
    }
}
