//! # Task System Core Trait
//!
//! A [`Task`] is a self-contained unit of work executed on a worker thread.
//! It owns everything it needs and hands a value of type `R` back to the
//! thread that published it.
//!
//! ## Task Lifecycle
//! 1. A task is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The result travels back over the worker's result channel
//! 4. `TaskManager::process_completed_tasks()` hands it to the owner

/// A unit of work that can be executed on a background worker.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should be coarse-grained to amortize scheduling overhead
/// - Should own its data rather than borrow it
pub trait Task<R>: Send {
    /// Performs the work. Runs on a worker thread and consumes the task.
    fn process(self: Box<Self>) -> R;
}

impl<R, F> Task<R> for F
where
    F: FnOnce() -> R + Send,
{
    fn process(self: Box<Self>) -> R {
        (*self)()
    }
}
