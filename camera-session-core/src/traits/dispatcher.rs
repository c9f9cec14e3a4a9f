use std::time::Duration;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Single serialized execution context.
///
/// Tasks run one at a time in the order they were posted. Delayed tasks run
/// no earlier than their delay, ordered by deadline.
pub trait UiDispatcher: Send + Sync {
    fn post(&self, task: Task);

    fn post_delayed(&self, delay: Duration, task: Task);
}
