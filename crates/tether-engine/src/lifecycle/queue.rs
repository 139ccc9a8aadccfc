use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// Deferred action executed on the render thread.
pub type Command = Box<dyn FnOnce() + Send + 'static>;

/// FIFO of actions to run on the render thread before the next frame.
///
/// Any thread may enqueue. Only the render thread drains, at the top of every
/// loop iteration. Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct CommandQueue {
    pending: Arc<Mutex<VecDeque<Command>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action. Never blocks beyond the queue lock.
    pub fn enqueue<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pending.lock().push_back(Box::new(action));
    }

    /// Number of actions waiting to run.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Runs queued actions in order until the queue is empty.
    ///
    /// The lock is held only while popping, so an action may enqueue more
    /// actions; those run in the same drain. Returns the number executed.
    pub(crate) fn drain_all(&self) -> usize {
        let mut executed = 0;
        loop {
            let next = self.pending.lock().pop_front();
            let Some(action) = next else {
                break;
            };
            action();
            executed += 1;
        }

        if executed > 0 {
            log::trace!("ran {executed} queued command(s)");
        }
        executed
    }

    /// Drops every queued action without running it.
    pub(crate) fn discard(&self) -> usize {
        let dropped: Vec<Command> = self.pending.lock().drain(..).collect();
        dropped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn drains_in_fifo_order() {
        let queue = CommandQueue::new();
        let log = journal();
        for name in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            queue.enqueue(move || log.lock().push(name));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.drain_all(), 3);
        assert_eq!(*log.lock(), ["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn commands_may_enqueue_more_commands() {
        let queue = CommandQueue::new();
        let log = journal();
        {
            let inner_queue = queue.clone();
            let log = Arc::clone(&log);
            queue.enqueue(move || {
                log.lock().push("outer");
                let log = Arc::clone(&log);
                inner_queue.enqueue(move || log.lock().push("inner"));
            });
        }
        {
            let log = Arc::clone(&log);
            queue.enqueue(move || log.lock().push("second"));
        }

        assert_eq!(queue.drain_all(), 3);
        assert_eq!(*log.lock(), ["outer", "second", "inner"]);
    }

    #[test]
    fn discard_drops_without_running() {
        let queue = CommandQueue::new();
        let log = journal();
        {
            let log = Arc::clone(&log);
            queue.enqueue(move || log.lock().push("never"));
        }

        assert_eq!(queue.discard(), 1);
        assert_eq!(queue.drain_all(), 0);
        assert!(log.lock().is_empty());
    }
}
