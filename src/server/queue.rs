//! Hand-off queue between acceptor threads and worker threads.
//!
//! A bounded-wait MPMC queue: `push` appends and wakes one waiter,
//! `pop` waits at most 100 ms for an element and gives up early when
//! the process-wide shutdown flag is set and the queue is empty. No
//! fairness guarantees, no priorities.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::shutdown;

const POP_WAIT: Duration = Duration::from_millis(100);

pub struct HandoffQueue<T> {
    inner: Mutex<VecDeque<T>>,
    ready: Condvar,
}

impl<T> Default for HandoffQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandoffQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    pub fn push(&self, value: T) {
        let mut queue = self.inner.lock().unwrap();
        queue.push_back(value);
        self.ready.notify_one();
    }

    /// Take the next element, or `None` after the timed wait expires
    /// or shutdown is requested while the queue is empty.
    pub fn pop(&self) -> Option<T> {
        let queue = self.inner.lock().unwrap();
        let (mut queue, _timeout) = self
            .ready
            .wait_timeout_while(queue, POP_WAIT, |q| {
                q.is_empty() && !shutdown::requested()
            })
            .unwrap();
        queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_push_then_pop() {
        let queue = HandoffQueue::new();
        queue.push(7);
        queue.push(8);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(7));
        assert_eq!(queue.pop(), Some(8));
    }

    #[test]
    fn test_pop_times_out_empty() {
        let queue: HandoffQueue<i32> = HandoffQueue::new();
        let start = Instant::now();
        assert_eq!(queue.pop(), None);
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_pop_wakes_on_push_from_other_thread() {
        let queue = Arc::new(HandoffQueue::new());
        let producer = queue.clone();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.push(42);
        });
        // Retry loop mirrors how workers drive the queue.
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut got = None;
        while got.is_none() && Instant::now() < deadline {
            got = queue.pop();
        }
        t.join().unwrap();
        assert_eq!(got, Some(42));
    }

    #[test]
    fn test_pop_returns_quickly_after_shutdown() {
        let queue: HandoffQueue<i32> = HandoffQueue::new();
        shutdown::trigger();
        let start = Instant::now();
        assert_eq!(queue.pop(), None);
        assert!(start.elapsed() <= Duration::from_millis(120));
        shutdown::reset();
    }
}
