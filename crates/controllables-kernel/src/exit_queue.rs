//! Exit queue with consume-but-keep-last semantics.
//!
//! Exits are handed out oldest first. The last remaining exit is never removed by
//! consumption: it answers every further call until more exits are added or the
//! queue is cleared.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;

use crate::exit::{Exit, ExitId, ExitOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("no exits have been added")]
    Empty,
    #[error("exit queue lock poisoned")]
    Poisoned,
}

struct Slots<R, F> {
    exits: VecDeque<Arc<Exit<R, F>>>,
    next_id: u64,
}

/// Ordered exits of one controlled method.
pub struct ExitQueue<R, F> {
    slots: Mutex<Slots<R, F>>,
}

impl<R, F> Default for ExitQueue<R, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, F> ExitQueue<R, F> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                exits: VecDeque::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Slots<R, F>>, QueueError> {
        self.slots.lock().map_err(|_| QueueError::Poisoned)
    }

    /// Appends an exit to the tail and returns its id.
    pub fn push(&self, outcome: ExitOutcome<R, F>, delay: Duration) -> Result<ExitId, QueueError> {
        let mut slots = self.lock()?;
        let id = ExitId(slots.next_id);
        slots.next_id += 1;
        slots.exits.push_back(Arc::new(Exit::new(id, outcome, delay)));
        Ok(id)
    }

    /// Removes every exit; returns how many were dropped.
    pub fn clear(&self) -> Result<usize, QueueError> {
        let mut slots = self.lock()?;
        let removed = slots.exits.len();
        slots.exits.clear();
        Ok(removed)
    }

    /// Takes the oldest exit, leaving it in place when it is the only one.
    pub fn next_exit(&self) -> Result<Arc<Exit<R, F>>, QueueError> {
        self.consume_with(|exit| Ok::<_, QueueError>(Arc::clone(exit)))
    }

    /// Hands the oldest exit to `record` and consumes it only once `record` succeeds.
    /// The queue stays locked meanwhile, so consumption order and record order agree.
    pub fn consume_with<T, E>(
        &self,
        record: impl FnOnce(&Arc<Exit<R, F>>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<QueueError>,
    {
        let mut slots = self.lock()?;
        let exit = slots.exits.front().cloned().ok_or(QueueError::Empty)?;
        let recorded = record(&exit)?;
        if slots.exits.len() > 1 {
            slots.exits.pop_front();
        }
        Ok(recorded)
    }

    pub fn len(&self) -> Result<usize, QueueError> {
        Ok(self.lock()?.exits.len())
    }

    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.lock()?.exits.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::fault::Throws0;

    fn queue_of(values: &[u32]) -> ExitQueue<u32, Throws0> {
        let queue = ExitQueue::new();
        for v in values {
            queue.push(ExitOutcome::Return(*v), Duration::ZERO).unwrap();
        }
        queue
    }

    fn next_value(queue: &ExitQueue<u32, Throws0>) -> u32 {
        *queue.next_exit().unwrap().return_value().unwrap()
    }

    #[test]
    fn empty_queue_has_no_next_exit() {
        let queue: ExitQueue<u32, Throws0> = ExitQueue::new();
        assert_eq!(queue.next_exit().unwrap_err(), QueueError::Empty);
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn single_exit_is_sticky() {
        let queue = queue_of(&[7]);
        let first = queue.next_exit().unwrap();
        for _ in 0..5 {
            assert!(Arc::ptr_eq(&first, &queue.next_exit().unwrap()));
        }
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[test]
    fn fifo_then_sticky() {
        let queue = queue_of(&[1, 2, 3]);
        assert_eq!(next_value(&queue), 1);
        assert_eq!(next_value(&queue), 2);
        assert_eq!(next_value(&queue), 3);
        assert_eq!(next_value(&queue), 3);
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[test]
    fn adding_after_sticky_resumes_fifo() {
        let queue = queue_of(&[1]);
        assert_eq!(next_value(&queue), 1);
        queue.push(ExitOutcome::Return(2), Duration::ZERO).unwrap();
        // the old sticky exit is consumed first, then the new one takes over
        assert_eq!(next_value(&queue), 1);
        assert_eq!(next_value(&queue), 2);
        assert_eq!(next_value(&queue), 2);
    }

    #[test]
    fn clear_empties_the_queue() {
        let queue = queue_of(&[1, 2]);
        assert_eq!(queue.clear().unwrap(), 2);
        assert_eq!(queue.next_exit().unwrap_err(), QueueError::Empty);
        queue.push(ExitOutcome::Return(9), Duration::ZERO).unwrap();
        assert_eq!(next_value(&queue), 9);
    }

    #[test]
    fn ids_increase_in_scripting_order() {
        let queue: ExitQueue<u32, Throws0> = ExitQueue::new();
        let a = queue.push(ExitOutcome::Return(1), Duration::ZERO).unwrap();
        queue.clear().unwrap();
        let b = queue.push(ExitOutcome::Return(2), Duration::ZERO).unwrap();
        assert!(a < b);
    }

    #[test]
    fn failed_record_leaves_the_exit_queued() {
        let queue = queue_of(&[1, 2]);
        let refused = queue.consume_with(|_| Err::<(), _>(QueueError::Poisoned));
        assert_eq!(refused, Err(QueueError::Poisoned));
        assert_eq!(queue.len().unwrap(), 2);
        assert_eq!(next_value(&queue), 1);
        assert_eq!(next_value(&queue), 2);
    }

    proptest! {
        #[test]
        fn drains_in_order_then_repeats_last(values in proptest::collection::vec(any::<u32>(), 1..20), extra in 1usize..5) {
            let queue = queue_of(&values);
            for v in &values {
                prop_assert_eq!(next_value(&queue), *v);
            }
            let last = *values.last().unwrap();
            for _ in 0..extra {
                prop_assert_eq!(next_value(&queue), last);
            }
            prop_assert_eq!(queue.len().unwrap(), 1);
        }
    }
}
