//! Transmit ring queue
//!
//! A fixed array of frames indexed by a head (next write) and a tail (next
//! read). One slot is always left empty so that `head == tail` can only
//! mean "empty": a queue of `N` slots holds at most `N - 1` frames.

use slcan_protocol::CanFrame;

/// Ring slots backing the adapter's transmit queue
pub const TX_QUEUE_CAPACITY: usize = 28;

/// The queue already holds `N - 1` frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

/// Bounded FIFO of frames awaiting the TX mailbox
#[derive(Debug, Clone)]
pub struct TxQueue<const N: usize = TX_QUEUE_CAPACITY> {
    slots: [CanFrame; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> Default for TxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TxQueue<N> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            slots: [CanFrame::default(); N],
            head: 0,
            tail: 0,
        }
    }

    /// Most frames the queue can hold at once
    pub const fn usable_capacity() -> usize {
        N - 1
    }

    /// Append a frame (copied by value)
    ///
    /// Fails without touching the queue when it is full.
    pub fn push(&mut self, frame: CanFrame) -> Result<(), QueueFull> {
        let next = (self.head + 1) % N;
        if next == self.tail {
            return Err(QueueFull);
        }

        self.slots[self.head] = frame;
        self.head = next;
        Ok(())
    }

    /// Oldest queued frame, without removing it
    pub fn peek(&self) -> Option<&CanFrame> {
        if self.is_empty() {
            None
        } else {
            Some(&self.slots[self.tail])
        }
    }

    /// Remove and return the oldest queued frame
    pub fn pop(&mut self) -> Option<CanFrame> {
        if self.is_empty() {
            return None;
        }

        let frame = self.slots[self.tail];
        self.tail = (self.tail + 1) % N;
        Some(frame)
    }

    /// Number of queued frames
    pub fn len(&self) -> usize {
        (self.head + N - self.tail) % N
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Check if another push would fail
    pub fn is_full(&self) -> bool {
        (self.head + 1) % N == self.tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use slcan_protocol::Id;

    fn frame(n: u16) -> CanFrame {
        CanFrame::data_frame(Id::Standard(n & 0x7FF), &[n as u8]).unwrap()
    }

    #[test]
    fn test_new_queue_is_empty() {
        let mut queue: TxQueue = TxQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.pop(), None);
        assert_eq!(TxQueue::<TX_QUEUE_CAPACITY>::usable_capacity(), 27);
    }

    #[test]
    fn test_holds_exactly_n_minus_one() {
        let mut queue: TxQueue = TxQueue::new();
        for n in 0..27 {
            assert_eq!(queue.push(frame(n)), Ok(()));
        }
        assert!(queue.is_full());
        assert_eq!(queue.len(), 27);

        assert_eq!(queue.push(frame(27)), Err(QueueFull));
        assert_eq!(queue.len(), 27);
    }

    #[test]
    fn test_rejected_push_leaves_contents() {
        let mut queue: TxQueue<3> = TxQueue::new();
        queue.push(frame(1)).unwrap();
        queue.push(frame(2)).unwrap();
        assert_eq!(queue.push(frame(3)), Err(QueueFull));

        assert_eq!(queue.pop(), Some(frame(1)));
        assert_eq!(queue.pop(), Some(frame(2)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_fifo_across_wrap() {
        let mut queue: TxQueue<4> = TxQueue::new();
        for round in 0..10u16 {
            queue.push(frame(round * 2)).unwrap();
            queue.push(frame(round * 2 + 1)).unwrap();
            assert_eq!(queue.peek(), Some(&frame(round * 2)));
            assert_eq!(queue.pop(), Some(frame(round * 2)));
            assert_eq!(queue.pop(), Some(frame(round * 2 + 1)));
            assert!(queue.is_empty());
        }
    }

    proptest! {
        #[test]
        fn queue_matches_bounded_fifo(ops in prop::collection::vec(any::<Option<u16>>(), 0..200)) {
            let mut queue: TxQueue<5> = TxQueue::new();
            let mut model = std::collections::VecDeque::new();

            for op in ops {
                match op {
                    Some(n) => {
                        let result = queue.push(frame(n));
                        if model.len() < 4 {
                            prop_assert_eq!(result, Ok(()));
                            model.push_back(frame(n));
                        } else {
                            prop_assert_eq!(result, Err(QueueFull));
                        }
                    }
                    None => prop_assert_eq!(queue.pop(), model.pop_front()),
                }
                prop_assert_eq!(queue.len(), model.len());
                prop_assert!(queue.len() <= 4);
            }
        }
    }
}
