//! Fixed-capacity ring buffer used as a breadth-first frontier.

/// First-in first-out queue that never grows past its configured capacity.
///
/// Storage is reserved once and reused across searches: [`BoundedQueue::clear`]
/// only rewinds the cursors. A push into a full queue is refused and reported
/// through its return value; the stored values stay untouched.
#[derive(Clone, Debug)]
pub struct BoundedQueue<T> {
    slots: Vec<T>,
    capacity: usize,
    head: usize,
    len: usize,
}

impl<T: Copy> BoundedQueue<T> {
    /// Creates an empty queue able to hold `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            len: 0,
        }
    }

    /// Appends a value at the tail, returning `false` when the queue is full.
    #[must_use]
    pub fn push(&mut self, value: T) -> bool {
        if self.len == self.capacity {
            return false;
        }

        let tail = (self.head + self.len) % self.capacity;
        if tail < self.slots.len() {
            self.slots[tail] = value;
        } else {
            self.slots.push(value);
        }
        self.len += 1;
        true
    }

    /// Removes and returns the value at the head.
    pub fn pop(&mut self) -> Option<T> {
        let value = self.peek()?;
        self.head = (self.head + 1) % self.capacity;
        self.len -= 1;
        Some(value)
    }

    /// Returns the value at the head without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.slots.get(self.head).copied()
    }

    /// Forgets every queued value in constant time.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Number of queued values.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Reports whether the queue holds no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reports whether another push would be refused.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Maximum number of values the queue can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::BoundedQueue;
    use crate::{BoardSize, Direction, Location};

    #[test]
    fn pops_in_push_order_up_to_capacity() {
        let mut queue = BoundedQueue::with_capacity(5);
        for value in 10..15_u16 {
            assert!(queue.push(value));
        }
        assert!(queue.is_full());

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![10, 11, 12, 13, 14]);
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn push_into_full_queue_is_refused_without_side_effects() {
        let mut queue = BoundedQueue::with_capacity(3);
        assert!(queue.push(1_u16));
        assert!(queue.push(2));
        assert!(queue.push(3));

        assert!(!queue.push(4), "fourth push must report failure");
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek(), Some(1));

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![1, 2, 3]);
    }

    #[test]
    fn wraps_around_the_ring() {
        let mut queue = BoundedQueue::with_capacity(3);
        assert!(queue.push(1_u16));
        assert!(queue.push(2));
        assert_eq!(queue.pop(), Some(1));
        assert!(queue.push(3));
        assert!(queue.push(4));
        assert!(!queue.push(5));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), Some(4));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn clear_rewinds_without_losing_capacity() {
        let mut queue = BoundedQueue::with_capacity(2);
        assert!(queue.push(7_u16));
        assert!(queue.push(8));
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.peek(), None);
        assert_eq!(queue.capacity(), 2);
        assert!(queue.push(9));
        assert_eq!(queue.pop(), Some(9));
    }

    #[test]
    fn zero_capacity_queue_refuses_everything() {
        let mut queue = BoundedQueue::with_capacity(0);
        assert!(!queue.push(1_u16));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn carries_locations_and_directions_alike() {
        let size = BoardSize::new(4).expect("valid side");
        let mut locations = BoundedQueue::with_capacity(2);
        let mut directions = BoundedQueue::with_capacity(2);

        assert!(locations.push(size.pack(1, 2)));
        assert!(directions.push(Direction::new(-1, 1)));

        let location: Option<Location> = locations.pop();
        assert_eq!(location, Some(size.pack(1, 2)));
        assert_eq!(directions.pop(), Some(Direction::new(-1, 1)));
    }
}
