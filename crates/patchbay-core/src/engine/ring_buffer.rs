//! Fixed-capacity ring buffer with contiguous bulk access
//!
//! Every element is stored twice (at `i` and `i + CAP`), so both the
//! readable region and the writable region are always one contiguous slice.
//! This lets the resampler read and write whole batches in place.
//!
//! The buffer is not synchronized. Each instance's buffers have exactly one
//! producer and one consumer role; the owner serializes access.

/// Fixed-capacity ring buffer of `CAP` elements (`CAP` must be a power of two)
pub struct RingBuffer<T, const CAP: usize> {
    data: Box<[T]>,
    start: usize,
    end: usize,
}

impl<T: Copy + Default, const CAP: usize> RingBuffer<T, CAP> {
    const MASK: usize = {
        assert!(CAP.is_power_of_two(), "ring buffer capacity must be a power of two");
        CAP - 1
    };

    /// Create an empty buffer (allocates `2 * CAP` elements up front)
    pub fn new() -> Self {
        Self {
            data: vec![T::default(); CAP * 2].into_boxed_slice(),
            start: 0,
            end: 0,
        }
    }

    /// Append one element; returns false (element dropped) if full
    #[inline]
    pub fn push(&mut self, item: T) -> bool {
        if self.is_full() {
            return false;
        }
        let i = self.end & Self::MASK;
        self.data[i] = item;
        self.data[i + CAP] = item;
        self.end = self.end.wrapping_add(1);
        true
    }

    /// Remove and return the oldest element
    #[inline]
    pub fn shift(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.data[self.start & Self::MASK];
        self.start = self.start.wrapping_add(1);
        Some(item)
    }

    /// Number of elements currently held
    #[inline]
    pub fn len(&self) -> usize {
        self.end.wrapping_sub(self.start)
    }

    /// Fixed capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        CAP
    }

    /// Free slots remaining
    #[inline]
    pub fn space(&self) -> usize {
        CAP - self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == CAP
    }

    /// Drop all elements
    pub fn clear(&mut self) {
        self.start = 0;
        self.end = 0;
    }

    /// All readable elements, oldest first, as one slice
    #[inline]
    pub fn readable(&self) -> &[T] {
        let i = self.start & Self::MASK;
        &self.data[i..i + self.len()]
    }

    /// Consume `n` elements after reading them through [`readable`](Self::readable)
    ///
    /// `n` is clamped to the number of readable elements.
    #[inline]
    pub fn advance_read(&mut self, n: usize) {
        self.start = self.start.wrapping_add(n.min(self.len()));
    }

    /// All free slots, in write order, as one slice
    #[inline]
    pub fn writable(&mut self) -> &mut [T] {
        let i = self.end & Self::MASK;
        let space = self.space();
        &mut self.data[i..i + space]
    }

    /// Commit `n` elements written through [`writable`](Self::writable)
    ///
    /// `n` is clamped to the free space. Written elements are mirrored into
    /// the other half of the storage.
    pub fn advance_write(&mut self, n: usize) {
        let n = n.min(self.space());
        let base = self.end & Self::MASK;
        for offset in 0..n {
            let p = base + offset;
            if p < CAP {
                self.data[p + CAP] = self.data[p];
            } else {
                self.data[p - CAP] = self.data[p];
            }
        }
        self.end = self.end.wrapping_add(n);
    }
}

impl<T: Copy + Default, const CAP: usize> Default for RingBuffer<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAP: usize> std::fmt::Debug for RingBuffer<T, CAP> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("len", &self.end.wrapping_sub(self.start))
            .field("capacity", &CAP)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_shift_order() {
        let mut rb: RingBuffer<u32, 4> = RingBuffer::new();
        assert!(rb.is_empty());
        assert!(rb.push(1));
        assert!(rb.push(2));
        assert_eq!(rb.len(), 2);
        assert_eq!(rb.shift(), Some(1));
        assert_eq!(rb.shift(), Some(2));
        assert_eq!(rb.shift(), None);
    }

    #[test]
    fn test_push_when_full_is_dropped() {
        let mut rb: RingBuffer<u32, 4> = RingBuffer::new();
        for i in 0..4 {
            assert!(rb.push(i));
        }
        assert!(rb.is_full());
        assert!(!rb.push(99));
        assert_eq!(rb.len(), 4);
        assert_eq!(rb.readable(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_readable_is_contiguous_across_wrap() {
        let mut rb: RingBuffer<u32, 4> = RingBuffer::new();
        for i in 0..3 {
            rb.push(i);
        }
        rb.shift();
        rb.shift();
        // start = 2, elements now wrap past the end of the first half
        rb.push(3);
        rb.push(4);
        rb.push(5);
        assert_eq!(rb.readable(), &[2, 3, 4, 5]);
    }

    #[test]
    fn test_bulk_write_and_read() {
        let mut rb: RingBuffer<u32, 8> = RingBuffer::new();
        rb.push(100);
        rb.push(101);
        rb.advance_read(2);

        let span = rb.writable();
        assert_eq!(span.len(), 8);
        for (i, slot) in span.iter_mut().take(7).enumerate() {
            *slot = i as u32;
        }
        rb.advance_write(7);
        assert_eq!(rb.len(), 7);
        assert_eq!(rb.readable(), &[0, 1, 2, 3, 4, 5, 6]);

        rb.advance_read(5);
        assert_eq!(rb.readable(), &[5, 6]);

        // Wrapped writes must be visible through the mirrored half
        let span = rb.writable();
        assert_eq!(span.len(), 6);
        for (i, slot) in span.iter_mut().enumerate() {
            *slot = 10 + i as u32;
        }
        rb.advance_write(6);
        assert_eq!(rb.readable(), &[5, 6, 10, 11, 12, 13, 14, 15]);
        for expected in [5, 6, 10, 11, 12, 13, 14, 15] {
            assert_eq!(rb.shift(), Some(expected));
        }
    }

    #[test]
    fn test_advance_is_clamped() {
        let mut rb: RingBuffer<u32, 4> = RingBuffer::new();
        rb.advance_write(10);
        assert!(rb.is_full());
        rb.advance_read(10);
        assert!(rb.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut rb: RingBuffer<u32, 4> = RingBuffer::new();
        rb.push(1);
        rb.push(2);
        rb.clear();
        assert!(rb.is_empty());
        assert_eq!(rb.space(), 4);
        assert_eq!(rb.capacity(), 4);
    }
}
