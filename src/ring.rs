//! Fixed capacity byte ring buffer shared by the interrupt handler and the reader.

/// A circular byte store of `N` bytes.
///
/// Writes into a full buffer are dropped, unread bytes are never overwritten.
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    buffer: [u8; N],
    /// Next index to write to.
    head: usize,
    /// Next index to read from.
    tail: usize,
    /// Number of bytes stored.
    len: usize,
}

impl<const N: usize> RingBuffer<N> {
    /// Creates an empty [`RingBuffer`].
    #[inline]
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Returns the capacity in bytes.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the number of bytes stored.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bytes are stored.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if further writes would be dropped.
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.len >= N
    }

    /// Stores `byte` at the head.
    ///
    /// Returns `false` and discards the byte if the buffer is full.
    pub fn put(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }

        self.buffer[self.head] = byte;
        self.head = Self::advance(self.head);
        self.len += 1;

        true
    }

    /// Removes and returns the byte at the tail, or `0` if the buffer is empty.
    pub fn take(&mut self) -> u8 {
        if self.is_empty() {
            return 0;
        }

        let byte = self.buffer[self.tail];
        self.tail = Self::advance(self.tail);
        self.len -= 1;

        byte
    }

    /// Compares the bytes at the tail against `prefix` without consuming them.
    ///
    /// `prefix` ends at its first `\0`, if any. Every prefix byte must be matched by
    /// a stored byte. With `exact` the number of stored bytes must also equal the prefix length.
    pub fn compare(&self, prefix: &[u8], exact: bool) -> bool {
        let mut index = self.tail;
        let mut matched = 0;

        for &expected in prefix.iter().take_while(|&&byte| byte != 0) {
            if matched >= self.len {
                return false;
            }

            if self.buffer[index] != expected {
                return false;
            }

            matched += 1;
            index = Self::advance(index);
        }

        !exact || self.len == matched
    }

    /// Discards every stored byte.
    #[inline]
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }

    const fn advance(index: usize) -> usize {
        let next = index + 1;

        if next >= N { 0 } else { next }
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
