// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Fixed capacity FIFO for [Event]s
//!
//! The queue itself is not synchronised, see [Inbox][crate::inbox::Inbox]
//! for the interrupt-safe wrapper.

use crate::engine::Event;

/// Push rejected, queue full
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Full(pub Event);

/// Ring buffer of `N` events
///
/// `free() + occupied() == capacity()` holds after every operation.
#[derive(Clone, Debug)]
pub struct EventQueue<const N: usize> {
    slots: [Option<Event>; N],
    head: usize,
    tail: usize,
    free: usize,
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventQueue<N> {
    /// Create a new empty queue
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            head: 0,
            tail: 0,
            free: N,
        }
    }

    /// Append an event, returning [Full] without modifying the queue
    /// if no slots are available
    pub fn push(&mut self, evt: Event) -> Result<(), Full> {
        if self.free == 0 {
            return Err(Full(evt));
        }

        self.slots[self.tail] = Some(evt);
        self.tail = (self.tail + 1) % N;
        self.free -= 1;

        Ok(())
    }

    /// Remove the oldest event
    pub fn pop(&mut self) -> Option<Event> {
        if self.free == N {
            return None;
        }

        let evt = self.slots[self.head].take();
        self.head = (self.head + 1) % N;
        self.free += 1;

        evt
    }

    /// Number of free slots
    pub const fn free(&self) -> usize {
        self.free
    }

    /// Number of queued events
    pub const fn occupied(&self) -> usize {
        N - self.free
    }

    pub const fn capacity(&self) -> usize {
        N
    }

}
