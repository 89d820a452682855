//! Inbound byte queue between the Bluetooth stack and the main loop.
//!
//! Received SPP data arrives in the Bluedroid task through a C callback.
//! The callback pushes every byte here; the main loop pops one byte per
//! iteration and treats it as one command.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │ SPP DATA_IND │────▶│  Inbox (128 B)   │────▶│  Main loop   │
//! │ (BT task)    │     │  lock-free MPMC  │     │  (consumer)  │
//! └──────────────┘     └──────────────────┘     └──────────────┘
//! ```
//!
//! While a blocking door motion runs, nothing is popped and bytes pile up.
//! Once the queue is full, new bytes are dropped and counted.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::mpmc::MpMcQueue;

use crate::app::ports::CommandSource;

/// Bytes the inbox holds before it starts dropping.  Power of two.
pub const INBOX_CAPACITY: usize = 128;

/// Bounded byte FIFO safe to share between the radio task and the main loop.
pub struct Inbox {
    queue: MpMcQueue<u8, INBOX_CAPACITY>,
    dropped: AtomicU32,
}

/// Receive buffer for the wireless command channel.
pub static WIRELESS_RX: Inbox = Inbox::new();

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub const fn new() -> Self {
        Self {
            queue: MpMcQueue::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue one byte.  Returns `false` (and counts it) if the inbox is full.
    pub fn push(&self, byte: u8) -> bool {
        if self.queue.enqueue(byte).is_ok() {
            return true;
        }
        self.dropped.fetch_add(1, Ordering::Relaxed);
        false
    }

    /// Enqueue a received chunk; returns how many bytes were accepted.
    pub fn push_slice(&self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.push(b)).count()
    }

    /// Dequeue the oldest byte, if any.
    pub fn pop(&self) -> Option<u8> {
        self.queue.dequeue()
    }

    /// Total bytes dropped because the inbox was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// The main loop drains the inbox through a shared reference.
impl CommandSource for &Inbox {
    fn poll_byte(&mut self) -> Option<u8> {
        self.pop()
    }
}
