//! Frame ID allocation.

use crate::constants::NO_ACK_FRAME_ID;

/// Hands out correlation IDs for acknowledged requests.
///
/// IDs run `1..=255` and wrap back to 1; zero is reserved for requests that
/// do not want a response frame and is never issued.
#[derive(Debug, Clone)]
pub struct FrameIdAllocator {
    next: u8,
}

impl Default for FrameIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameIdAllocator {
    pub fn new() -> Self {
        FrameIdAllocator { next: 1 }
    }

    /// Take the next ID.
    pub fn next_id(&mut self) -> u8 {
        let id = self.next;
        self.next = if id == u8::MAX { 1 } else { id + 1 };
        id
    }

    /// The ID for a request: the next allocated one when `ack` is set,
    /// [`NO_ACK_FRAME_ID`] otherwise (leaving the counter untouched).
    pub fn for_request(&mut self, ack: bool) -> u8 {
        if ack {
            self.next_id()
        } else {
            NO_ACK_FRAME_ID
        }
    }

    /// The ID the next acknowledged request will receive.
    pub fn peek(&self) -> u8 {
        self.next
    }
}
