//! The value side of a dictionary entry: a [`RefBuffer`] plus an absolute
//! expiration instant, owned by exactly one partition's map under exactly
//! one key.

use crate::ref_buffer::RefBuffer;

pub struct Record {
    buffer: RefBuffer,
    expiration_millis: u64,
}

impl Record {
    #[must_use]
    pub fn new(buffer: RefBuffer, expiration_millis: u64) -> Self {
        Self {
            buffer,
            expiration_millis,
        }
    }

    #[must_use]
    pub fn expiration_millis(&self) -> u64 {
        self.expiration_millis
    }

    #[must_use]
    pub fn is_expired(&self, now_millis: u64) -> bool {
        self.expiration_millis <= now_millis
    }

    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.bytes()
    }

    /// Releases the owned buffer exactly once. Consumes `self` so a caller
    /// cannot release the same record's buffer twice.
    pub fn release(self) {
        self.buffer.release();
    }
}
