//! The shared serialization buffer.
//!
//! One fixed-capacity byte region, allocated once and never resized, reused
//! by every outgoing full-state serialization. Access goes through
//! [`SerializationBuffer::lease`], which never blocks: a concurrent caller
//! gets [`ProtoSendError::BufferBusy`] instead of waiting. The backing storage
//! is only reachable through the lease, and the lease only hands out the
//! prefix that was actually written.

use crate::error::ProtoSendError;
use std::sync::{Mutex, MutexGuard, TryLockError};

/// Hard ceiling for a single serialized vessel.
pub const MAX_PROTO_BYTES: usize = 10_000_000;

#[derive(Debug)]
pub struct SerializationBuffer {
    bytes: Mutex<Box<[u8]>>,
    capacity: usize,
}

impl SerializationBuffer {
    /// Allocates a buffer of `capacity` bytes, capped at [`MAX_PROTO_BYTES`].
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_PROTO_BYTES);
        Self {
            bytes: Mutex::new(vec![0u8; capacity].into_boxed_slice()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enters the critical section.
    pub fn lease(&self) -> Result<BufferLease<'_>, ProtoSendError> {
        match self.bytes.try_lock() {
            Ok(guard) => Ok(BufferLease { guard }),
            Err(TryLockError::WouldBlock) => Err(ProtoSendError::BufferBusy),
            Err(TryLockError::Poisoned(_)) => Err(ProtoSendError::BufferPoisoned),
        }
    }
}

impl Default for SerializationBuffer {
    fn default() -> Self {
        Self::new(MAX_PROTO_BYTES)
    }
}

/// Exclusive access to the buffer; released on drop.
pub struct BufferLease<'a> {
    guard: MutexGuard<'a, Box<[u8]>>,
}

impl BufferLease<'_> {
    /// The whole region, for the serializer to write into.
    pub fn writable(&mut self) -> &mut [u8] {
        &mut self.guard[..]
    }

    /// The first `len` bytes written, clamped to the capacity.
    pub fn commit(&self, len: usize) -> &[u8] {
        let len = len.min(self.guard.len());
        &self.guard[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_capped() {
        assert_eq!(SerializationBuffer::new(usize::MAX).capacity(), MAX_PROTO_BYTES);
        assert_eq!(SerializationBuffer::new(64).capacity(), 64);
    }

    #[test]
    fn test_second_lease_is_busy() {
        let buffer = SerializationBuffer::new(16);
        let lease = buffer.lease().unwrap();
        assert_eq!(buffer.lease().err(), Some(ProtoSendError::BufferBusy));
        drop(lease);
        assert!(buffer.lease().is_ok());
    }

    #[test]
    fn test_commit_exposes_only_written_prefix() {
        let buffer = SerializationBuffer::new(8);
        {
            let mut lease = buffer.lease().unwrap();
            lease.writable()[..6].copy_from_slice(b"abcdef");
            assert_eq!(lease.commit(6), b"abcdef");
        }
        let mut lease = buffer.lease().unwrap();
        lease.writable()[..2].copy_from_slice(b"xy");
        assert_eq!(lease.commit(2), b"xy");
        assert_eq!(lease.commit(100).len(), 8);
    }
}
