//! Recording test doubles for the secondary ports.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use domain::common::error::DomainError;
use domain::guard::entity::TrafficEvent;

use crate::secondary::event_sink::GuardEventSink;
use crate::secondary::packet_blocker::PacketBlocker;

/// One call observed by a [`RecordingBlocker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockerCall {
    Block(u32),
    Unblock(u32),
}

/// In-memory blocker that records every call and can be switched to fail.
///
/// Failing calls are still recorded, so tests can assert both the attempt
/// and the advisory error handling.
#[derive(Debug, Default)]
pub struct RecordingBlocker {
    calls: Mutex<Vec<BlockerCall>>,
    fail: AtomicBool,
}

impl RecordingBlocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub fn calls(&self) -> Vec<BlockerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn block_count(&self, addr: u32) -> usize {
        self.count(BlockerCall::Block(addr))
    }

    pub fn unblock_count(&self, addr: u32) -> usize {
        self.count(BlockerCall::Unblock(addr))
    }

    fn count(&self, call: BlockerCall) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    fn push(&self, call: BlockerCall) -> Result<(), DomainError> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::Relaxed) {
            return Err(DomainError::Blocker("forced failure".to_string()));
        }
        Ok(())
    }
}

impl PacketBlocker for RecordingBlocker {
    fn block(&self, addr: u32) -> Result<(), DomainError> {
        self.push(BlockerCall::Block(addr))
    }

    fn unblock(&self, addr: u32) -> Result<(), DomainError> {
        self.push(BlockerCall::Unblock(addr))
    }
}

/// Event sink that stores every `(event, addr)` pair.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<(TrafficEvent, u32)>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(TrafficEvent, u32)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: TrafficEvent) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == event)
            .count()
    }
}

impl GuardEventSink for RecordingEventSink {
    fn record(&self, event: TrafficEvent, addr: u32) {
        self.events.lock().unwrap().push((event, addr));
    }
}
