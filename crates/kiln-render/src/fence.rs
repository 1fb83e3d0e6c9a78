//! CPU/GPU frame fence
//!
//! A monotonically increasing counter with two views: the last value the
//! CPU asked to be signaled (`next`) and the last value the GPU reported as
//! done (`completed`). A value is signaled after a submission; waiting on
//! it blocks the CPU until every earlier submission has finished.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Something that can report when submitted GPU work has finished
pub trait CompletionSource {
    /// Arrange for `completed` to reach at least `value` once all work
    /// submitted so far has finished.
    fn enqueue_signal(&self, value: u64, completed: Arc<AtomicU64>);

    /// Block the calling thread until the device makes progress.
    fn block(&self);
}

/// wgpu completion: queue callbacks fired by device polling
pub struct QueueCompletion<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

impl CompletionSource for QueueCompletion<'_> {
    fn enqueue_signal(&self, value: u64, completed: Arc<AtomicU64>) {
        self.queue.on_submitted_work_done(move || {
            completed.fetch_max(value, Ordering::AcqRel);
        });
    }

    fn block(&self) {
        self.device.poll(wgpu::Maintain::Wait);
    }
}

/// Outcome of one signal-and-wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceWait {
    pub value: u64,
    /// Whether the CPU had to block for the GPU
    pub blocked: bool,
}

#[derive(Debug, Default)]
pub struct FrameFence {
    next: u64,
    completed: Arc<AtomicU64>,
}

impl FrameFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value handed to the GPU
    pub fn next_value(&self) -> u64 {
        self.next
    }

    /// Last value the GPU has reached
    pub fn completed_value(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// No signaled work is outstanding
    pub fn is_idle(&self) -> bool {
        self.completed_value() >= self.next
    }

    /// Request a new value, written by the GPU after everything submitted so far.
    pub fn signal(&mut self, source: &impl CompletionSource) -> u64 {
        self.next += 1;
        source.enqueue_signal(self.next, Arc::clone(&self.completed));
        self.next
    }

    /// Block until the GPU has reached `value`. Returns whether it blocked.
    pub fn wait_for(&self, value: u64, source: &impl CompletionSource) -> bool {
        let mut blocked = false;
        while self.completed_value() < value {
            source.block();
            blocked = true;
        }
        blocked
    }

    /// Signal a new value and wait for it: the end-of-frame drain.
    pub fn signal_and_wait(&mut self, source: &impl CompletionSource) -> FenceWait {
        let value = self.signal(source);
        let blocked = self.wait_for(value, source);
        FenceWait { value, blocked }
    }
}
