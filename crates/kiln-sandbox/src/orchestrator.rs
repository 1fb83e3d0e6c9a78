//! Per-frame driver
//!
//! One frame walks `Idle -> Simulate -> RecordCommands -> Submit ->
//! WaitForGpu -> Idle`. The GPU side sits behind [`FrameBackend`] so the
//! sequencing and the fence discipline can be exercised without a device.
//! A frame whose back buffer could not be acquired goes straight from
//! `RecordCommands` back to `Idle` and signals nothing.

use instant::Instant;
use kiln_render::{BlendMode, CompletionSource, FenceWait, FrameFence, RenderError};
use thiserror::Error;

use crate::scene::Scene;

/// Logical timestep, independent of wall-clock frame time
pub const FIXED_DT: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Simulate,
    RecordCommands,
    Submit,
    WaitForGpu,
}

impl FramePhase {
    pub fn can_advance_to(self, to: FramePhase) -> bool {
        use FramePhase::*;
        matches!(
            (self, to),
            (Idle, Simulate)
                | (Simulate, RecordCommands)
                | (RecordCommands, Submit)
                | (RecordCommands, Idle)
                | (Submit, WaitForGpu)
                | (WaitForGpu, Idle)
        )
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("illegal frame transition {from:?} -> {to:?}")]
    IllegalTransition { from: FramePhase, to: FramePhase },
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// GPU work for one frame
pub trait FrameBackend: CompletionSource {
    /// Bring pipelines in line with the selected blend mode. Called while
    /// `Idle`, after the previous frame's fence wait. Returns whether
    /// anything was rebuilt.
    fn apply_pipeline_changes(&mut self, blend: BlendMode, fence: &FrameFence) -> Result<bool, FrameError>;

    /// Write per-frame constants and the instance array. Returns the
    /// particle instance count for this frame's draw.
    fn upload(&mut self, scene: &Scene) -> usize;

    /// Acquire the back buffer and record every draw. `Ok(false)` means
    /// the frame was skipped and nothing will be submitted.
    fn record(&mut self, scene: &Scene) -> Result<bool, FrameError>;

    /// Submit recorded work and present
    fn submit(&mut self) -> Result<(), FrameError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented(FenceWait),
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Frames presented so far
    pub frame_index: u64,
    pub skipped_frames: u64,
    pub live_particles: usize,
    pub drawn_instances: usize,
    pub fence_next: u64,
    pub fence_completed: u64,
    /// Whether the last frame had to block on the GPU
    pub blocked: bool,
    pub cpu_frame_ms: f32,
}

pub struct FrameOrchestrator {
    phase: FramePhase,
    fence: FrameFence,
    stats: FrameStats,
}

impl Default for FrameOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameOrchestrator {
    pub fn new() -> Self {
        Self {
            phase: FramePhase::Idle,
            fence: FrameFence::new(),
            stats: FrameStats::default(),
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn fence(&self) -> &FrameFence {
        &self.fence
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn advance(&mut self, to: FramePhase) -> Result<(), FrameError> {
        if !self.phase.can_advance_to(to) {
            return Err(FrameError::IllegalTransition { from: self.phase, to });
        }
        log::trace!("frame phase {:?} -> {:?}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    /// Run one full frame. UI edits must already be applied to `scene`.
    ///
    /// A backend failure abandons the frame and leaves the orchestrator in
    /// `Idle`; nothing was signaled for it.
    pub fn run_frame<B: FrameBackend>(&mut self, scene: &mut Scene, backend: &mut B) -> Result<FrameOutcome, FrameError> {
        if self.phase != FramePhase::Idle {
            return Err(FrameError::IllegalTransition {
                from: self.phase,
                to: FramePhase::Simulate,
            });
        }

        let result = self.run_phases(scene, backend);
        if result.is_err() {
            log::debug!("frame abandoned in {:?}", self.phase);
            self.phase = FramePhase::Idle;
        }
        result
    }

    fn run_phases<B: FrameBackend>(&mut self, scene: &mut Scene, backend: &mut B) -> Result<FrameOutcome, FrameError> {
        let started = Instant::now();
        backend.apply_pipeline_changes(scene.blend_mode, &self.fence)?;

        self.advance(FramePhase::Simulate)?;
        scene.simulate(FIXED_DT);
        let drawn = backend.upload(scene);

        self.advance(FramePhase::RecordCommands)?;
        if !backend.record(scene)? {
            self.advance(FramePhase::Idle)?;
            self.stats.skipped_frames += 1;
            self.update_stats(scene, drawn, false, started);
            return Ok(FrameOutcome::Skipped);
        }

        self.advance(FramePhase::Submit)?;
        backend.submit()?;

        self.advance(FramePhase::WaitForGpu)?;
        let wait = self.fence.signal_and_wait(&*backend);

        self.advance(FramePhase::Idle)?;
        self.stats.frame_index += 1;
        self.update_stats(scene, drawn, wait.blocked, started);
        Ok(FrameOutcome::Presented(wait))
    }

    fn update_stats(&mut self, scene: &Scene, drawn: usize, blocked: bool, started: Instant) {
        self.stats.live_particles = scene.particles.alive();
        self.stats.drawn_instances = drawn;
        self.stats.fence_next = self.fence.next_value();
        self.stats.fence_completed = self.fence.completed_value();
        self.stats.blocked = blocked;
        self.stats.cpu_frame_ms = started.elapsed().as_secs_f32() * 1000.0;
    }
}
