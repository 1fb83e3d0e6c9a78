//! Whole-frame behaviour through the public API, with a GPU stand-in

use kiln_particles::{Emitter, ParticleForGpu, ParticleSystem};
use kiln_render::{BlendMode, CompletionSource, FrameFence};
use kiln_sandbox::{FrameBackend, FrameError, FrameOrchestrator, FrameOutcome, Scene, FIXED_DT};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Completes each signal on the first block after it was enqueued
struct FakeGpu {
    slots: Vec<ParticleForGpu>,
    pending: RefCell<Vec<(u64, Arc<AtomicU64>)>>,
    blend: BlendMode,
    rebuilds: u32,
    drawn: Vec<usize>,
}

impl FakeGpu {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![bytemuck::Zeroable::zeroed(); capacity],
            pending: RefCell::new(Vec::new()),
            blend: BlendMode::None,
            rebuilds: 0,
            drawn: Vec::new(),
        }
    }
}

impl CompletionSource for FakeGpu {
    fn enqueue_signal(&self, value: u64, completed: Arc<AtomicU64>) {
        self.pending.borrow_mut().push((value, completed));
    }

    fn block(&self) {
        for (value, completed) in self.pending.borrow_mut().drain(..) {
            completed.fetch_max(value, Ordering::AcqRel);
        }
    }
}

impl FrameBackend for FakeGpu {
    fn apply_pipeline_changes(&mut self, blend: BlendMode, fence: &FrameFence) -> Result<bool, FrameError> {
        if blend == self.blend || !fence.is_idle() {
            return Ok(false);
        }
        self.blend = blend;
        self.rebuilds += 1;
        Ok(true)
    }

    fn upload(&mut self, scene: &Scene) -> usize {
        let count = scene.project_particles(&mut self.slots);
        self.drawn.push(count);
        count
    }

    fn record(&mut self, _scene: &Scene) -> Result<bool, FrameError> {
        Ok(true)
    }

    fn submit(&mut self) -> Result<(), FrameError> {
        Ok(())
    }
}

/// Emitter that never fires on its own during the test
fn quiet_scene() -> Scene {
    let mut particles = ParticleSystem::with_seed(Emitter::new(3, 1.0e6), 42);
    particles.spawn(3);
    Scene::new(particles, 1280, 720)
}

#[test]
fn initial_burst_is_gone_after_its_longest_lifetime() {
    let mut scene = quiet_scene();
    let mut orchestrator = FrameOrchestrator::new();
    let mut gpu = FakeGpu::new(100);

    // lifetimes are at most 3 s
    let frames = (3.0 / FIXED_DT).ceil() as usize + 1;
    for _ in 0..frames {
        orchestrator.run_frame(&mut scene, &mut gpu).unwrap();
    }
    assert_eq!(scene.particles.alive(), 0);
    assert_eq!(gpu.drawn[0], 3);
    assert_eq!(*gpu.drawn.last().unwrap(), 0);
}

#[test]
fn drawn_count_never_exceeds_capacity() {
    let mut scene = quiet_scene();
    scene.particles.spawn(200);
    let mut orchestrator = FrameOrchestrator::new();
    let mut gpu = FakeGpu::new(100);

    orchestrator.run_frame(&mut scene, &mut gpu).unwrap();
    assert_eq!(orchestrator.stats().drawn_instances, 100);
    assert_eq!(orchestrator.stats().live_particles, 203);
}

#[test]
fn every_frame_is_drained_before_the_next() {
    let mut scene = quiet_scene();
    let mut orchestrator = FrameOrchestrator::new();
    let mut gpu = FakeGpu::new(100);

    for frame in 1..=10u64 {
        match orchestrator.run_frame(&mut scene, &mut gpu).unwrap() {
            FrameOutcome::Presented(wait) => {
                assert_eq!(wait.value, frame);
                assert!(wait.blocked);
            }
            FrameOutcome::Skipped => panic!("frame {frame} skipped"),
        }
        assert!(orchestrator.fence().is_idle());
    }
}

#[test]
fn blend_change_is_picked_up_next_frame() {
    let mut scene = quiet_scene();
    let mut orchestrator = FrameOrchestrator::new();
    let mut gpu = FakeGpu::new(100);

    orchestrator.run_frame(&mut scene, &mut gpu).unwrap();
    scene.blend_mode = BlendMode::Add;
    orchestrator.run_frame(&mut scene, &mut gpu).unwrap();
    orchestrator.run_frame(&mut scene, &mut gpu).unwrap();

    assert_eq!(gpu.blend, BlendMode::Add);
    assert_eq!(gpu.rebuilds, 1);
}
