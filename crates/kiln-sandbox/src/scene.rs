//! Scene container
//!
//! Every piece of per-object state the UI edits and the frame loop reads
//! lives here, one record per drawable. Nothing in this module touches the
//! GPU, so simulation and matrix math are testable on their own.

use glam::{Mat4, Vec3, Vec4};
use kiln_core::{SandboxConfig, Transform};
use kiln_particles::{project, Emitter, ParticleForGpu, ParticleSystem};
use kiln_render::{BlendMode, CameraUniforms, DirectionalLightUniforms, MaterialUniforms, TransformationMatrix};

/// Vertical field of view in radians
pub const FOV_Y: f32 = 0.45;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;

/// The draws issued every frame, in submission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawSlot {
    Sphere,
    Model,
    Sprite,
    Particles,
}

pub const DRAW_ORDER: [DrawSlot; 4] = [DrawSlot::Sphere, DrawSlot::Model, DrawSlot::Sprite, DrawSlot::Particles];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Vec4,
    pub enable_lighting: bool,
    pub uv_transform: Transform,
    pub shininess: f32,
}

impl Material {
    pub fn lit(shininess: f32) -> Self {
        Self {
            enable_lighting: true,
            shininess,
            ..Self::unlit()
        }
    }

    pub fn unlit() -> Self {
        Self {
            color: Vec4::ONE,
            enable_lighting: false,
            uv_transform: Transform::IDENTITY,
            shininess: 0.0,
        }
    }

    pub fn to_uniforms(&self) -> MaterialUniforms {
        MaterialUniforms::new(
            self.color,
            self.enable_lighting,
            self.uv_transform.to_matrix(),
            self.shininess,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec4,
    pub direction: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            direction: Vec3::NEG_Y,
            intensity: 1.0,
        }
    }
}

impl DirectionalLight {
    /// Re-normalize after an edit. A zero vector falls back to straight down.
    pub fn normalize(&mut self) {
        self.direction = self.direction.try_normalize().unwrap_or(Vec3::NEG_Y);
    }

    pub fn to_uniforms(&self) -> DirectionalLightUniforms {
        DirectionalLightUniforms::new(self.color, self.direction, self.intensity)
    }
}

/// One drawable object's editable state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub transform: Transform,
    pub material: Material,
    pub light: DirectionalLight,
}

impl SceneObject {
    pub fn new(material: Material) -> Self {
        Self {
            transform: Transform::IDENTITY,
            material,
            light: DirectionalLight::default(),
        }
    }
}

/// Uniform values for one object draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectFrame {
    pub transform: TransformationMatrix,
    pub material: MaterialUniforms,
    pub light: DirectionalLightUniforms,
    pub camera: CameraUniforms,
}

pub fn initial_camera() -> Transform {
    Transform::new(
        Vec3::ONE,
        Vec3::new(0.3, std::f32::consts::PI, 0.0),
        Vec3::new(0.0, 4.0, 10.0),
    )
}

pub struct Scene {
    pub camera: Transform,
    pub sphere: SceneObject,
    /// Sphere shows the monster-ball texture instead of the uv checker
    pub use_monster_ball: bool,
    pub model: SceneObject,
    pub sprite: SceneObject,
    pub particles: ParticleSystem,
    /// Material shared by every particle instance
    pub particle_material: Material,
    pub blend_mode: BlendMode,
    pub use_billboard: bool,
    width: u32,
    height: u32,
}

impl Scene {
    pub fn new(particles: ParticleSystem, width: u32, height: u32) -> Self {
        Self {
            camera: initial_camera(),
            sphere: SceneObject::new(Material::lit(10.0)),
            use_monster_ball: true,
            model: SceneObject::new(Material::lit(10.0)),
            sprite: SceneObject::new(Material::unlit()),
            particles,
            particle_material: Material::unlit(),
            blend_mode: BlendMode::default(),
            use_billboard: false,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Build the scene from config and fire the initial burst
    pub fn from_config(config: &SandboxConfig) -> Self {
        let settings = &config.particles;
        let emitter = Emitter::new(settings.emit_count, settings.emit_interval);
        let seed = settings.seed.unwrap_or_else(seed_from_clock);
        log::info!("particle seed {seed}");

        let mut particles = ParticleSystem::with_seed(emitter, seed);
        particles.set_growth_warning(settings.growth_warning);
        particles.spawn(settings.initial_burst);

        Self::new(particles, config.window.width, config.window.height)
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Zero sizes (minimized window) are ignored
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn camera_world(&self) -> Mat4 {
        self.camera.to_matrix()
    }

    pub fn view(&self) -> Mat4 {
        self.camera_world().inverse()
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_lh(FOV_Y, self.aspect_ratio(), NEAR_PLANE, FAR_PLANE)
    }

    /// Pixel-space projection for the sprite, origin top-left
    pub fn sprite_projection(&self) -> Mat4 {
        Mat4::orthographic_lh(0.0, self.width as f32, self.height as f32, 0.0, 0.0, 100.0)
    }

    pub fn billboard(&self) -> Option<Mat4> {
        self.use_billboard
            .then(|| kiln_particles::billboard_matrix(self.camera_world()))
    }

    /// Advance the particle simulation by one step
    pub fn simulate(&mut self, dt: f32) -> u32 {
        self.particles.step(dt)
    }

    /// Normalize light directions after UI edits
    pub fn normalize_lights(&mut self) {
        self.sphere.light.normalize();
        self.model.light.normalize();
        self.sprite.light.normalize();
    }

    /// Uniforms for an object draw. Particles are not objects; asking for
    /// [`DrawSlot::Particles`] returns `None`.
    pub fn object_frame(&self, slot: DrawSlot) -> Option<ObjectFrame> {
        let (object, view_projection) = match slot {
            DrawSlot::Sphere => (&self.sphere, self.projection() * self.view()),
            DrawSlot::Model => (&self.model, self.projection() * self.view()),
            DrawSlot::Sprite => (&self.sprite, self.sprite_projection()),
            DrawSlot::Particles => return None,
        };
        Some(ObjectFrame {
            transform: TransformationMatrix::new(object.transform.to_matrix(), view_projection),
            material: object.material.to_uniforms(),
            light: object.light.to_uniforms(),
            camera: CameraUniforms::new(self.camera.translate),
        })
    }

    /// Fill instance slots from the live set. Returns the instance count.
    pub fn project_particles(&self, slots: &mut [ParticleForGpu]) -> usize {
        project(
            self.particles.particles(),
            self.view(),
            self.projection(),
            self.billboard(),
            slots,
        )
    }
}

fn seed_from_clock() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(0x2545_f491)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn scene() -> Scene {
        Scene::new(ParticleSystem::with_seed(Emitter::default(), 1), 1280, 720)
    }

    #[test]
    fn defaults() {
        let s = scene();
        assert_eq!(s.camera.translate, Vec3::new(0.0, 4.0, 10.0));
        assert!(s.use_monster_ball);
        assert!(!s.use_billboard);
        assert_eq!(s.blend_mode, BlendMode::None);
        assert!(s.sphere.material.enable_lighting);
        assert_eq!(s.sphere.material.shininess, 10.0);
        assert!(!s.sprite.material.enable_lighting);
        assert_eq!(s.sphere.light.direction, Vec3::NEG_Y);
    }

    #[test]
    fn from_config_fires_initial_burst() {
        let mut config = SandboxConfig::default();
        config.particles.seed = Some(9);
        let s = Scene::from_config(&config);
        assert_eq!(s.particles.alive(), 3);
        assert_eq!(s.viewport(), (1280, 720));
    }

    #[test]
    fn view_undoes_camera() {
        let s = scene();
        let product = s.view() * s.camera_world();
        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn zero_viewport_is_ignored() {
        let mut s = scene();
        s.set_viewport(0, 600);
        assert_eq!(s.viewport(), (1280, 720));
        s.set_viewport(800, 600);
        assert!((s.aspect_ratio() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn sprite_projection_maps_pixel_corners() {
        let s = scene();
        let p = s.sprite_projection();
        let top_left = p.project_point3(Vec3::ZERO);
        let bottom_right = p.project_point3(Vec3::new(1280.0, 720.0, 0.0));
        assert!((top_left.x + 1.0).abs() < 1e-5 && (top_left.y - 1.0).abs() < 1e-5);
        assert!((bottom_right.x - 1.0).abs() < 1e-5 && (bottom_right.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn object_frame_uses_world_view_projection() {
        let mut s = scene();
        s.sphere.transform.translate = Vec3::new(1.0, 2.0, 3.0);
        let frame = s.object_frame(DrawSlot::Sphere).unwrap();
        let world = s.sphere.transform.to_matrix();
        let expected = s.projection() * s.view() * world;
        let wvp = Mat4::from_cols_array_2d(&frame.transform.wvp);
        assert!(wvp.abs_diff_eq(expected, 1e-5));
        assert_eq!(frame.camera.world_position, [0.0, 4.0, 10.0]);
        assert_eq!(frame.material.enable_lighting, 1);
    }

    #[test]
    fn particles_have_no_object_frame() {
        assert!(scene().object_frame(DrawSlot::Particles).is_none());
    }

    #[test]
    fn zero_light_direction_falls_back_down() {
        let mut s = scene();
        s.model.light.direction = Vec3::ZERO;
        s.sphere.light.direction = Vec3::new(0.0, 0.0, 2.0);
        s.normalize_lights();
        assert_eq!(s.model.light.direction, Vec3::NEG_Y);
        assert_eq!(s.sphere.light.direction, Vec3::Z);
    }

    #[test]
    fn projection_truncates_at_slot_count() {
        let mut s = scene();
        s.particles.spawn(8);
        let mut slots = [ParticleForGpu::zeroed(); 5];
        assert_eq!(s.project_particles(&mut slots), 5);
        assert_eq!(s.particles.alive(), 8);
    }

    #[test]
    fn billboard_only_when_enabled() {
        let mut s = scene();
        assert!(s.billboard().is_none());
        s.use_billboard = true;
        let b = s.billboard().unwrap();
        assert_eq!(b.w_axis, Vec4::W);
    }

    #[test]
    fn draw_order_is_fixed() {
        assert_eq!(DRAW_ORDER[0], DrawSlot::Sphere);
        assert_eq!(DRAW_ORDER[3], DrawSlot::Particles);
    }

    #[test]
    fn simulate_advances_particles() {
        let mut s = scene();
        s.particles.spawn(1);
        let before = s.particles.particles()[0].elapsed;
        s.simulate(1.0 / 60.0);
        assert!(s.particles.particles()[0].elapsed > before);
    }
}
