//! Debug UI: "Settings" and "Sphere" windows
//!
//! Widgets edit the [`Scene`] in place. Anything that is more than a field
//! edit comes back as a [`UiAction`] and is applied before the simulation
//! step.

use glam::{Vec3, Vec4};
use kiln_core::Transform;
use kiln_render::{BlendMode, PipelineStatus};

use crate::orchestrator::FrameStats;
use crate::scene::{DirectionalLight, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    /// Emit one batch of `emitter.count` particles now
    SpawnParticles,
    /// Destroy every live particle
    ResetParticles,
}

/// Build both windows for this frame
pub fn draw(
    ctx: &egui::Context,
    scene: &mut Scene,
    stats: &FrameStats,
    pipelines: &PipelineStatus,
) -> Vec<UiAction> {
    let mut actions = Vec::new();

    egui::Window::new("Settings").show(ctx, |ui| {
        settings_window(ui, scene, stats, pipelines, &mut actions);
    });
    egui::Window::new("Sphere").show(ctx, |ui| {
        sphere_window(ui, scene);
    });

    actions
}

/// Apply deferred actions, then clean up edited fields
pub fn apply_actions(scene: &mut Scene, actions: &[UiAction]) {
    for action in actions {
        match action {
            UiAction::SpawnParticles => {
                let added = scene.particles.manual_spawn();
                log::debug!("spawned {added} particles");
            }
            UiAction::ResetParticles => scene.particles.reset(),
        }
    }
    scene.normalize_lights();
}

fn settings_window(
    ui: &mut egui::Ui,
    scene: &mut Scene,
    stats: &FrameStats,
    pipelines: &PipelineStatus,
    actions: &mut Vec<UiAction>,
) {
    ui.horizontal(|ui| {
        if ui.button("Add particles").clicked() {
            actions.push(UiAction::SpawnParticles);
        }
        if ui.button("Clear").clicked() {
            actions.push(UiAction::ResetParticles);
        }
    });

    let emitter = &mut scene.particles.emitter;
    drag_vec3(ui, "Emitter", &mut emitter.origin.translate, 0.01);
    ui.horizontal(|ui| {
        ui.label("Count:");
        ui.add(egui::DragValue::new(&mut emitter.count).range(0..=64));
        ui.label("Interval:");
        ui.add(
            egui::DragValue::new(&mut emitter.interval)
                .speed(0.01)
                .range(0.01..=10.0)
                .suffix(" s"),
        );
    });

    egui::ComboBox::from_label("Blend")
        .selected_text(scene.blend_mode.label())
        .show_ui(ui, |ui| {
            for mode in BlendMode::ALL {
                ui.selectable_value(&mut scene.blend_mode, mode, mode.label());
            }
        });
    ui.checkbox(&mut scene.use_billboard, "Billboard");

    ui.separator();
    egui::CollapsingHeader::new("Model").show(ui, |ui| {
        drag_vec3(ui, "Translate", &mut scene.model.transform.translate, 0.01);
        angle_vec3(ui, "Rotate", &mut scene.model.transform.rotate);
        color_edit(ui, "Color", &mut scene.model.material.color);
        light_edit(ui, &mut scene.model.light);
    });

    egui::CollapsingHeader::new("Sprite").show(ui, |ui| {
        drag_vec3(ui, "Translate", &mut scene.sprite.transform.translate, 1.0);
        drag_vec3(ui, "Scale", &mut scene.sprite.transform.scale, 0.01);
        color_edit(ui, "Color", &mut scene.sprite.material.color);
        uv_edit(ui, &mut scene.sprite.material.uv_transform);
    });

    egui::CollapsingHeader::new("Camera").show(ui, |ui| {
        drag_vec3(ui, "Translate", &mut scene.camera.translate, 0.01);
        drag_vec3(ui, "Rotate", &mut scene.camera.rotate, 0.01);
    });

    ui.separator();
    ui.monospace(format!("Frame: {}", stats.frame_index));
    ui.monospace(format!("CPU: {:.2}ms", stats.cpu_frame_ms));
    ui.monospace(format!(
        "Particles: {} live / {} drawn",
        stats.live_particles, stats.drawn_instances
    ));
    ui.monospace(format!(
        "Fence: {} / {}{}",
        stats.fence_completed,
        stats.fence_next,
        if stats.blocked { " (waited)" } else { "" }
    ));
    ui.monospace(pipeline_summary(pipelines));
}

fn pipeline_summary(status: &PipelineStatus) -> String {
    match status.pending {
        Some(next) => format!(
            "Pipelines: {} -> {} pending, {} rebuilds",
            status.active, next, status.rebuilds
        ),
        None => format!("Pipelines: {}, {} rebuilds", status.active, status.rebuilds),
    }
}

fn sphere_window(ui: &mut egui::Ui, scene: &mut Scene) {
    let sphere = &mut scene.sphere;
    drag_vec3(ui, "Translate", &mut sphere.transform.translate, 0.01);
    drag_vec3(ui, "Rotate", &mut sphere.transform.rotate, 0.01);
    drag_vec3(ui, "Scale", &mut sphere.transform.scale, 0.01);
    color_edit(ui, "Color", &mut sphere.material.color);
    ui.checkbox(&mut scene.use_monster_ball, "Monster ball");
    light_edit(ui, &mut sphere.light);
}

fn drag_vec3(ui: &mut egui::Ui, label: &str, value: &mut Vec3, speed: f64) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::DragValue::new(&mut value.x).speed(speed));
        ui.add(egui::DragValue::new(&mut value.y).speed(speed));
        ui.add(egui::DragValue::new(&mut value.z).speed(speed));
    });
}

fn angle_vec3(ui: &mut egui::Ui, label: &str, radians: &mut Vec3) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.drag_angle(&mut radians.x);
        ui.drag_angle(&mut radians.y);
        ui.drag_angle(&mut radians.z);
    });
}

fn color_edit(ui: &mut egui::Ui, label: &str, color: &mut Vec4) {
    ui.horizontal(|ui| {
        ui.label(label);
        let mut rgba = color.to_array();
        if ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed() {
            *color = Vec4::from_array(rgba);
        }
    });
}

fn light_edit(ui: &mut egui::Ui, light: &mut DirectionalLight) {
    ui.horizontal(|ui| {
        ui.label("Light dir");
        for axis in [&mut light.direction.x, &mut light.direction.y, &mut light.direction.z] {
            ui.add(egui::Slider::new(axis, -1.0..=1.0));
        }
    });
    ui.horizontal(|ui| {
        ui.label("Intensity");
        ui.add(egui::DragValue::new(&mut light.intensity).speed(0.01));
    });
    color_edit(ui, "Light color", &mut light.color);
}

fn uv_edit(ui: &mut egui::Ui, uv: &mut Transform) {
    ui.horizontal(|ui| {
        ui.label("UV translate");
        ui.add(egui::DragValue::new(&mut uv.translate.x).speed(0.01).range(-10.0..=10.0));
        ui.add(egui::DragValue::new(&mut uv.translate.y).speed(0.01).range(-10.0..=10.0));
    });
    ui.horizontal(|ui| {
        ui.label("UV scale");
        ui.add(egui::DragValue::new(&mut uv.scale.x).speed(0.01).range(-10.0..=10.0));
        ui.add(egui::DragValue::new(&mut uv.scale.y).speed(0.01).range(-10.0..=10.0));
    });
    ui.horizontal(|ui| {
        ui.label("UV rotate");
        ui.drag_angle(&mut uv.rotate.z);
    });
}
