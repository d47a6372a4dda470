use imgui::Ui;

use crate::fx::{LINE_WORK_MAX, LINE_WORK_MIN};
use crate::gfx::camera::OrbitCamera;
use crate::material::MaterialKind;
use crate::scene::Scene;

/// The viewer's control panel: camera, material selection, effect
/// parameters, background colors, and per-model visibility.
pub fn control_panel(ui: &Ui, scene: &mut Scene, camera: &mut OrbitCamera) {
    ui.window("Viewer")
        .size([340.0, 520.0], imgui::Condition::FirstUseEver)
        .position([10.0, 10.0], imgui::Condition::FirstUseEver)
        .build(|| {
            camera_section(ui, camera);
            ui.separator();
            material_section(ui, scene);
            ui.separator();
            holographic_section(ui, scene);
            ui.separator();
            background_section(ui, scene);
            ui.separator();
            models_section(ui, scene);
        });
}

fn camera_section(ui: &Ui, camera: &mut OrbitCamera) {
    ui.text("Camera");

    let mut distance = camera.distance;
    if ui.slider("Distance", 2.0, 40.0, &mut distance) {
        camera.set_distance(distance);
    }
    let mut pitch = camera.pitch;
    if ui.slider("Pitch", -1.5, 1.5, &mut pitch) {
        camera.set_pitch(pitch);
    }
    let mut yaw = camera.yaw;
    if ui.slider("Yaw", -std::f32::consts::PI, std::f32::consts::PI, &mut yaw) {
        camera.set_yaw(yaw);
    }
}

fn material_section(ui: &Ui, scene: &mut Scene) {
    ui.text("Material");

    let items = ["Holographic", "Matcap"];
    let mut selected = match scene.selector().kind() {
        MaterialKind::Holographic => 0,
        MaterialKind::Matcap => 1,
    };
    if ui.combo_simple_string("##material_kind", &mut selected, &items) {
        let kind = if selected == 0 {
            MaterialKind::Holographic
        } else {
            MaterialKind::Matcap
        };
        scene.set_material_kind(kind);
    }

    if scene.selector().kind() == MaterialKind::Matcap {
        let count = scene.selector().matcap_count();
        if count > 1 {
            let mut index = scene.selector().matcap_index() as i32;
            if ui.slider("Matcap", 0, count as i32 - 1, &mut index) {
                scene.set_matcap_index(index);
            }
        }
    }
}

fn holographic_section(ui: &Ui, scene: &mut Scene) {
    ui.text("Holographic");

    ui.color_edit3("Color", &mut scene.holographic.base_color);

    let mut line_work = scene.holographic.line_work();
    if ui.slider("Line work", LINE_WORK_MIN, LINE_WORK_MAX, &mut line_work) {
        scene.holographic.set_line_work(line_work);
    }
}

fn background_section(ui: &Ui, scene: &mut Scene) {
    ui.text("Background");
    ui.color_edit3("Top", &mut scene.gradient.top);
    ui.color_edit3("Bottom", &mut scene.gradient.bottom);
}

fn models_section(ui: &Ui, scene: &mut Scene) {
    ui.text("Models");

    // Unloaded targets are listed too; toggling them stores the intent for
    // when the load completes.
    for row in scene.target_overview() {
        let label = if row.loaded {
            row.name.clone()
        } else {
            format!("{} (loading)", row.name)
        };
        let mut visible = row.visible;
        if ui.checkbox(&label, &mut visible) {
            scene.set_visible(row.id, visible);
        }
    }
}
