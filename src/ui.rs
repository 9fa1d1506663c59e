//! Egui panels: galaxy parameters and performance overlay.

use crate::params::{
    Color, GalaxyParameters, BRANCHES_RANGE, COUNT_RANGE, RADIUS_RANGE, RANDOMNESS_POWER_RANGE,
    RANDOMNESS_RANGE,
};

/// Figures shown in the performance window.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerfStats {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub particle_count: u32,
    pub regenerating: bool,
}

/// Draw the parameter window. Returns true if any parameter changed.
pub fn parameter_window(
    ctx: &egui::Context,
    params: &mut GalaxyParameters,
    show_perf: &mut bool,
) -> bool {
    let mut changed = false;

    egui::Window::new("Galaxy")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            changed = render_parameters_panel(ui, params);

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Reset").clicked() {
                    let defaults = GalaxyParameters::default();
                    if *params != defaults {
                        *params = defaults;
                        changed = true;
                    }
                }
                ui.checkbox(show_perf, "Show performance");
            });
        });

    changed
}

pub fn render_parameters_panel(ui: &mut egui::Ui, params: &mut GalaxyParameters) -> bool {
    let mut changed = false;

    ui.heading("Shape");

    changed |= ui
        .add(
            egui::Slider::new(&mut params.count, COUNT_RANGE)
                .logarithmic(true)
                .step_by(100.0)
                .text("Count"),
        )
        .changed();
    changed |= ui
        .add(
            egui::Slider::new(&mut params.radius, RADIUS_RANGE)
                .step_by(0.01)
                .text("Radius"),
        )
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut params.branches, BRANCHES_RANGE).text("Branches"))
        .changed();
    changed |= ui
        .add(
            egui::Slider::new(&mut params.randomness, RANDOMNESS_RANGE)
                .step_by(0.001)
                .text("Randomness"),
        )
        .changed();
    changed |= ui
        .add(
            egui::Slider::new(&mut params.randomness_power, RANDOMNESS_POWER_RANGE)
                .step_by(0.001)
                .text("Randomness Power"),
        )
        .changed();

    ui.add_space(4.0);
    ui.heading("Colors");

    changed |= color_row(ui, "Inside:", &mut params.inside_color);
    changed |= color_row(ui, "Outside:", &mut params.outside_color);

    changed
}

fn color_row(ui: &mut egui::Ui, label: &str, color: &mut Color) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        let mut rgb = color.to_array();
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            *color = Color::from_array(rgb);
            changed = true;
        }
        ui.monospace(color.to_string());
    });
    changed
}

/// Small always-on-top window with frame timing.
pub fn perf_window(ctx: &egui::Context, stats: &PerfStats) {
    egui::Window::new("Performance")
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
        .resizable(false)
        .collapsible(false)
        .title_bar(false)
        .show(ctx, |ui| {
            ui.monospace(format!("{:>7.1} FPS", stats.fps));
            ui.monospace(format!("{:>7.2} ms", stats.frame_time_ms));
            ui.monospace(format!("{:>7} particles", stats.particle_count));
            if stats.regenerating {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("regenerating");
                });
            }
        });
}
