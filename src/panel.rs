//! Live-tunable visual parameters and the panel that edits them.
//!
//! [`Tunables`] holds the values; the egui panel (behind the `egui` feature)
//! edits them in place and reports which fields changed so the session can
//! apply them to the active scene immediately.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const POINT_SIZE_RANGE: RangeInclusive<f32> = 0.5..=16.0;
pub const DISPERSION_RANGE: RangeInclusive<f32> = 10.0..=3000.0;

/// Where the image scene takes point colors from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSource {
    /// Every point uses the tint color.
    #[default]
    Tint,
    /// Source pixel color multiplied by the tint.
    Pixel,
}

/// Startup visual settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Tint color, RGB 0-1.
    pub color: [f32; 3],
    /// Point diameter in pixels.
    pub point_size: f32,
    /// Ambient Y rotation of the image scene, radians per frame.
    pub rotation_speed: f32,
    pub color_source: ColorSource,
    /// Show the parameter panel at startup.
    pub show_panel: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            color: [0.35, 0.75, 1.0],
            point_size: 3.0,
            rotation_speed: 0.002,
            color_source: ColorSource::Tint,
            show_panel: true,
        }
    }
}

impl VisualConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.point_size > 0.0) {
            return Err(ConfigError::invalid(
                "visual.point_size",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// The values the panel edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunables {
    pub color: [f32; 3],
    pub point_size: f32,
    pub dispersion: f32,
}

impl Tunables {
    pub fn new(color: [f32; 3], point_size: f32, dispersion: f32) -> Self {
        Self {
            color,
            point_size,
            dispersion,
        }
        .clamped()
    }

    /// Clamp every field into its widget range.
    pub fn clamped(self) -> Self {
        Self {
            color: self.color.map(|c| c.clamp(0.0, 1.0)),
            point_size: self
                .point_size
                .clamp(*POINT_SIZE_RANGE.start(), *POINT_SIZE_RANGE.end()),
            dispersion: self
                .dispersion
                .clamp(*DISPERSION_RANGE.start(), *DISPERSION_RANGE.end()),
        }
    }
}

/// Which tunables changed in one panel frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelChange {
    pub color: bool,
    pub point_size: bool,
    pub dispersion: bool,
}

impl PanelChange {
    pub fn any(&self) -> bool {
        self.color || self.point_size || self.dispersion
    }

    /// Field-by-field comparison of two tunable snapshots.
    pub fn between(before: &Tunables, after: &Tunables) -> Self {
        Self {
            color: before.color != after.color,
            point_size: before.point_size != after.point_size,
            dispersion: before.dispersion != after.dispersion,
        }
    }
}

/// Draw the parameter panel. `show_dispersion` hides the dispersion slider
/// for scenes without a dispersed start state.
#[cfg(feature = "egui")]
pub fn show(ctx: &egui::Context, tunables: &mut Tunables, show_dispersion: bool) -> PanelChange {
    let before = *tunables;

    egui::Window::new("Parameters")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Color");
                ui.color_edit_button_rgb(&mut tunables.color);
            });
            ui.add(egui::Slider::new(&mut tunables.point_size, POINT_SIZE_RANGE).text("Size"));
            if show_dispersion {
                ui.add(
                    egui::Slider::new(&mut tunables.dispersion, DISPERSION_RANGE)
                        .logarithmic(true)
                        .text("Dispersion"),
                );
            }
        });

    PanelChange::between(&before, tunables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped() {
        let t = Tunables::new([1.5, -0.2, 0.5], 100.0, 1.0);
        assert_eq!(t.color, [1.0, 0.0, 0.5]);
        assert_eq!(t.point_size, 16.0);
        assert_eq!(t.dispersion, 10.0);
    }

    #[test]
    fn test_change_detection() {
        let a = Tunables::new([0.1, 0.2, 0.3], 3.0, 800.0);
        let mut b = a;
        assert!(!PanelChange::between(&a, &b).any());
        b.point_size = 4.0;
        let change = PanelChange::between(&a, &b);
        assert!(change.point_size && !change.color && !change.dispersion);
    }
}
