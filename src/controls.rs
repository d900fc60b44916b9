//! Control strip under the canvas: open-file and record/stop buttons.

use egui::{Button, Color32, Frame, Margin, RichText, TopBottomPanel};

use crate::params::{CanvasConfig, ControlsConfig};

pub const OPEN_LABEL: &str = "Open File";
pub const START_LABEL: &str = "Start Recording";
pub const STOP_LABEL: &str = "Stop Recording";

const STRIP_GRAY: u8 = 45;
const RECORDING_FILL: Color32 = Color32::from_rgb(200, 40, 40);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    OpenFile,
    Record,
}

/// Text on the record button
pub fn record_label(recording: bool) -> &'static str {
    if recording {
        STOP_LABEL
    } else {
        START_LABEL
    }
}

/// Window layout: canvas on top, a fixed-height egui strip below.
#[derive(Debug, Clone)]
pub struct ControlStrip {
    canvas_width: u32,
    canvas_height: u32,
    strip_height: u32,
    margin: u32,
    button_width: u32,
}

impl ControlStrip {
    pub fn new(canvas: &CanvasConfig, config: &ControlsConfig) -> Self {
        Self {
            canvas_width: canvas.width,
            canvas_height: canvas.height,
            strip_height: config.strip_height,
            margin: config.margin,
            button_width: config.button_width,
        }
    }

    /// Logical window size (canvas plus strip)
    pub fn frame_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height + self.strip_height)
    }

    /// Strip height in logical points
    pub fn strip_height(&self) -> f32 {
        self.strip_height as f32
    }

    /// Lay out the strip for this pass; returns the control clicked, if any.
    pub fn show(&self, ctx: &egui::Context, recording: bool) -> Option<Control> {
        let margin = self.margin as f32;
        let button_size = egui::vec2(
            self.button_width as f32,
            (self.strip_height as f32 - margin).max(1.0),
        );
        let mut clicked = None;

        TopBottomPanel::bottom("controls")
            .exact_height(self.strip_height())
            .resizable(false)
            .show_separator_line(false)
            .frame(
                Frame::none()
                    .fill(Color32::from_gray(STRIP_GRAY))
                    .inner_margin(Margin::symmetric(margin, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.spacing_mut().item_spacing.x = margin;

                    if ui.add_sized(button_size, Button::new(OPEN_LABEL)).clicked() {
                        clicked = Some(Control::OpenFile);
                    }

                    let mut record =
                        Button::new(RichText::new(record_label(recording)).color(Color32::WHITE));
                    if recording {
                        record = record.fill(RECORDING_FILL);
                    }
                    if ui.add_sized(button_size, record).clicked() {
                        clicked = Some(Control::Record);
                    }
                });
            });

        clicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> ControlStrip {
        ControlStrip::new(&CanvasConfig::default(), &ControlsConfig::default())
    }

    fn collect_text(shape: &egui::Shape, out: &mut Vec<String>) {
        match shape {
            egui::Shape::Vec(shapes) => shapes.iter().for_each(|s| collect_text(s, out)),
            egui::Shape::Text(text) => out.push(text.galley.text().to_string()),
            _ => {}
        }
    }

    /// Run one headless UI pass and return every painted string.
    fn painted_text(strip: &ControlStrip, recording: bool) -> Vec<String> {
        let (width, height) = strip.frame_size();
        let ctx = egui::Context::default();
        let input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(width as f32, height as f32),
            )),
            ..Default::default()
        };

        let output = ctx.run(input, |ctx| {
            strip.show(ctx, recording);
        });

        let mut text = Vec::new();
        for clipped in &output.shapes {
            collect_text(&clipped.shape, &mut text);
        }
        text
    }

    #[test]
    fn test_frame_adds_strip_below_canvas() {
        assert_eq!(strip().frame_size(), (640, 400));
        assert_eq!(strip().strip_height(), 40.0);
    }

    #[test]
    fn test_record_label_follows_state() {
        assert_eq!(record_label(false), "Start Recording");
        assert_eq!(record_label(true), "Stop Recording");
    }

    #[test]
    fn test_idle_strip_shows_start_label() {
        let text = painted_text(&strip(), false);
        assert!(text.iter().any(|t| t == OPEN_LABEL));
        assert!(text.iter().any(|t| t == START_LABEL));
        assert!(!text.iter().any(|t| t == STOP_LABEL));
    }

    #[test]
    fn test_recording_strip_shows_stop_label() {
        let text = painted_text(&strip(), true);
        assert!(text.iter().any(|t| t == OPEN_LABEL));
        assert!(text.iter().any(|t| t == STOP_LABEL));
        assert!(!text.iter().any(|t| t == START_LABEL));
    }

    #[test]
    fn test_no_click_without_input() {
        let ctx = egui::Context::default();
        let mut clicked = Some(Control::OpenFile);
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            clicked = strip().show(ctx, false);
        });
        assert_eq!(clicked, None);
    }
}
