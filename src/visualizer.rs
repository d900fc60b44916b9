//! Bar-spectrum drawing.

use image::Rgba;

use crate::analyzer::SpectralFrame;
use crate::canvas::{gray, rgb, Canvas};
use crate::params::CanvasConfig;
use crate::text::TextPainter;

/// Shown on the canvas until the first track loads
pub const PROMPT: &str = "Upload MP3 to visualize and export as .webm";

const PROMPT_SIZE: f32 = 18.0;
const PROMPT_GRAY: u8 = 200;

/// One bar in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgba<u8>,
}

/// Color of the bar at `index`: warm-to-cool sweep across the spectrum.
pub fn bar_color(index: usize) -> Rgba<u8> {
    let step = (index * 2).min(255) as u8;
    rgb(100u8.saturating_add(step), 200, 255 - step)
}

/// Lay out one bar per value across a `width × height` surface.
///
/// Values are bytes; 255 reaches the top edge, 0 has no height.
pub fn layout_bars(values: &[u8], width: f32, height: f32, gap: f32) -> Vec<Bar> {
    if values.is_empty() {
        return Vec::new();
    }

    let slot = width / values.len() as f32;
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let y = height - (value as f32 / 255.0) * height;
            Bar {
                x: i as f32 * slot,
                y,
                width: (slot - gap).max(0.0),
                height: height - y,
                color: bar_color(i),
            }
        })
        .collect()
}

/// Draws spectral frames once enabled.
pub struct Visualizer {
    enabled: bool,
    background: Rgba<u8>,
    gap: f32,
    text: TextPainter,
}

impl Visualizer {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            enabled: false,
            background: gray(config.background),
            gap: config.bar_gap,
            text: TextPainter::new(),
        }
    }

    /// Turn drawing on. There is no way back.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Paint the idle prompt; does nothing once bars are being drawn.
    pub fn draw_prompt(&self, canvas: &mut Canvas) -> bool {
        if self.enabled {
            return false;
        }

        canvas.clear(self.background);
        let center = (canvas.width() as f32 / 2.0, canvas.height() as f32 / 2.0);
        self.text
            .draw_centered(canvas, PROMPT, PROMPT_SIZE, center, gray(PROMPT_GRAY));
        true
    }

    /// Clear `canvas` and draw `frame`, returning the number of bars drawn.
    pub fn redraw(&self, frame: &SpectralFrame, canvas: &mut Canvas) -> Option<usize> {
        if !self.enabled {
            return None;
        }

        canvas.clear(self.background);
        let bars = layout_bars(
            frame.values(),
            canvas.width() as f32,
            canvas.height() as f32,
            self.gap,
        );
        for bar in &bars {
            canvas.fill_rect(bar.x, bar.y, bar.width, bar.height, bar.color);
        }
        Some(bars.len())
    }
}
