//! Text drawn straight into canvas pixels.
//!
//! Glyphs come from egui's font atlas (the same fonts the control strip uses),
//! so anything written here also ends up in snapshots and recordings.

use egui::epaint::text::{FontDefinitions, Fonts};
use egui::{Color32, FontId};
use image::Rgba;

use crate::canvas::Canvas;

const ATLAS_SIDE: usize = 2048;

pub struct TextPainter {
    fonts: Fonts,
}

impl Default for TextPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextPainter {
    pub fn new() -> Self {
        Self {
            fonts: Fonts::new(1.0, ATLAS_SIDE, FontDefinitions::default()),
        }
    }

    /// Draw one line of `text` centered on `(cx, cy)`.
    ///
    /// `size` is the font height in pixels. Returns the number of pixels
    /// touched.
    pub fn draw_centered(
        &self,
        canvas: &mut Canvas,
        text: &str,
        size: f32,
        (cx, cy): (f32, f32),
        color: Rgba<u8>,
    ) -> usize {
        let galley =
            self.fonts
                .layout_no_wrap(text.to_string(), FontId::proportional(size), Color32::WHITE);
        // Glyphs are rasterized into the atlas during layout
        let atlas = self.fonts.image();
        let [atlas_width, _] = atlas.size;

        let origin = galley.size() * -0.5 + egui::vec2(cx, cy);
        let mut touched = 0;

        for row in &galley.rows {
            for glyph in &row.glyphs {
                let uv = glyph.uv_rect;
                if uv.is_nothing() {
                    continue;
                }

                let left = (origin.x + glyph.pos.x + uv.offset.x).round() as i64;
                let top = (origin.y + glyph.pos.y + uv.offset.y).round() as i64;

                for v in uv.min[1]..uv.max[1] {
                    for u in uv.min[0]..uv.max[0] {
                        let coverage = atlas.pixels[v as usize * atlas_width + u as usize];
                        let x = left + (u - uv.min[0]) as i64;
                        let y = top + (v - uv.min[1]) as i64;
                        if canvas.blend_pixel(x, y, color, coverage) {
                            touched += 1;
                        }
                    }
                }
            }
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::gray;

    fn changed_in(canvas: &Canvas, background: Rgba<u8>, rows: std::ops::Range<u32>) -> usize {
        rows.flat_map(|y| (0..canvas.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y) != background)
            .count()
    }

    #[test]
    fn test_text_lands_around_center() {
        let painter = TextPainter::new();
        let mut canvas = Canvas::new(200, 60, gray(30));

        let touched = painter.draw_centered(&mut canvas, "Hello", 18.0, (100.0, 30.0), gray(200));
        assert!(touched > 0);

        assert!(changed_in(&canvas, gray(30), 15..45) > 0);
        assert_eq!(changed_in(&canvas, gray(30), 0..8), 0);
        assert_eq!(changed_in(&canvas, gray(30), 52..60), 0);
        assert_eq!(canvas.pixel(0, 30), gray(30));
        assert_eq!(canvas.pixel(199, 30), gray(30));
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let painter = TextPainter::new();
        let mut canvas = Canvas::new(20, 20, gray(30));
        assert_eq!(painter.draw_centered(&mut canvas, "", 18.0, (10.0, 10.0), gray(200)), 0);
    }

    #[test]
    fn test_text_off_canvas_is_clipped() {
        let painter = TextPainter::new();
        let mut canvas = Canvas::new(20, 20, gray(30));
        let touched = painter.draw_centered(&mut canvas, "Hello", 18.0, (-500.0, 10.0), gray(200));
        assert_eq!(touched, 0);
    }
}
