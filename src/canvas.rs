//! Fixed-size RGBA drawing surface.

use std::path::Path;

use image::{Rgba, RgbaImage};

/// Opaque RGB color
pub fn rgb(r: u8, g: u8, b: u8) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

/// Gray level helper
pub fn gray(level: u8) -> Rgba<u8> {
    rgb(level, level, level)
}

/// CPU pixel buffer the visualizer draws into and the recorder captures.
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    /// Fill the axis-aligned rectangle at `(x, y)` of size `w × h`.
    ///
    /// Edges are rounded to the nearest pixel and clipped to the canvas.
    /// Returns the number of pixels written.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) -> usize {
        if !(w > 0.0 && h > 0.0) {
            return 0;
        }

        let x0 = clip(x, self.width());
        let x1 = clip(x + w, self.width());
        let y0 = clip(y, self.height());
        let y1 = clip(y + h, self.height());

        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, color);
            }
        }
        ((x1 - x0) * (y1 - y0)) as usize
    }

    /// Mix `color` into the pixel at `(x, y)` with weight `alpha` (0..=1).
    ///
    /// Positions outside the canvas are skipped; returns whether a pixel changed.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba<u8>, alpha: f32) -> bool {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return false;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha == 0.0 {
            return false;
        }

        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        for c in 0..3 {
            let mixed = pixel[c] as f32 + (color[c] as f32 - pixel[c] as f32) * alpha;
            pixel[c] = mixed.round() as u8;
        }
        true
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Raw RGBA bytes, row-major, top row first
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Save the current contents as a PNG image.
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        self.image.save_with_format(path, image::ImageFormat::Png)
    }
}

fn clip(value: f32, limit: u32) -> u32 {
    value.round().clamp(0.0, limit as f32) as u32
}
