use crate::density::colormap::{ColorMapper, Rgba};
use crate::density::grid::DensityGrid;
use crate::prelude::OverlayConfig;

/// Transparent RGBA raster sized to a tile's viewport.
///
/// The surface is handed to the surrounding layout to be stacked above the
/// live camera image and below any click-handling layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.rgba
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Resets every pixel to fully transparent.
    pub fn clear(&mut self) {
        self.rgba.fill(0);
    }

    /// Resizes to the viewport, clearing the content either way.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.rgba = vec![0; (width as usize) * (height as usize) * 4];
        } else {
            self.clear();
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let offset = ((y as usize) * (self.width as usize) + x as usize) * 4;
        Rgba {
            r: self.rgba[offset],
            g: self.rgba[offset + 1],
            b: self.rgba[offset + 2],
            a: self.rgba[offset + 3],
        }
    }

    fn fill_rect(&mut self, x: u32, y: u32, rect_width: u32, rect_height: u32, color: Rgba) {
        let x_end = (x + rect_width).min(self.width);
        let y_end = (y + rect_height).min(self.height);
        for row in y..y_end {
            let row_offset = (row as usize) * (self.width as usize);
            for col in x..x_end {
                let offset = (row_offset + col as usize) * 4;
                self.rgba[offset] = color.r;
                self.rgba[offset + 1] = color.g;
                self.rgba[offset + 2] = color.b;
                self.rgba[offset + 3] = color.a;
            }
        }
    }

    /// Lighten-composites this overlay onto an opaque base frame:
    /// `C = (1 - a) * Cb + a * max(Cs, Cb)` per channel, so the overlay
    /// only ever brightens the underlying camera image.
    pub fn composite_lighten(&self, base: &mut PixelSurface) {
        let width = self.width.min(base.width);
        let height = self.height.min(base.height);
        for y in 0..height {
            for x in 0..width {
                let src = self.pixel(x, y);
                if src.a == 0 {
                    continue;
                }
                let alpha = src.a as f32 / 255.0;
                let offset = ((y as usize) * (base.width as usize) + x as usize) * 4;
                for (channel, src_channel) in [src.r, src.g, src.b].iter().enumerate() {
                    let below = base.rgba[offset + channel] as f32;
                    let above = (*src_channel as f32).max(below);
                    base.rgba[offset + channel] =
                        ((1.0 - alpha) * below + alpha * above).round() as u8;
                }
            }
        }
    }
}

/// Paints a normalized density grid onto a transparent surface, skipping
/// negligible cells.
pub struct SurfaceRenderer;

impl SurfaceRenderer {
    /// Clears the surface, then fills the pixel region of every cell whose
    /// value exceeds the render threshold with its gradient color. Cells at
    /// or below the threshold stay fully transparent.
    pub fn paint(grid: &DensityGrid, config: &OverlayConfig, surface: &mut PixelSurface) {
        surface.clear();
        if surface.is_empty() {
            return;
        }
        let cell = grid.cell_size();
        for (row, col, value) in grid.iter_cells() {
            if value <= config.min_render_threshold {
                continue;
            }
            let color = ColorMapper::map(value);
            surface.fill_rect(col as u32 * cell, row as u32 * cell, cell, cell, color);
        }
    }
}
