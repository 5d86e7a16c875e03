//! Tiled CPU rendering
//!
//! The frame is split into horizontal strips computed top to bottom. Each
//! strip carries its own vertical offset so the compositor can place tiles in
//! any arrival order - only the final raster matters.

use serde::{Deserialize, Serialize};

use super::evaluate::FractalView;

/// One horizontal strip of the output raster, RGBA row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub y_offset: u32,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Tile {
    /// Copy this strip into a full-frame RGBA buffer.
    ///
    /// Strips that fall wholly or partly past the end of the frame are
    /// clipped, not an error: a stale tile may arrive after a resize shrank
    /// the target.
    pub fn composite_into(&self, frame: &mut [u8], frame_width: u32) {
        debug_assert_eq!(self.width, frame_width);
        let start = (self.y_offset * frame_width * 4) as usize;
        if start >= frame.len() {
            return;
        }
        let len = self.pixels.len().min(frame.len() - start);
        frame[start..start + len].copy_from_slice(&self.pixels[..len]);
    }
}

/// Strip-at-a-time renderer over a fixed view.
///
/// Yields tiles top to bottom; the caller decides how many strips to compute
/// per slice of time (the background job computes them all, the wasm loop
/// takes one per frame).
#[derive(Debug, Clone)]
pub struct TileRenderer {
    view: FractalView,
    tile_height: u32,
    next_y: u32,
}

impl TileRenderer {
    pub fn new(view: FractalView, tile_height: u32) -> Self {
        Self {
            view,
            tile_height: tile_height.max(1),
            next_y: 0,
        }
    }

    pub fn view(&self) -> &FractalView {
        &self.view
    }

    /// Fraction of rows already rendered, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.view.height == 0 {
            return 1.0;
        }
        (self.next_y as f32 / self.view.height as f32).min(1.0)
    }

    pub fn is_done(&self) -> bool {
        self.next_y >= self.view.height
    }

    fn render_strip(&self, y_offset: u32, height: u32) -> Tile {
        let width = self.view.width;
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        let mut di = 0;

        for py in y_offset..y_offset + height {
            for px in 0..width {
                let rgba = self.view.shade(px, py);
                pixels[di..di + 4].copy_from_slice(&rgba);
                di += 4;
            }
        }

        Tile {
            y_offset,
            width,
            height,
            pixels,
        }
    }
}

impl Iterator for TileRenderer {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.is_done() {
            return None;
        }
        let y = self.next_y;
        let h = self.tile_height.min(self.view.height - y);
        self.next_y += h;
        Some(self.render_strip(y, h))
    }
}

/// Render a whole frame synchronously into one RGBA buffer.
pub fn render_frame(view: &FractalView, tile_height: u32) -> Vec<u8> {
    let mut frame = vec![0u8; (view.width * view.height * 4) as usize];
    for tile in TileRenderer::new(*view, tile_height) {
        tile.composite_into(&mut frame, view.width);
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractal::params::{ComplexParameter, FractalFormula, RenderParams};

    fn small_view(width: u32, height: u32) -> FractalView {
        FractalView::new(
            width,
            height,
            ComplexParameter::new(-0.5, 0.0),
            FractalFormula::Mandelbrot,
            RenderParams::derive(0.0, 0),
        )
    }

    #[test]
    fn test_tiles_cover_frame_exactly() {
        let view = small_view(16, 50);
        let tiles: Vec<Tile> = TileRenderer::new(view, 16).collect();

        // 50 rows in strips of 16: 16 + 16 + 16 + 2
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles.last().unwrap().height, 2);
        let total_rows: u32 = tiles.iter().map(|t| t.height).sum();
        assert_eq!(total_rows, 50);

        // Top to bottom, no gaps
        let mut y = 0;
        for tile in &tiles {
            assert_eq!(tile.y_offset, y);
            assert_eq!(tile.pixels.len(), (tile.width * tile.height * 4) as usize);
            y += tile.height;
        }
    }

    #[test]
    fn test_out_of_order_composition_matches_in_order() {
        let view = small_view(12, 24);
        let tiles: Vec<Tile> = TileRenderer::new(view, 8).collect();

        let mut in_order = vec![0u8; (view.width * view.height * 4) as usize];
        for tile in &tiles {
            tile.composite_into(&mut in_order, view.width);
        }

        let mut reversed = vec![0u8; in_order.len()];
        for tile in tiles.iter().rev() {
            tile.composite_into(&mut reversed, view.width);
        }

        assert_eq!(in_order, reversed);
    }

    #[test]
    fn test_composite_past_frame_end_is_clipped() {
        let view = small_view(8, 16);
        let tiles: Vec<Tile> = TileRenderer::new(view, 8).collect();

        // A frame shrunk to 8 rows: the first strip fits, the second starts
        // exactly at the end and must be dropped without panicking
        let mut shrunk = vec![0u8; (8 * 8 * 4) as usize];
        for tile in &tiles {
            tile.composite_into(&mut shrunk, view.width);
        }
        assert_eq!(&shrunk[..], &tiles[0].pixels[..]);

        // Partial overlap clips to the rows that still exist
        let mut partial = vec![0u8; (8 * 12 * 4) as usize];
        for tile in &tiles {
            tile.composite_into(&mut partial, view.width);
        }
        let tail = &partial[(8 * 8 * 4) as usize..];
        assert_eq!(tail, &tiles[1].pixels[..tail.len()]);
    }

    #[test]
    fn test_render_frame_matches_direct_shading() {
        let view = small_view(10, 10);
        let frame = render_frame(&view, 3);

        for py in 0..view.height {
            for px in 0..view.width {
                let i = ((py * view.width + px) * 4) as usize;
                assert_eq!(&frame[i..i + 4], &view.shade(px, py));
            }
        }
    }

    #[test]
    fn test_progress_advances_to_done() {
        let view = small_view(8, 32);
        let mut renderer = TileRenderer::new(view, 16);
        assert_eq!(renderer.progress(), 0.0);
        renderer.next();
        assert!((renderer.progress() - 0.5).abs() < f32::EPSILON);
        renderer.next();
        assert!(renderer.is_done());
        assert!(renderer.next().is_none());
    }
}
