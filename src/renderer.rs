use image::{Rgba, RgbaImage};

use crate::color::Color;
use crate::config::BeadStyle;
use crate::reducer::ReducedGrid;

fn opaque(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

/// Surface size in pixels for a `grid_w`x`grid_h` grid.
pub fn surface_size(grid_w: u32, grid_h: u32, style: &BeadStyle) -> (u32, u32) {
    (grid_w * style.bead_size, grid_h * style.bead_size)
}

/// Draw `grid` as circular beads on a background, optionally over grid lines.
///
/// Each filled cell becomes a disc centred in its cell with radius
/// `(bead_size - gap) / 2`. A pixel is painted when its centre lies inside the
/// disc. Empty cells leave the background showing.
pub fn render_pattern(grid: &ReducedGrid, style: &BeadStyle, show_grid: bool) -> RgbaImage {
    let (width, height) = surface_size(grid.width(), grid.height(), style);
    let mut canvas = RgbaImage::from_pixel(width, height, opaque(style.background));

    if show_grid {
        draw_grid_lines(&mut canvas, grid.width(), grid.height(), style);
    }

    let bead = style.bead_size as f32;
    let radius = style.bead_size.saturating_sub(style.gap) as f32 / 2.0;
    if radius <= 0.0 {
        return canvas;
    }

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let Some(color) = grid.cell(x, y) else { continue };
            let cx = (x as f32 + 0.5) * bead;
            let cy = (y as f32 + 0.5) * bead;
            fill_disc(&mut canvas, cx, cy, radius, opaque(color));
        }
    }

    canvas
}

/// One-pixel lines on every cell boundary, `0..=grid_w` and `0..=grid_h`.
/// The closing boundary falls on the surface's last row/column.
fn draw_grid_lines(canvas: &mut RgbaImage, grid_w: u32, grid_h: u32, style: &BeadStyle) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let line = opaque(style.grid_line);

    for x in 0..=grid_w {
        let px = (x * style.bead_size).min(width - 1);
        for py in 0..height {
            canvas.put_pixel(px, py, line);
        }
    }
    for y in 0..=grid_h {
        let py = (y * style.bead_size).min(height - 1);
        for px in 0..width {
            canvas.put_pixel(px, py, line);
        }
    }
}

fn fill_disc(canvas: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
    let (width, height) = canvas.dimensions();
    let r2 = radius * radius;

    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil() as u32).min(width);
    let y1 = ((cy + radius).ceil() as u32).min(height);

    for py in y0..y1 {
        let dy = py as f32 + 0.5 - cy;
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - cx;
            if dx * dx + dy * dy <= r2 {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorLimit;
    use crate::reducer::reduce_palette;
    use crate::sampler::GridSample;

    const BG: Rgba<u8> = Rgba([0x12, 0x12, 0x12, 255]);
    const LINE: Rgba<u8> = Rgba([0x33, 0x33, 0x33, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn red_and_empty() -> ReducedGrid {
        let sample = GridSample::from_pixels(2, 1, vec![[255, 0, 0, 255], [0, 0, 0, 10]]).unwrap();
        reduce_palette(&sample, false, ColorLimit::Max)
    }

    #[test]
    fn surface_is_grid_times_bead_size() {
        let img = render_pattern(&red_and_empty(), &BeadStyle::default(), false);
        assert_eq!(img.dimensions(), (40, 20));
    }

    #[test]
    fn bead_is_centred_disc_with_gap() {
        let img = render_pattern(&red_and_empty(), &BeadStyle::default(), false);
        // centre (10, 10), radius 9: pixels 1..=18 along the axes
        assert_eq!(*img.get_pixel(10, 10), RED);
        assert_eq!(*img.get_pixel(1, 10), RED);
        assert_eq!(*img.get_pixel(18, 10), RED);
        assert_eq!(*img.get_pixel(0, 10), BG);
        assert_eq!(*img.get_pixel(19, 10), BG);
        assert_eq!(*img.get_pixel(10, 1), RED);
        assert_eq!(*img.get_pixel(10, 0), BG);
        // corners of the cell stay background
        assert_eq!(*img.get_pixel(2, 2), BG);
    }

    #[test]
    fn empty_cells_draw_nothing() {
        let img = render_pattern(&red_and_empty(), &BeadStyle::default(), false);
        for y in 0..20 {
            for x in 20..40 {
                assert_eq!(*img.get_pixel(x, y), BG);
            }
        }
    }

    #[test]
    fn grid_lines_sit_under_beads() {
        let img = render_pattern(&red_and_empty(), &BeadStyle::default(), true);
        assert_eq!(*img.get_pixel(0, 0), LINE);
        assert_eq!(*img.get_pixel(20, 7), LINE);
        assert_eq!(*img.get_pixel(39, 7), LINE);
        assert_eq!(*img.get_pixel(25, 19), LINE);
        assert_eq!(*img.get_pixel(25, 7), BG);
        assert_eq!(*img.get_pixel(10, 10), RED);
    }

    #[test]
    fn gap_as_large_as_bead_draws_no_beads() {
        let style = BeadStyle {
            gap: 20,
            ..BeadStyle::default()
        };
        let img = render_pattern(&red_and_empty(), &style, false);
        assert!(img.pixels().all(|p| *p == BG));
    }

    #[test]
    fn zero_gap_beads_touch() {
        let style = BeadStyle {
            bead_size: 10,
            gap: 0,
            ..BeadStyle::default()
        };
        let sample = GridSample::from_pixels(2, 1, vec![[255, 0, 0, 255]; 2]).unwrap();
        let grid = reduce_palette(&sample, false, ColorLimit::Max);
        let img = render_pattern(&grid, &style, false);
        assert_eq!(*img.get_pixel(9, 5), RED);
        assert_eq!(*img.get_pixel(10, 5), RED);
    }
}
