use image::{DynamicImage, GenericImageView};
use log::debug;

use crate::error::BeadError;

/// The source image resampled to one RGBA sample per bead cell. Row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridSample {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl GridSample {
    /// Wrap pre-sampled pixels. Returns `None` when the buffer does not match
    /// the dimensions or a dimension is zero.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }
}

/// Grid height for a given width, keeping the source aspect ratio. Never below 1.
pub fn grid_dimensions(src_w: u32, src_h: u32, grid_width: u32) -> Result<(u32, u32), BeadError> {
    if src_w == 0 || src_h == 0 {
        return Err(BeadError::InvalidImage(format!(
            "image dimensions cannot be zero, got {src_w}x{src_h}"
        )));
    }
    let grid_width = grid_width.max(1);
    let aspect = src_h as f64 / src_w as f64;
    let grid_height = (grid_width as f64 * aspect).round().max(1.0) as u32;
    Ok((grid_width, grid_height))
}

/// Resample `img` onto a `grid_width`-wide grid with box (area) filtering.
pub fn sample_grid(img: &DynamicImage, grid_width: u32) -> Result<GridSample, BeadError> {
    let (in_w, in_h) = img.dimensions();
    let (out_w, out_h) = grid_dimensions(in_w, in_h, grid_width)?;
    debug!("sampling {in_w}x{in_h} image onto a {out_w}x{out_h} grid");

    let raw = img.to_rgba8().into_raw();
    let pixels = resample_box(&raw, in_w, in_h, out_w, out_h);
    Ok(GridSample {
        width: out_w,
        height: out_h,
        pixels,
    })
}

/// Per output index, the contributing input indices and their coverage.
fn box_weights(in_len: u32, out_len: u32) -> Vec<Vec<(usize, f32)>> {
    let scale = in_len as f32 / out_len as f32;
    (0..out_len)
        .map(|o| {
            let start = o as f32 * scale;
            let end = ((o + 1) as f32 * scale).min(in_len as f32);
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(in_len);
            (first..last)
                .filter_map(|i| {
                    let cover = end.min((i + 1) as f32) - start.max(i as f32);
                    (cover > 0.0).then_some((i as usize, cover))
                })
                .collect()
        })
        .collect()
}

/// Area-average `raw` (RGBA8, `in_w`x`in_h`) down or up to `out_w`x`out_h`.
///
/// Colour is averaged premultiplied by alpha so fully transparent pixels do not
/// bleed their (meaningless) RGB into neighbours. Runs as a vertical pass
/// followed by a horizontal pass.
fn resample_box(raw: &[u8], in_w: u32, in_h: u32, out_w: u32, out_h: u32) -> Vec<[u8; 4]> {
    // Fast path – no scaling required.
    if out_w == in_w && out_h == in_h {
        return raw
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
    }

    // --------------------------------------------------------
    // First pass: vertical reduction (premultiplied, in_w × out_h)
    // --------------------------------------------------------
    let rows = box_weights(in_h, out_h);
    let mut vertical: Vec<[f32; 4]> = vec![[0.0; 4]; (in_w * out_h) as usize];

    for (y_out, taps) in rows.iter().enumerate() {
        let total: f32 = taps.iter().map(|(_, w)| w).sum();
        for x in 0..in_w as usize {
            let mut acc = [0.0f32; 4];
            for &(y, w) in taps {
                let idx = (y * in_w as usize + x) * 4;
                let a = raw[idx + 3] as f32 * w;
                acc[0] += raw[idx] as f32 * a;
                acc[1] += raw[idx + 1] as f32 * a;
                acc[2] += raw[idx + 2] as f32 * a;
                acc[3] += a;
            }
            for channel in &mut acc {
                *channel /= total;
            }
            vertical[y_out * in_w as usize + x] = acc;
        }
    }

    // --------------------------------------------------------
    // Second pass: horizontal reduction (out_w × out_h)
    // --------------------------------------------------------
    let cols = box_weights(in_w, out_w);
    let mut out = Vec::with_capacity((out_w * out_h) as usize);

    for y_out in 0..out_h as usize {
        for taps in &cols {
            let total: f32 = taps.iter().map(|(_, w)| w).sum();
            let mut acc = [0.0f32; 4];
            for &(x, w) in taps {
                let px = vertical[y_out * in_w as usize + x];
                for (sum, value) in acc.iter_mut().zip(px) {
                    *sum += value * w;
                }
            }
            out.push(unpremultiply(acc, total));
        }
    }

    out
}

fn unpremultiply(acc: [f32; 4], total: f32) -> [u8; 4] {
    let alpha = acc[3] / total;
    if alpha <= 0.0 {
        return [0, 0, 0, 0];
    }
    let channel = |v: f32| (v / acc[3]).round().clamp(0.0, 255.0) as u8;
    [
        channel(acc[0]),
        channel(acc[1]),
        channel(acc[2]),
        alpha.round().clamp(0.0, 255.0) as u8,
    ]
}
