//! Transparency masking, optional posterization, and frequency-based palette
//! reduction of a sampled grid.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::color::Color;
use crate::config::ColorLimit;
use crate::sampler::GridSample;

/// Samples with alpha below this are empty cells and never get a bead.
pub const ALPHA_THRESHOLD: u8 = 50;

/// One color of the final palette and the number of cells that use it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub color: Color,
    pub count: usize,
}

/// Final per-cell colors plus the palette they are drawn from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReducedGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<Color>>,
    palette: Vec<PaletteEntry>,
}

impl ReducedGrid {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major cells; `None` marks an empty (transparent) cell.
    pub fn cells(&self) -> &[Option<Color>] {
        &self.cells
    }

    pub fn cell(&self, x: u32, y: u32) -> Option<Color> {
        self.cells[(y * self.width + x) as usize]
    }

    /// Unique final colors, in first-seen order when no reduction ran and in
    /// descending-frequency order when it did.
    pub fn palette(&self) -> &[PaletteEntry] {
        &self.palette
    }

    pub fn filled_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Reduce `sample` to its final bead colors.
///
/// Distinct colors are counted after the optional posterize step. When `limit`
/// is finite and exceeded, the `limit` most frequent colors are kept (ties keep
/// first-seen order) and every other color maps to its nearest kept color by
/// squared RGB distance (ties keep the more frequent one).
pub fn reduce_palette(sample: &GridSample, no_gradient: bool, limit: ColorLimit) -> ReducedGrid {
    let mut cells: Vec<Option<Color>> = Vec::with_capacity(sample.pixels().len());
    let mut counts: IndexMap<Color, usize> = IndexMap::new();

    // ----------------------
    // 1. Mask, quantize and count
    // ----------------------
    for &[r, g, b, a] in sample.pixels() {
        if a < ALPHA_THRESHOLD {
            cells.push(None);
            continue;
        }
        let mut color = Color::new(r, g, b);
        if no_gradient {
            color = color.posterize();
        }
        *counts.entry(color).or_insert(0) += 1;
        cells.push(Some(color));
    }

    debug!(
        "{} of {} cells filled, {} distinct colors",
        counts.values().sum::<usize>(),
        cells.len(),
        counts.len()
    );

    // ----------------------
    // 2. Reduce if over the limit
    // ----------------------
    let palette = match limit.limit() {
        Some(max_colors) if counts.len() > max_colors => {
            let kept = most_frequent(&counts, max_colors);
            debug!("reducing {} colors to {}", counts.len(), kept.len());
            remap_to_nearest(&mut cells, &kept)
        }
        _ => counts
            .into_iter()
            .map(|(color, count)| PaletteEntry { color, count })
            .collect(),
    };

    ReducedGrid {
        width: sample.width(),
        height: sample.height(),
        cells,
        palette,
    }
}

/// The `n` most frequent colors, highest first. The sort is stable so equal
/// counts stay in first-seen order.
fn most_frequent(counts: &IndexMap<Color, usize>, n: usize) -> Vec<Color> {
    let mut sorted: Vec<(Color, usize)> = counts.iter().map(|(&c, &count)| (c, count)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted.into_iter().take(n).map(|(c, _)| c).collect()
}

/// Closest color in `kept`; on equal distance the earlier entry wins.
pub fn nearest_color(color: Color, kept: &[Color]) -> Option<Color> {
    let mut best: Option<(Color, u32)> = None;
    for &candidate in kept {
        let dist = color.distance_sq(candidate);
        if best.is_none_or(|(_, best_dist)| dist < best_dist) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(c, _)| c)
}

/// Rewrite every filled cell to its nearest kept color and return the kept
/// colors with their new counts.
fn remap_to_nearest(cells: &mut [Option<Color>], kept: &[Color]) -> Vec<PaletteEntry> {
    let mut cache: HashMap<Color, Color> = kept.iter().map(|&c| (c, c)).collect();
    let mut final_counts: IndexMap<Color, usize> = kept.iter().map(|&c| (c, 0)).collect();

    for cell in cells.iter_mut() {
        let Some(original) = *cell else { continue };
        let mapped = match cache.get(&original) {
            Some(&mapped) => mapped,
            None => {
                // `kept` is never empty here: the limit is at least 1.
                let mapped = nearest_color(original, kept).unwrap_or(original);
                cache.insert(original, mapped);
                mapped
            }
        };
        *cell = Some(mapped);
        *final_counts.entry(mapped).or_insert(0) += 1;
    }

    final_counts
        .into_iter()
        .map(|(color, count)| PaletteEntry { color, count })
        .collect()
}
