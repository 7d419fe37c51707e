use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{debug, info};

use crate::config::RenderConfig;
use crate::error::BeadError;
use crate::reducer::{ReducedGrid, reduce_palette};
use crate::renderer::render_pattern;
use crate::report::{PaletteReport, palette_report};
use crate::sampler::sample_grid;

/// File name offered when the rendered pattern is exported.
pub const DEFAULT_EXPORT_NAME: &str = "bead-pattern.png";

/// Output of one full run: the bead grid, its rendering, and the palette summary.
#[derive(Clone, Debug)]
pub struct BeadPattern {
    pub grid: ReducedGrid,
    pub image: RgbaImage,
    pub report: PaletteReport,
}

impl BeadPattern {
    pub fn to_png(&self) -> Result<Vec<u8>, BeadError> {
        encode_png(&self.image)
    }
}

/// Sample, reduce, render and summarise `img` under `config`.
pub fn build_pattern(img: &DynamicImage, config: &RenderConfig) -> Result<BeadPattern, BeadError> {
    let config = config.clone().normalized();

    // ----------------------
    // 1. Sample the grid
    // ----------------------
    let sample = sample_grid(img, config.grid_width)?;

    // ----------------------
    // 2. Reduce colors
    // ----------------------
    let grid = reduce_palette(&sample, config.no_gradient, config.color_limit);

    // ----------------------
    // 3. Draw beads
    // ----------------------
    let image = render_pattern(&grid, &config.style, config.show_grid);
    debug!("rendered {}x{} surface", image.width(), image.height());

    // ----------------------
    // 4. Summarise palette
    // ----------------------
    let report = palette_report(grid.palette());

    info!(
        "bead pattern {}x{}: {} beads, {} colors (limit {})",
        grid.width(),
        grid.height(),
        grid.filled_cells(),
        report.total_colors,
        config.color_limit
    );

    Ok(BeadPattern {
        grid,
        image,
        report,
    })
}

/// Decode encoded image bytes (PNG, JPEG, ...) as a pattern source.
pub fn decode_image(input: &[u8]) -> Result<DynamicImage, BeadError> {
    let img = image::load_from_memory(input)
        .map_err(|e| BeadError::InvalidImage(format!("unable to decode image: {e}")))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(BeadError::InvalidImage(format!(
            "image dimensions cannot be zero, got {}x{}",
            img.width(),
            img.height()
        )));
    }
    Ok(img)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, BeadError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn undecodable_bytes_are_invalid_image() {
        assert!(matches!(
            decode_image(b"definitely not a png"),
            Err(BeadError::InvalidImage(_))
        ));
    }

    #[test]
    fn png_export_decodes_back() {
        let img = RgbaImage::from_pixel(6, 4, Rgba([1, 2, 3, 255]));
        let png = encode_png(&img).unwrap();
        let back = decode_image(&png).unwrap().to_rgba8();
        assert_eq!(back, img);
    }

    #[test]
    fn zero_grid_width_is_clamped() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));
        let config = RenderConfig {
            grid_width: 0,
            ..RenderConfig::default()
        };
        let pattern = build_pattern(&img, &config).unwrap();
        assert_eq!((pattern.grid.width(), pattern.grid.height()), (1, 1));
        assert_eq!(pattern.image.dimensions(), (20, 20));
    }
}
