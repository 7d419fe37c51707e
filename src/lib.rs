use wasm_bindgen::prelude::*;
use js_sys::{Array, Object, Reflect, Uint8Array};

pub mod color;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod reducer;
pub mod renderer;
pub mod report;
pub mod sampler;
pub mod session;

pub use color::{Color, hex_to_rgb, rgb_to_hex};
pub use config::{BeadStyle, ColorLimit, RenderConfig};
pub use error::BeadError;
pub use pipeline::{BeadPattern, DEFAULT_EXPORT_NAME, build_pattern, decode_image, encode_png};
pub use reducer::{PaletteEntry, ReducedGrid, reduce_palette};
pub use renderer::render_pattern;
pub use report::{PaletteReport, Swatch, palette_report};
pub use sampler::{GridSample, grid_dimensions, sample_grid};
pub use session::{BeadSession, Debouncer};

fn js_error(e: BeadError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Pack a pattern as `{ image, width, height, totalColors, palette }` where
/// `image` holds PNG bytes and `palette` the brightness-sorted hex colors.
fn pattern_to_js(pattern: &BeadPattern) -> Result<Object, JsValue> {
    let png = pattern.to_png().map_err(js_error)?;

    let palette_js = Array::new();
    for hex in pattern.report.hex_colors() {
        palette_js.push(&JsValue::from_str(&hex));
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("image"), &Uint8Array::from(png.as_slice()))?;
    Reflect::set(&result, &JsValue::from_str("width"), &JsValue::from(pattern.grid.width()))?;
    Reflect::set(&result, &JsValue::from_str("height"), &JsValue::from(pattern.grid.height()))?;
    Reflect::set(
        &result,
        &JsValue::from_str("totalColors"),
        &JsValue::from(pattern.report.total_colors as u32),
    )?;
    Reflect::set(&result, &JsValue::from_str("palette"), &palette_js)?;
    Ok(result)
}

fn outcome_to_js(outcome: Option<Result<&BeadPattern, BeadError>>) -> Result<JsValue, JsValue> {
    match outcome {
        None => Ok(JsValue::NULL),
        Some(Ok(pattern)) => pattern_to_js(pattern).map(JsValue::from),
        Some(Err(e)) => Err(js_error(e)),
    }
}

/// Render an encoded image as a bead pattern in one shot.
///
/// `color_count` is free text: `"max"` keeps every color, a positive integer
/// caps the palette, anything else is treated as `"max"`.
#[wasm_bindgen]
pub fn render_beads(
    input: Vec<u8>,
    grid_width: u32,
    show_grid: bool,
    color_count: String,
    no_gradient: bool,
) -> Result<Object, JsValue> {
    let img = decode_image(&input).map_err(js_error)?;
    let config = RenderConfig {
        grid_width,
        show_grid,
        color_limit: ColorLimit::parse(&color_count),
        no_gradient,
        ..RenderConfig::default()
    };
    let pattern = build_pattern(&img, &config).map_err(js_error)?;
    pattern_to_js(&pattern)
}

/// Stateful editor for the browser page. Each setter re-renders right away
/// and returns the new pattern object, or `null` before an image is loaded.
/// Grid-width changes are debounced: call `poll` with the current time.
#[wasm_bindgen]
pub struct BeadStudio {
    session: BeadSession,
}

impl Default for BeadStudio {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl BeadStudio {
    #[wasm_bindgen(constructor)]
    pub fn new() -> BeadStudio {
        BeadStudio {
            session: BeadSession::default(),
        }
    }

    pub fn load_image(&mut self, input: Vec<u8>) -> Result<Object, JsValue> {
        let pattern = self.session.load_image_bytes(&input).map_err(js_error)?;
        pattern_to_js(pattern)
    }

    pub fn request_grid_width(&mut self, grid_width: u32, now_ms: f64) {
        self.session.request_grid_width(grid_width, now_ms.max(0.0) as u64);
    }

    /// Apply a due grid-width change. Returns `null` when nothing ran.
    pub fn poll(&mut self, now_ms: f64) -> Result<JsValue, JsValue> {
        outcome_to_js(self.session.poll(now_ms.max(0.0) as u64))
    }

    /// Timestamp at which `poll` will next have work, or `undefined`.
    pub fn next_due(&self) -> Option<f64> {
        self.session.next_due().map(|t| t as f64)
    }

    pub fn set_show_grid(&mut self, show_grid: bool) -> Result<JsValue, JsValue> {
        outcome_to_js(self.session.set_show_grid(show_grid))
    }

    pub fn set_no_gradient(&mut self, no_gradient: bool) -> Result<JsValue, JsValue> {
        outcome_to_js(self.session.set_no_gradient(no_gradient))
    }

    pub fn set_color_count(&mut self, color_count: String) -> Result<JsValue, JsValue> {
        outcome_to_js(self.session.set_color_count(&color_count))
    }

    /// PNG bytes of the current pattern.
    pub fn export_png(&self) -> Result<Uint8Array, JsValue> {
        let pattern = self.session.current().ok_or_else(|| js_error(BeadError::NoImage))?;
        let png = pattern.to_png().map_err(js_error)?;
        Ok(Uint8Array::from(png.as_slice()))
    }

    pub fn export_filename(&self) -> String {
        DEFAULT_EXPORT_NAME.to_string()
    }
}

/// Native counterpart of [`render_beads`]: PNG bytes plus the palette report.
pub fn bead_pattern_bytes(
    input: &[u8],
    config: &RenderConfig,
) -> Result<(Vec<u8>, PaletteReport), BeadError> {
    let img = decode_image(input)?;
    let pattern = build_pattern(&img, config)?;
    let png = pattern.to_png()?;
    Ok((png, pattern.report))
}

/// Palette summary only, skipping rendering and PNG encoding.
pub fn extract_palette_bytes(input: &[u8], config: &RenderConfig) -> Result<PaletteReport, BeadError> {
    let img = decode_image(input)?;
    let config = config.clone().normalized();
    let sample = sample_grid(&img, config.grid_width)?;
    let grid = reduce_palette(&sample, config.no_gradient, config.color_limit);
    Ok(palette_report(grid.palette()))
}
