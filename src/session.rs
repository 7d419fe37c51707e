//! Interactive session state: the loaded source image, current settings, the
//! last successful output, and the grid-width debounce.
//!
//! Time is supplied by the host in milliseconds, so the session works the same
//! under a browser event loop and in tests.

use image::DynamicImage;
use log::{debug, warn};

use crate::config::{ColorLimit, RenderConfig};
use crate::error::BeadError;
use crate::pipeline::{BeadPattern, build_pattern, decode_image};

/// Quiet period before a grid-width change is applied.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[derive(Clone, Debug)]
struct Pending<T> {
    due_at: u64,
    value: T,
}

/// Coalesces bursts of requests so only the last one fires, once `wait_ms`
/// has passed without a newer request.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    wait_ms: u64,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(wait_ms: u64) -> Self {
        Self {
            wait_ms,
            pending: None,
        }
    }

    /// Schedule `value` to fire at `now + wait_ms`, cancelling any pending
    /// value. Returns the value that was cancelled.
    pub fn schedule(&mut self, now: u64, value: T) -> Option<T> {
        let due_at = now.saturating_add(self.wait_ms);
        self.pending
            .replace(Pending { due_at, value })
            .map(|p| p.value)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.due_at)
    }

    /// Take the pending value if its quiet period has elapsed by `now`.
    pub fn take_due(&mut self, now: u64) -> Option<T> {
        match &self.pending {
            Some(p) if p.due_at <= now => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }
}

/// One user's editing session.
pub struct BeadSession {
    source: Option<DynamicImage>,
    config: RenderConfig,
    grid_width: Debouncer<u32>,
    current: Option<BeadPattern>,
}

impl Default for BeadSession {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl BeadSession {
    pub fn new(config: RenderConfig) -> Self {
        Self::with_debounce(config, DEFAULT_DEBOUNCE_MS)
    }

    pub fn with_debounce(config: RenderConfig, wait_ms: u64) -> Self {
        Self {
            source: None,
            config,
            grid_width: Debouncer::new(wait_ms),
            current: None,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    /// Output of the last successful run.
    pub fn current(&self) -> Option<&BeadPattern> {
        self.current.as_ref()
    }

    pub fn has_pending_grid_width(&self) -> bool {
        self.grid_width.is_pending()
    }

    /// Decode and load a new source image, then run. Undecodable bytes leave
    /// the previous image and output in place.
    pub fn load_image_bytes(&mut self, input: &[u8]) -> Result<&BeadPattern, BeadError> {
        let img = decode_image(input)?;
        self.load_image(img)
    }

    pub fn load_image(&mut self, img: DynamicImage) -> Result<&BeadPattern, BeadError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(BeadError::InvalidImage(format!(
                "image dimensions cannot be zero, got {}x{}",
                img.width(),
                img.height()
            )));
        }
        debug!("loaded {}x{} source image", img.width(), img.height());
        self.source = Some(img);
        self.run()
    }

    /// Run the full pipeline with the current settings. On failure the
    /// previous output is kept. Any pending grid-width run is dropped since
    /// this run already uses the requested width.
    pub fn run(&mut self) -> Result<&BeadPattern, BeadError> {
        let source = self.source.as_ref().ok_or(BeadError::NoImage)?;
        self.grid_width.cancel();
        match build_pattern(source, &self.config) {
            Ok(pattern) => Ok(self.current.insert(pattern)),
            Err(e) => {
                warn!("bead pattern run failed, keeping previous output: {e}");
                Err(e)
            }
        }
    }

    /// Apply `update` to the settings and re-run immediately if an image is
    /// loaded. Returns `None` when there is nothing to render yet.
    pub fn update_config(
        &mut self,
        update: impl FnOnce(&mut RenderConfig),
    ) -> Option<Result<&BeadPattern, BeadError>> {
        update(&mut self.config);
        if self.source.is_none() {
            return None;
        }
        Some(self.run())
    }

    pub fn set_show_grid(&mut self, show_grid: bool) -> Option<Result<&BeadPattern, BeadError>> {
        self.update_config(|c| c.show_grid = show_grid)
    }

    pub fn set_no_gradient(&mut self, no_gradient: bool) -> Option<Result<&BeadPattern, BeadError>> {
        self.update_config(|c| c.no_gradient = no_gradient)
    }

    /// Set the color cap from user text; see [`ColorLimit::parse`].
    pub fn set_color_count(&mut self, text: &str) -> Option<Result<&BeadPattern, BeadError>> {
        let limit = ColorLimit::parse(text);
        self.update_config(|c| c.color_limit = limit)
    }

    /// Request a new grid width. The width joins the settings at once, so any
    /// run from here on uses it; with an image loaded the re-render itself is
    /// debounced and fired by a later [`BeadSession::poll`].
    pub fn request_grid_width(&mut self, grid_width: u32, now_ms: u64) {
        self.config.grid_width = grid_width;
        if self.source.is_none() {
            return;
        }
        if let Some(superseded) = self.grid_width.schedule(now_ms, grid_width) {
            debug!("grid width {superseded} superseded by {grid_width}");
        }
    }

    /// Run the pending grid-width re-render if its quiet period is over.
    /// Returns `None` when nothing ran.
    pub fn poll(&mut self, now_ms: u64) -> Option<Result<&BeadPattern, BeadError>> {
        let grid_width = self.grid_width.take_due(now_ms)?;
        debug!("grid width {grid_width} settled, re-rendering");
        self.source.as_ref()?;
        Some(self.run())
    }

    /// Milliseconds timestamp at which the pending grid-width change fires.
    pub fn next_due(&self) -> Option<u64> {
        self.grid_width.due_at()
    }
}
