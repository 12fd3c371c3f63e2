use super::HandleOverlay;
use crate::editor::handles::{apply_corner_drag, corner_position, HandleLayout};
use crate::geometry::{Point, Rect, Size};
use crate::input::PointerHub;

pub const DEFAULT_RESIZE_MIN_SIZE: f64 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    /// Smallest display width or height a drag can produce.
    pub min_size: f64,
    pub keep_aspect_ratio: bool,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_RESIZE_MIN_SIZE,
            keep_aspect_ratio: true,
        }
    }
}

/// Drag-resizes the displayed image. Unlike crop, the overlay starts on the
/// full image bounds and a commit only changes scale, never pixels.
#[derive(Debug, Default)]
pub struct ResizeTool {
    options: ResizeOptions,
    initial: Size,
    overlay: Option<HandleOverlay>,
}

impl ResizeTool {
    pub fn new(options: ResizeOptions) -> Self {
        Self {
            options,
            initial: Size::default(),
            overlay: None,
        }
    }

    pub fn options(&self) -> ResizeOptions {
        self.options
    }

    pub fn set_keep_aspect_ratio(&mut self, keep: bool) {
        self.options.keep_aspect_ratio = keep;
    }

    pub fn start(&mut self, stage: Size) {
        self.initial = stage;
        tracing::debug!(width = stage.width, height = stage.height, "resize overlay started");
        self.overlay = Some(HandleOverlay::new(Rect::from_size(stage)));
    }

    pub fn is_active(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.overlay.as_ref().map(HandleOverlay::bounds)
    }

    pub fn handles(&self) -> Option<&HandleLayout> {
        self.overlay.as_ref().map(HandleOverlay::handles)
    }

    pub fn is_dragging(&self) -> bool {
        self.overlay
            .as_ref()
            .is_some_and(HandleOverlay::is_dragging)
    }

    pub fn pointer_down(&mut self, window: &PointerHub, point: Point) -> bool {
        self.overlay
            .as_mut()
            .is_some_and(|overlay| overlay.begin_drag(window, point))
    }

    /// Resizes around the corner opposite the dragged one.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        let options = self.options;
        let Some(overlay) = self.overlay.as_mut() else {
            return false;
        };
        let Some(drag) = overlay.active_drag() else {
            return false;
        };

        let fixed = corner_position(drag.corner.opposite(), drag.origin).point;
        let raw = apply_corner_drag(drag.corner, drag.origin, point);
        let (width, height) = constrain_size(raw.size(), drag.origin.size(), options);
        let x = if drag.corner.is_left() {
            fixed.x - width
        } else {
            fixed.x
        };
        let y = if drag.corner.is_top() {
            fixed.y - height
        } else {
            fixed.y
        };
        overlay.set_bounds(Rect::new(x, y, width, height));
        true
    }

    pub fn pointer_released(&mut self) -> bool {
        self.overlay
            .as_mut()
            .is_some_and(HandleOverlay::finish_released_drag)
    }

    /// Ends the resize session and returns the new display size, or `None`
    /// when nothing changed.
    pub fn commit(&mut self) -> Option<Size> {
        let overlay = self.overlay.take()?;
        let size = overlay.bounds().size();
        if size.is_empty() || size == self.initial {
            return None;
        }
        tracing::debug!(?size, "resize committed");
        Some(size)
    }

    pub fn cancel(&mut self) {
        if self.overlay.take().is_some() {
            tracing::debug!("resize overlay cancelled");
        }
    }
}

fn constrain_size(raw: Size, origin: Size, options: ResizeOptions) -> (f64, f64) {
    let min = options.min_size.max(1.0);
    let mut width = raw.width.max(min);
    let mut height = raw.height.max(min);

    if options.keep_aspect_ratio && origin.width > 0.0 && origin.height > 0.0 {
        let ratio = origin.width / origin.height;
        height = width / ratio;
        if height < min {
            height = min;
            width = height * ratio;
        }
    }
    (width, height)
}
