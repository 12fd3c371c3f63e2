mod blur;
mod crop;
mod resize;
mod rotate;

pub use blur::{
    blur_region, BlurOptions, BlurState, BlurTool, BrushFootprint, BLUR_EDGE_MARGIN,
};
pub use crop::{CropOptions, CropTool, DEFAULT_CROP_PADDING};
pub use resize::{ResizeOptions, ResizeTool};
pub use rotate::{rotate, StageLayout};

use super::handles::{Corner, HandleLayout, HANDLE_HIT_RADIUS};
use crate::geometry::{Point, Rect};
use crate::input::{DragSession, PointerHub};

/// Interactive tools. Rotation is applied immediately and has no tool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Crop,
    Resize,
    Blur,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [Self::Crop, Self::Resize, Self::Blur];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Crop => "Crop",
            Self::Resize => "Resize",
            Self::Blur => "Blur",
        }
    }
}

/// The corner being dragged and the overlay bounds when the drag began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleDrag {
    pub corner: Corner,
    pub origin: Rect,
}

/// Rectangle with four corner handles, shared by the crop and resize tools.
#[derive(Debug)]
pub(crate) struct HandleOverlay {
    bounds: Rect,
    handles: HandleLayout,
    drag: Option<DragSession<HandleDrag>>,
}

impl HandleOverlay {
    pub(crate) fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            handles: HandleLayout::for_bounds(bounds),
            drag: None,
        }
    }

    pub(crate) fn bounds(&self) -> Rect {
        self.bounds
    }

    pub(crate) fn handles(&self) -> &HandleLayout {
        &self.handles
    }

    /// Every handle is repositioned, not only the dragged one.
    pub(crate) fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.handles = HandleLayout::for_bounds(bounds);
    }

    pub(crate) fn begin_drag(&mut self, window: &PointerHub, point: Point) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let Some(corner) = self.handles.hit_test(point, HANDLE_HIT_RADIUS) else {
            return false;
        };
        tracing::debug!(?corner, x = point.x, y = point.y, "handle drag started");
        self.drag = Some(DragSession::begin(
            window,
            HandleDrag {
                corner,
                origin: self.bounds,
            },
        ));
        true
    }

    pub(crate) fn active_drag(&self) -> Option<HandleDrag> {
        self.drag
            .as_ref()
            .filter(|drag| !drag.is_released())
            .map(|drag| *drag.target())
    }

    pub(crate) fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Drops a drag whose window-level release has fired.
    pub(crate) fn finish_released_drag(&mut self) -> bool {
        if self.drag.as_ref().is_some_and(|drag| drag.is_released()) {
            self.drag = None;
            tracing::debug!("handle drag finished");
            return true;
        }
        false
    }
}
