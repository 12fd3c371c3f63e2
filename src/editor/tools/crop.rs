use image::{imageops, RgbaImage};

use super::HandleOverlay;
use crate::editor::handles::{apply_corner_drag, HandleLayout};
use crate::editor::scale::ScaleModel;
use crate::editor::surface::ImageSurface;
use crate::geometry::{PixelRegion, Point, Rect, Size};
use crate::input::PointerHub;

pub const DEFAULT_CROP_PADDING: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropOptions {
    /// Inset of the initial mask from the image edges, in display pixels.
    pub padding: f64,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            padding: DEFAULT_CROP_PADDING,
        }
    }
}

#[derive(Debug, Default)]
pub struct CropTool {
    options: CropOptions,
    image_bounds: Rect,
    overlay: Option<HandleOverlay>,
}

impl CropTool {
    pub fn new(options: CropOptions) -> Self {
        Self {
            options,
            image_bounds: Rect::default(),
            overlay: None,
        }
    }

    pub fn options(&self) -> CropOptions {
        self.options
    }

    pub fn start(&mut self, display: Size) {
        self.image_bounds = Rect::from_size(display);
        let mask = self.image_bounds.inset(self.options.padding);
        tracing::debug!(?mask, "crop overlay started");
        self.overlay = Some(HandleOverlay::new(mask));
    }

    pub fn is_active(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn mask(&self) -> Option<Rect> {
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

    /// Moves the dragged corner. The corner stays inside the image and
    /// cannot cross the fixed edges, so the mask never turns negative.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        let image_bounds = self.image_bounds;
        let Some(overlay) = self.overlay.as_mut() else {
            return false;
        };
        let Some(drag) = overlay.active_drag() else {
            return false;
        };

        let mask = overlay.bounds();
        let point = image_bounds.clamp_point(point);
        let point = Point::new(
            if drag.corner.is_left() {
                point.x.min(mask.right())
            } else {
                point.x.max(mask.x)
            },
            if drag.corner.is_top() {
                point.y.min(mask.bottom())
            } else {
                point.y.max(mask.y)
            },
        );
        overlay.set_bounds(apply_corner_drag(drag.corner, mask, point));
        true
    }

    pub fn pointer_released(&mut self) -> bool {
        self.overlay
            .as_mut()
            .is_some_and(HandleOverlay::finish_released_drag)
    }

    /// Natural-pixel region under the current mask, clipped to the bitmap.
    pub fn natural_region(&self, model: &ScaleModel) -> Option<PixelRegion> {
        let mask = self.mask()?;
        if mask.is_empty() {
            return None;
        }
        let natural = model.natural();
        let rect = model.rect_to_natural(mask);
        PixelRegion::from_edges_clipped(
            rect.x,
            rect.y,
            rect.right(),
            rect.bottom(),
            natural.width as u32,
            natural.height as u32,
        )
    }

    /// Ends the crop session and returns the cropped bitmap, or `None` when
    /// there is no mask or it covers no pixels.
    pub fn commit(&mut self, surface: &ImageSurface) -> Option<RgbaImage> {
        let region = self.natural_region(surface.model());
        self.overlay = None;
        let region = region?;
        tracing::debug!(?region, "crop committed");
        let composed = surface.composite();
        Some(
            imageops::crop_imm(
                &composed,
                region.x,
                region.y,
                region.width,
                region.height,
            )
            .to_image(),
        )
    }

    pub fn cancel(&mut self) {
        if self.overlay.take().is_some() {
            tracing::debug!("crop overlay cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::handles::Corner;
    use crate::editor::scale::Scale;
    use crate::input::PointerEvent;
    use image::Rgba;

    fn surface() -> ImageSurface {
        let mut bitmap = RgbaImage::from_pixel(800, 600, Rgba([0, 0, 0, 255]));
        bitmap.put_pixel(100, 100, Rgba([255, 0, 0, 255]));
        ImageSurface::with_scale(bitmap, Scale::uniform(0.5))
    }

    fn drag(tool: &mut CropTool, window: &PointerHub, from: Point, to: Point) {
        assert!(tool.pointer_down(window, from), "expected a handle at {from:?}");
        assert!(tool.pointer_move(to));
        window.dispatch(PointerEvent::Up(to));
        assert!(tool.pointer_released());
    }

    #[test]
    fn start_insets_mask_by_padding() {
        let mut tool = CropTool::default();
        tool.start(Size::new(400.0, 300.0));
        assert_eq!(tool.mask(), Some(Rect::new(50.0, 50.0, 300.0, 200.0)));
        let handles = tool.handles().expect("handles should exist");
        assert_eq!(
            handles.anchor(Corner::BottomRight).point,
            Point::new(350.0, 250.0)
        );
    }

    #[test]
    fn dragging_a_corner_repositions_every_handle() {
        let window = PointerHub::new();
        let mut tool = CropTool::default();
        tool.start(Size::new(400.0, 300.0));

        drag(
            &mut tool,
            &window,
            Point::new(350.0, 250.0),
            Point::new(150.0, 130.0),
        );

        let mask = tool.mask().expect("mask should exist");
        assert_eq!(mask, Rect::new(50.0, 50.0, 100.0, 80.0));
        let handles = tool.handles().expect("handles should exist");
        assert_eq!(handles.anchor(Corner::TopRight).point, Point::new(150.0, 50.0));
        assert_eq!(
            handles.anchor(Corner::BottomLeft).point,
            Point::new(50.0, 130.0)
        );
        assert_eq!(window.listener_count(), 0);
    }

    #[test]
    fn commit_extracts_natural_region() {
        let window = PointerHub::new();
        let surface = surface();
        let mut tool = CropTool::default();
        tool.start(surface.display_size());
        drag(
            &mut tool,
            &window,
            Point::new(350.0, 250.0),
            Point::new(150.0, 130.0),
        );

        assert_eq!(
            tool.natural_region(surface.model()),
            Some(PixelRegion::new(100, 100, 200, 160))
        );
        let cropped = tool.commit(&surface).expect("crop should produce an image");
        assert_eq!(cropped.dimensions(), (200, 160));
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert!(!tool.is_active());
    }

    #[test]
    fn drag_cannot_cross_opposite_edge_and_zero_area_commit_is_noop() {
        let window = PointerHub::new();
        let surface = surface();
        let mut tool = CropTool::default();
        tool.start(surface.display_size());

        drag(
            &mut tool,
            &window,
            Point::new(50.0, 50.0),
            Point::new(390.0, 120.0),
        );
        let mask = tool.mask().expect("mask should exist");
        assert_eq!(mask.width, 0.0);
        assert_eq!(mask.right(), 350.0);

        assert!(tool.commit(&surface).is_none());
        assert!(!tool.is_active());
    }

    #[test]
    fn commit_without_mask_is_noop() {
        let mut tool = CropTool::default();
        assert!(tool.commit(&surface()).is_none());
    }

    #[test]
    fn drag_is_clamped_to_image_bounds() {
        let window = PointerHub::new();
        let mut tool = CropTool::default();
        tool.start(Size::new(400.0, 300.0));
        drag(
            &mut tool,
            &window,
            Point::new(50.0, 50.0),
            Point::new(-80.0, -10.0),
        );
        assert_eq!(tool.mask(), Some(Rect::new(0.0, 0.0, 350.0, 250.0)));
    }

    #[test]
    fn cancel_mid_drag_detaches_window_listener() {
        let window = PointerHub::new();
        let mut tool = CropTool::default();
        tool.start(Size::new(400.0, 300.0));
        assert!(tool.pointer_down(&window, Point::new(50.0, 50.0)));
        assert_eq!(window.listener_count(), 1);

        tool.cancel();
        assert_eq!(window.listener_count(), 0);
        assert!(tool.mask().is_none());
    }
}
