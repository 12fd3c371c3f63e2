use image::{imageops, RgbaImage};

use crate::editor::scale::ScaleModel;
use crate::editor::surface::{BlurPatch, ImageSurface};
use crate::geometry::{PixelRegion, Point};
use crate::input::{DragSession, PointerHub};

/// Pixels kept clear of the right and bottom edges when clamping a brush.
pub const BLUR_EDGE_MARGIN: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurOptions {
    /// Brush radius in display pixels.
    pub brush_radius: f64,
    /// Gaussian sigma applied to each patch.
    pub strength: f32,
}

impl Default for BlurOptions {
    fn default() -> Self {
        Self {
            brush_radius: 20.0,
            strength: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurState {
    Disabled,
    Enabled { painting: bool },
}

/// Square natural-pixel region under the brush, plus the ellipse that the
/// display-space circle maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushFootprint {
    pub region: PixelRegion,
    pub center: Point,
    pub radius_x: f64,
    pub radius_y: f64,
}

impl BrushFootprint {
    fn covers(&self, x: f64, y: f64) -> bool {
        if self.radius_x <= 0.0 || self.radius_y <= 0.0 {
            return false;
        }
        let dx = (x - self.center.x) / self.radius_x;
        let dy = (y - self.center.y) / self.radius_y;
        dx * dx + dy * dy <= 1.0
    }
}

#[derive(Debug, Default)]
pub struct BlurTool {
    options: BlurOptions,
    enabled: bool,
    stroke: Option<DragSession<()>>,
    stroke_recorded: bool,
}

impl BlurTool {
    pub fn new(options: BlurOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> BlurOptions {
        self.options
    }

    pub fn state(&self) -> BlurState {
        if self.enabled {
            BlurState::Enabled {
                painting: self.is_painting(),
            }
        } else {
            BlurState::Disabled
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        tracing::debug!("blur brush enabled");
    }

    /// Drops any stroke in progress along with its release listener.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.stroke = None;
        self.stroke_recorded = false;
        tracing::debug!("blur brush disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_painting(&self) -> bool {
        self.stroke.as_ref().is_some_and(|stroke| !stroke.is_released())
    }

    /// Starts a stroke that lasts until the next window-level release.
    pub fn pointer_down(&mut self, window: &PointerHub) -> bool {
        if !self.enabled || self.stroke.is_some() {
            return false;
        }
        self.stroke = Some(DragSession::begin(window, ()));
        self.stroke_recorded = false;
        true
    }

    pub fn pointer_released(&mut self) -> bool {
        if self.stroke.as_ref().is_some_and(DragSession::is_released) {
            self.stroke = None;
            self.stroke_recorded = false;
            return true;
        }
        false
    }

    /// True until the current stroke has pushed its history entry.
    pub fn needs_history(&self) -> bool {
        self.is_painting() && !self.stroke_recorded
    }

    pub fn mark_recorded(&mut self) {
        self.stroke_recorded = true;
    }

    /// Makes the next paint of the current stroke capture history again.
    pub fn rearm_history(&mut self) {
        self.stroke_recorded = false;
    }

    /// Natural-pixel footprint of the brush centred on a display point,
    /// clamped to the bitmap. `None` when nothing of the image is covered.
    pub fn brush_region(&self, point: Point, model: &ScaleModel) -> Option<BrushFootprint> {
        let natural = model.natural();
        let scale = model.scale();
        if natural.is_empty() || scale.x <= 0.0 || scale.y <= 0.0 {
            return None;
        }

        let center = model.to_natural(point);
        let radius_x = self.options.brush_radius / scale.x;
        let radius_y = self.options.brush_radius / scale.y;
        let max_right = (natural.width - f64::from(BLUR_EDGE_MARGIN)).max(0.0);
        let max_bottom = (natural.height - f64::from(BLUR_EDGE_MARGIN)).max(0.0);

        let region = PixelRegion::from_edges_clipped(
            (center.x - radius_x).max(0.0),
            (center.y - radius_y).max(0.0),
            (center.x + radius_x).min(max_right),
            (center.y + radius_y).min(max_bottom),
            natural.width as u32,
            natural.height as u32,
        )?;
        Some(BrushFootprint {
            region,
            center,
            radius_x,
            radius_y,
        })
    }

    /// Adds one blurred, circle-masked patch sampled from the unblurred base.
    pub fn paint_at(&self, point: Point, surface: &mut ImageSurface) -> Option<PixelRegion> {
        let footprint = self.brush_region(point, surface.model())?;
        let region = footprint.region;

        let source = imageops::crop_imm(
            surface.base(),
            region.x,
            region.y,
            region.width,
            region.height,
        )
        .to_image();
        let mut pixels = blur_region(&source, self.options.strength);
        for (x, y, pixel) in pixels.enumerate_pixels_mut() {
            let sample_x = f64::from(region.x + x) + 0.5;
            let sample_y = f64::from(region.y + y) + 0.5;
            if !footprint.covers(sample_x, sample_y) {
                pixel.0[3] = 0;
            }
        }

        tracing::trace!(?region, "blur patch painted");
        surface.add_patch(BlurPatch { region, pixels });
        Some(region)
    }
}

/// Smallest sigma worth blurring at once a patch has been shrunk.
const MIN_REDUCED_SIGMA: f32 = 3.0;
/// Shortest side a shrunk patch may have.
const MIN_REDUCED_SIDE: u32 = 24;
const MAX_BLUR_DOWNSAMPLE: u32 = 4;

/// How far a brush patch can be shrunk before blurring, bound by the
/// remaining sigma and the patch's short side.
fn blur_downsample_factor(width: u32, height: u32, sigma: f32) -> u32 {
    let by_sigma = (sigma / MIN_REDUCED_SIGMA).floor() as u32;
    let by_side = width.min(height) / MIN_REDUCED_SIDE;
    by_sigma.min(by_side).clamp(1, MAX_BLUR_DOWNSAMPLE)
}

/// Gaussian blur of one brush patch. The output always has the input's
/// dimensions.
pub fn blur_region(region: &RgbaImage, sigma: f32) -> RgbaImage {
    let (width, height) = region.dimensions();
    if sigma <= 0.0 || width == 0 || height == 0 {
        return region.clone();
    }
    let downsample = blur_downsample_factor(width, height, sigma);
    if downsample == 1 {
        return imageops::blur(region, sigma);
    }

    let reduced = imageops::resize(
        region,
        width.div_ceil(downsample),
        height.div_ceil(downsample),
        imageops::FilterType::Triangle,
    );
    let blurred = imageops::blur(&reduced, sigma / downsample as f32);
    imageops::resize(&blurred, width, height, imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::scale::Scale;
    use crate::geometry::Size;
    use crate::input::PointerEvent;
    use image::Rgba;

    fn striped_surface(width: u32, height: u32, scale: f64) -> ImageSurface {
        let bitmap = RgbaImage::from_fn(width, height, |x, _| {
            if x % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        ImageSurface::with_scale(bitmap, Scale::uniform(scale))
    }

    fn model(width: f64, height: f64, scale: f64) -> ScaleModel {
        ScaleModel::new(Size::new(width, height), Scale::uniform(scale))
    }

    #[test]
    fn brush_region_scales_radius_to_natural_pixels() {
        let tool = BlurTool::new(BlurOptions {
            brush_radius: 10.0,
            strength: 4.0,
        });
        let footprint = tool
            .brush_region(Point::new(100.0, 50.0), &model(800.0, 600.0, 0.5))
            .expect("brush should cover the image");
        assert_eq!(footprint.region, PixelRegion::new(180, 80, 40, 40));
        assert_eq!(footprint.center, Point::new(200.0, 100.0));
        assert_eq!(footprint.radius_x, 20.0);
    }

    #[test]
    fn brush_region_never_leaves_natural_bounds() {
        let tool = BlurTool::default();
        let model = model(200.0, 100.0, 1.0);
        let probes = [
            Point::new(0.0, 0.0),
            Point::new(200.0, 100.0),
            Point::new(-15.0, 50.0),
            Point::new(210.0, 105.0),
            Point::new(100.0, -19.0),
        ];
        for probe in probes {
            let footprint = tool
                .brush_region(probe, &model)
                .expect("brush near the edge should still cover pixels");
            let region = footprint.region;
            assert!(region.right() <= 200 - BLUR_EDGE_MARGIN, "{probe:?} -> {region:?}");
            assert!(region.bottom() <= 100 - BLUR_EDGE_MARGIN, "{probe:?} -> {region:?}");
            assert!(region.width > 0 && region.height > 0);
        }
    }

    #[test]
    fn brush_region_far_outside_image_is_none() {
        let tool = BlurTool::default();
        let model = model(200.0, 100.0, 1.0);
        assert!(tool.brush_region(Point::new(-50.0, 40.0), &model).is_none());
        assert!(tool.brush_region(Point::new(100.0, 400.0), &model).is_none());
    }

    #[test]
    fn paint_masks_patch_to_a_circle_and_keeps_base_intact() {
        let mut surface = striped_surface(100, 100, 1.0);
        let tool = BlurTool::new(BlurOptions {
            brush_radius: 10.0,
            strength: 2.0,
        });

        let region = tool
            .paint_at(Point::new(50.0, 50.0), &mut surface)
            .expect("paint inside the image should add a patch");
        assert_eq!(region, PixelRegion::new(40, 40, 20, 20));
        assert_eq!(surface.patches().len(), 1);

        let patch = &surface.patches()[0];
        assert_eq!(patch.pixels.get_pixel(0, 0).0[3], 0);
        assert!(patch.pixels.get_pixel(10, 10).0[3] > 0);
        assert_eq!(surface.base().get_pixel(50, 50), &Rgba([0, 0, 0, 255]));

        let composed = surface.composite();
        let center = composed.get_pixel(50, 50).0;
        assert!(center[0] > 0 && center[0] < 255, "center should be blurred: {center:?}");
        assert_eq!(composed.get_pixel(40, 40), surface.base().get_pixel(40, 40));
    }

    #[test]
    fn overlapping_strokes_sample_from_the_unblurred_base() {
        let mut surface = striped_surface(64, 64, 1.0);
        let tool = BlurTool::new(BlurOptions {
            brush_radius: 8.0,
            strength: 2.0,
        });
        tool.paint_at(Point::new(32.0, 32.0), &mut surface)
            .expect("first paint should land");
        tool.paint_at(Point::new(32.0, 32.0), &mut surface)
            .expect("second paint should land");
        assert_eq!(surface.patches()[0], surface.patches()[1]);
    }

    #[test]
    fn stroke_follows_window_release_and_disable_detaches() {
        let window = PointerHub::new();
        let mut tool = BlurTool::default();
        assert!(!tool.pointer_down(&window));
        assert_eq!(tool.state(), BlurState::Disabled);

        tool.enable();
        assert!(tool.pointer_down(&window));
        assert_eq!(tool.state(), BlurState::Enabled { painting: true });
        assert!(tool.needs_history());
        tool.mark_recorded();
        assert!(!tool.needs_history());
        tool.rearm_history();
        assert!(tool.needs_history());
        tool.mark_recorded();

        window.dispatch(PointerEvent::Up(Point::new(900.0, 900.0)));
        assert!(tool.pointer_released());
        assert_eq!(tool.state(), BlurState::Enabled { painting: false });
        assert_eq!(window.listener_count(), 0);

        assert!(tool.pointer_down(&window));
        assert!(tool.needs_history());
        tool.disable();
        assert_eq!(window.listener_count(), 0);
        assert!(!tool.is_painting());
    }

    #[test]
    fn downsample_is_bound_by_patch_side_and_sigma() {
        // Default brush on an unscaled image: 40px patch keeps full resolution.
        assert_eq!(blur_downsample_factor(40, 40, 8.0), 1);
        assert_eq!(blur_downsample_factor(200, 200, 2.5), 1);
        assert_eq!(blur_downsample_factor(200, 200, 8.0), 2);
        assert_eq!(blur_downsample_factor(200, 60, 20.0), 2);
        assert_eq!(blur_downsample_factor(800, 800, 40.0), MAX_BLUR_DOWNSAMPLE);
    }

    #[test]
    fn blur_region_keeps_odd_patch_sizes() {
        let region = RgbaImage::from_fn(97, 73, |x, _| {
            if x < 48 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let blurred = blur_region(&region, 12.0);
        assert_eq!(blurred.dimensions(), (97, 73));
        let edge = blurred.get_pixel(48, 36).0[0];
        assert!(edge > 0 && edge < 255, "edge should be softened: {edge}");
        assert_eq!(blur_region(&region, 0.0), region);
    }
}
