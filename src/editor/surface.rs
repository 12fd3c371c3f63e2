//! The raster being edited, plus the blur painted over it.

use image::{imageops, RgbaImage};

use super::scale::{InitialScale, Rotation, Scale, ScaleModel};
use crate::geometry::{PixelRegion, Point, Size};

/// A blurred copy of one region of the base bitmap, composited on top of it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurPatch {
    pub region: PixelRegion,
    pub pixels: RgbaImage,
}

/// State handed back by the history stack on undo.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredState {
    pub bitmap: RgbaImage,
    pub rotation: Rotation,
    pub stage_size: Size,
    pub sprite_size: Size,
}

#[derive(Debug, Clone)]
pub struct ImageSurface {
    base: RgbaImage,
    /// Finished strokes, merged into one transparent layer over the base.
    blur_layer: Option<RgbaImage>,
    /// Patches of the stroke in progress.
    patches: Vec<BlurPatch>,
    model: ScaleModel,
    anchor: Point,
    tainted: bool,
}

impl ImageSurface {
    pub fn new(bitmap: RgbaImage, initial: InitialScale, tainted: bool) -> Self {
        let natural = bitmap_size(&bitmap);
        let model = ScaleModel::new(natural, initial.scale);
        Self {
            base: bitmap,
            blur_layer: None,
            patches: Vec::new(),
            anchor: model.display_size().center(),
            model,
            tainted,
        }
    }

    pub fn with_scale(bitmap: RgbaImage, scale: Scale) -> Self {
        let natural = bitmap_size(&bitmap);
        let display = Size::new(natural.width * scale.x, natural.height * scale.y);
        Self::new(bitmap, InitialScale { scale, display }, false)
    }

    pub fn model(&self) -> &ScaleModel {
        &self.model
    }

    pub fn natural_size(&self) -> Size {
        self.model.natural()
    }

    /// Stage size: what the user sees, rotation included.
    pub fn display_size(&self) -> Size {
        self.model.display_size()
    }

    pub fn sprite_size(&self) -> Size {
        self.model.sprite_size()
    }

    pub fn scale(&self) -> Scale {
        self.model.scale()
    }

    pub fn rotation(&self) -> Rotation {
        self.model.rotation()
    }

    /// Center of the sprite within the stage.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Unblurred bitmap; brush strokes always sample from here.
    pub fn base(&self) -> &RgbaImage {
        &self.base
    }

    pub fn patches(&self) -> &[BlurPatch] {
        &self.patches
    }

    pub fn blur_layer(&self) -> Option<&RgbaImage> {
        self.blur_layer.as_ref()
    }

    pub fn is_tainted(&self) -> bool {
        self.tainted
    }

    /// Base bitmap with all blur composited, in natural orientation.
    pub fn composite(&self) -> RgbaImage {
        let mut composed = self.base.clone();
        if let Some(layer) = &self.blur_layer {
            imageops::overlay(&mut composed, layer, 0, 0);
        }
        overlay_patches(&mut composed, &self.patches);
        composed
    }

    /// The stage as displayed: composited, rotated and scaled to display size.
    pub fn render_frame(&self) -> RgbaImage {
        let composed = self.composite();
        let rotated = match self.rotation().quarter_turns() {
            1 => imageops::rotate90(&composed),
            2 => imageops::rotate180(&composed),
            3 => imageops::rotate270(&composed),
            _ => composed,
        };

        let display = self.display_size();
        let width = pixel_extent(display.width);
        let height = pixel_extent(display.height);
        if rotated.dimensions() == (width, height) {
            return rotated;
        }
        imageops::resize(&rotated, width, height, imageops::FilterType::Triangle)
    }

    pub(crate) fn add_patch(&mut self, patch: BlurPatch) {
        self.patches.push(patch);
    }

    /// Merges the pending stroke patches into the blur layer.
    pub(crate) fn settle_patches(&mut self) {
        if self.patches.is_empty() {
            return;
        }
        let (width, height) = self.base.dimensions();
        let layer = self
            .blur_layer
            .get_or_insert_with(|| RgbaImage::new(width, height));
        overlay_patches(layer, &self.patches);
        tracing::trace!(merged = self.patches.len(), "blur patches settled");
        self.patches.clear();
    }

    pub(crate) fn rotate_quarter(&mut self) {
        self.model.rotate_quarter();
        self.recenter();
    }

    /// Swaps in a new base bitmap and drops all patches; scale factors stay.
    pub(crate) fn replace_bitmap(&mut self, bitmap: RgbaImage) {
        self.model.set_natural(bitmap_size(&bitmap));
        self.base = bitmap;
        self.blur_layer = None;
        self.patches.clear();
        self.recenter();
    }

    pub(crate) fn set_display_size(&mut self, display: Size) {
        self.model.set_display_size(display);
        self.recenter();
    }

    pub(crate) fn restore(&mut self, state: RestoredState) {
        self.model.set_natural(bitmap_size(&state.bitmap));
        self.model.set_rotation(state.rotation);
        self.model.set_sprite_size(state.sprite_size);
        self.base = state.bitmap;
        self.blur_layer = None;
        self.patches.clear();
        self.anchor = state.stage_size.center();
    }

    fn recenter(&mut self) {
        self.anchor = self.display_size().center();
    }
}

fn overlay_patches(target: &mut RgbaImage, patches: &[BlurPatch]) {
    for patch in patches {
        imageops::overlay(
            target,
            &patch.pixels,
            i64::from(patch.region.x),
            i64::from(patch.region.y),
        );
    }
}

fn bitmap_size(bitmap: &RgbaImage) -> Size {
    Size::new(f64::from(bitmap.width()), f64::from(bitmap.height()))
}

fn pixel_extent(value: f64) -> u32 {
    value.round().clamp(1.0, f64::from(u32::MAX)) as u32
}
