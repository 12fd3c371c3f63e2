use crate::editor::surface::ImageSurface;
use crate::geometry::{Point, Size};

/// Stage dimensions and sprite anchor after a rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageLayout {
    pub stage: Size,
    pub anchor: Point,
}

/// Turns the image a quarter clockwise. Odd turn counts swap the stage and
/// recenter the anchor in the new orientation.
pub fn rotate(surface: &mut ImageSurface) -> StageLayout {
    surface.rotate_quarter();
    let layout = StageLayout {
        stage: surface.display_size(),
        anchor: surface.anchor(),
    };
    tracing::debug!(
        degrees = surface.rotation().degrees(),
        width = layout.stage.width,
        height = layout.stage.height,
        "image rotated"
    );
    layout
}
