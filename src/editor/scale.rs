//! Mapping between natural (bitmap) pixels and display (stage) pixels.
//!
//! Scale factors live in the bitmap's own, unrotated frame. Rotation is
//! applied after scaling, so on odd quarter-turns the displayed width comes
//! from the natural height and vice versa.

use crate::geometry::{Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    pub const IDENTITY: Scale = Scale { x: 1.0, y: 1.0 };

    pub const fn uniform(factor: f64) -> Self {
        Self {
            x: factor,
            y: factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialScale {
    pub scale: Scale,
    pub display: Size,
}

/// Fits the bitmap to the wider of the container and `min_width`, keeping
/// the aspect ratio. A zero container width falls back to `min_width`.
pub fn compute_initial_scale(natural: Size, container_width: f64, min_width: f64) -> InitialScale {
    let target_width = container_width.max(min_width);
    if natural.width <= 0.0 || target_width <= 0.0 {
        return InitialScale {
            scale: Scale::IDENTITY,
            display: natural,
        };
    }

    let factor = target_width / natural.width;
    InitialScale {
        scale: Scale::uniform(factor),
        display: Size::new(natural.width * factor, natural.height * factor),
    }
}

/// Clockwise quarter turns, always in `0..4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rotation(u8);

impl Rotation {
    pub const fn from_quarter_turns(turns: u32) -> Self {
        Self((turns % 4) as u8)
    }

    pub const fn quarter_turns(self) -> u8 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    pub const fn is_odd(self) -> bool {
        self.0 % 2 == 1
    }

    pub const fn degrees(self) -> u16 {
        self.0 as u16 * 90
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleModel {
    natural: Size,
    scale: Scale,
    rotation: Rotation,
}

impl ScaleModel {
    pub const fn new(natural: Size, scale: Scale) -> Self {
        Self {
            natural,
            scale,
            rotation: Rotation(0),
        }
    }

    pub const fn natural(&self) -> Size {
        self.natural
    }

    pub const fn scale(&self) -> Scale {
        self.scale
    }

    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn natural_bounds(&self) -> Rect {
        Rect::from_size(self.natural)
    }

    /// Size of the scaled bitmap before rotation.
    pub fn sprite_size(&self) -> Size {
        Size::new(
            self.natural.width * self.scale.x,
            self.natural.height * self.scale.y,
        )
    }

    /// Size of the stage, with width and height swapped on odd rotations.
    pub fn display_size(&self) -> Size {
        let sprite = self.sprite_size();
        if self.rotation.is_odd() {
            sprite.swapped()
        } else {
            sprite
        }
    }

    pub fn display_bounds(&self) -> Rect {
        Rect::from_size(self.display_size())
    }

    pub(crate) fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    pub(crate) fn rotate_quarter(&mut self) {
        self.rotation = self.rotation.next();
    }

    /// Replaces the natural size, keeping the current scale factors.
    pub(crate) fn set_natural(&mut self, natural: Size) {
        self.natural = natural;
    }

    /// Recomputes scale factors so that the stage ends up at `display`.
    pub(crate) fn set_display_size(&mut self, display: Size) {
        let sprite = if self.rotation.is_odd() {
            display.swapped()
        } else {
            display
        };
        self.set_sprite_size(sprite);
    }

    pub(crate) fn set_sprite_size(&mut self, sprite: Size) {
        let ratio = |target: f64, natural: f64| {
            if natural > 0.0 {
                target / natural
            } else {
                1.0
            }
        };
        self.scale = Scale {
            x: ratio(sprite.width, self.natural.width),
            y: ratio(sprite.height, self.natural.height),
        };
    }

    pub fn to_natural(&self, display: Point) -> Point {
        let sprite = self.sprite_size();
        let local = match self.rotation.quarter_turns() {
            1 => Point::new(display.y, sprite.height - display.x),
            2 => Point::new(sprite.width - display.x, sprite.height - display.y),
            3 => Point::new(sprite.width - display.y, display.x),
            _ => display,
        };
        Point::new(
            divide_or_zero(local.x, self.scale.x),
            divide_or_zero(local.y, self.scale.y),
        )
    }

    pub fn to_display(&self, natural: Point) -> Point {
        let sprite = self.sprite_size();
        let local = Point::new(natural.x * self.scale.x, natural.y * self.scale.y);
        match self.rotation.quarter_turns() {
            1 => Point::new(sprite.height - local.y, local.x),
            2 => Point::new(sprite.width - local.x, sprite.height - local.y),
            3 => Point::new(local.y, sprite.width - local.x),
            _ => local,
        }
    }

    /// Maps a display rectangle to the natural frame; the result is normalized.
    pub fn rect_to_natural(&self, rect: Rect) -> Rect {
        let a = self.to_natural(Point::new(rect.x, rect.y));
        let b = self.to_natural(Point::new(rect.right(), rect.bottom()));
        Rect::from_points(a, b)
    }
}

fn divide_or_zero(value: f64, factor: f64) -> f64 {
    if factor == 0.0 {
        0.0
    } else {
        value / factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_close(actual: Point, expected: Point) {
        assert!(
            (actual.x - expected.x).abs() < 1e-9 && (actual.y - expected.y).abs() < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn initial_scale_fits_container_width() {
        let initial = compute_initial_scale(Size::new(1000.0, 500.0), 400.0, 300.0);
        assert_eq!(initial.scale, Scale::uniform(0.4));
        assert_eq!(initial.display, Size::new(400.0, 200.0));
    }

    #[test]
    fn initial_scale_falls_back_to_min_width_without_container() {
        let initial = compute_initial_scale(Size::new(600.0, 300.0), 0.0, 300.0);
        assert_eq!(initial.scale, Scale::uniform(0.5));
        assert_eq!(initial.display, Size::new(300.0, 150.0));
    }

    #[test]
    fn mask_maps_to_natural_space_through_scale() {
        let model = ScaleModel::new(Size::new(800.0, 600.0), Scale::uniform(0.5));
        let natural = model.rect_to_natural(Rect::new(50.0, 50.0, 100.0, 80.0));
        assert_eq!(natural, Rect::new(100.0, 100.0, 200.0, 160.0));
    }

    #[test]
    fn display_size_swaps_on_odd_rotation() {
        let mut model = ScaleModel::new(Size::new(300.0, 200.0), Scale::IDENTITY);
        model.rotate_quarter();
        assert_eq!(model.display_size(), Size::new(200.0, 300.0));
        model.rotate_quarter();
        assert_eq!(model.display_size(), Size::new(300.0, 200.0));
    }

    #[test]
    fn rotated_points_map_back_and_forth() {
        let mut model = ScaleModel::new(Size::new(400.0, 200.0), Scale { x: 0.5, y: 0.25 });
        let natural = Point::new(100.0, 40.0);
        let expected_display = [
            Point::new(50.0, 10.0),
            Point::new(40.0, 50.0),
            Point::new(150.0, 40.0),
            Point::new(10.0, 150.0),
        ];
        for expected in expected_display {
            let display = model.to_display(natural);
            assert_point_close(display, expected);
            assert_point_close(model.to_natural(display), natural);
            model.rotate_quarter();
        }
    }

    #[test]
    fn set_display_size_accounts_for_rotation() {
        let mut model = ScaleModel::new(Size::new(400.0, 200.0), Scale::IDENTITY);
        model.rotate_quarter();
        model.set_display_size(Size::new(100.0, 200.0));
        assert_eq!(model.scale(), Scale { x: 0.5, y: 0.5 });
        assert_eq!(model.display_size(), Size::new(100.0, 200.0));
    }
}
