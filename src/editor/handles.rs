//! Corner handle geometry shared by the crop and resize overlays.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::geometry::{Point, Rect};

/// Pointer distance, in display pixels, that still grabs a handle.
pub const HANDLE_HIT_RADIUS: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    pub const fn is_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    pub const fn is_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomLeft => Self::TopRight,
            Self::BottomRight => Self::TopLeft,
        }
    }
}

/// Anchor point of a handle plus the quarter arc drawn inside the rectangle.
/// Angles are radians, clockwise from +x in a y-down frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerAnchor {
    pub point: Point,
    pub start_angle: f64,
    pub end_angle: f64,
}

pub fn corner_position(corner: Corner, bounds: Rect) -> CornerAnchor {
    let (point, start_angle) = match corner {
        Corner::TopLeft => (Point::new(bounds.x, bounds.y), 0.0),
        Corner::TopRight => (Point::new(bounds.right(), bounds.y), FRAC_PI_2),
        Corner::BottomRight => (Point::new(bounds.right(), bounds.bottom()), PI),
        Corner::BottomLeft => (Point::new(bounds.x, bounds.bottom()), PI + FRAC_PI_2),
    };
    CornerAnchor {
        point,
        start_angle,
        end_angle: start_angle + FRAC_PI_2,
    }
}

/// Moves the two edges adjacent to `corner` so that the corner lands on
/// `point`. The opposite edges stay put. No clamping happens here, so a
/// drag past an opposite edge yields a negative extent.
pub fn apply_corner_drag(corner: Corner, bounds: Rect, point: Point) -> Rect {
    let (left, right) = if corner.is_left() {
        (point.x, bounds.right())
    } else {
        (bounds.x, point.x)
    };
    let (top, bottom) = if corner.is_top() {
        (point.y, bounds.bottom())
    } else {
        (bounds.y, point.y)
    };
    Rect::new(left, top, right - left, bottom - top)
}

/// Positions of all four handles for `bounds`, in `Corner::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleLayout {
    anchors: [(Corner, CornerAnchor); 4],
}

impl HandleLayout {
    pub fn for_bounds(bounds: Rect) -> Self {
        Self {
            anchors: Corner::ALL.map(|corner| (corner, corner_position(corner, bounds))),
        }
    }

    pub fn anchor(&self, corner: Corner) -> CornerAnchor {
        self.anchors[corner as usize].1
    }

    /// Nearest handle within `radius` of `point`.
    pub fn hit_test(&self, point: Point, radius: f64) -> Option<Corner> {
        self.anchors
            .iter()
            .map(|(corner, anchor)| (*corner, anchor.point.distance_to(point)))
            .filter(|(_, distance)| *distance <= radius)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(corner, _)| corner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Rect = Rect::new(10.0, 20.0, 200.0, 100.0);

    fn on_boundary(point: Point, bounds: Rect) -> bool {
        let on_vertical = point.x == bounds.x || point.x == bounds.right();
        let on_horizontal = point.y == bounds.y || point.y == bounds.bottom();
        on_vertical && on_horizontal
    }

    #[test]
    fn corner_positions_sit_on_distinct_rectangle_corners() {
        let points = Corner::ALL.map(|corner| corner_position(corner, BOUNDS).point);
        for point in points {
            assert!(on_boundary(point, BOUNDS), "{point:?} is off the boundary");
        }
        for (i, a) in points.iter().enumerate() {
            for (j, b) in points.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "corners {i} and {j} collide");
                }
            }
        }
        assert_eq!(
            corner_position(Corner::BottomRight, BOUNDS).point,
            Point::new(210.0, 120.0)
        );
    }

    #[test]
    fn corner_arcs_cover_distinct_quadrants() {
        let mut starts = Corner::ALL
            .map(|corner| corner_position(corner, BOUNDS))
            .map(|anchor| {
                assert!((anchor.end_angle - anchor.start_angle - FRAC_PI_2).abs() < 1e-12);
                anchor.start_angle
            });
        starts.sort_by(f64::total_cmp);
        for pair in starts.windows(2) {
            assert!((pair[1] - pair[0] - FRAC_PI_2).abs() < 1e-12);
        }
    }

    #[test]
    fn dragging_a_corner_keeps_the_opposite_edges() {
        let target = Point::new(50.0, 70.0);
        for corner in Corner::ALL {
            let dragged = apply_corner_drag(corner, BOUNDS, target);
            if corner.is_left() {
                assert_eq!(dragged.right(), BOUNDS.right(), "{corner:?} moved right edge");
                assert_eq!(dragged.x, target.x);
            } else {
                assert_eq!(dragged.x, BOUNDS.x, "{corner:?} moved left edge");
                assert_eq!(dragged.right(), target.x);
            }
            if corner.is_top() {
                assert_eq!(dragged.bottom(), BOUNDS.bottom(), "{corner:?} moved bottom edge");
                assert_eq!(dragged.y, target.y);
            } else {
                assert_eq!(dragged.y, BOUNDS.y, "{corner:?} moved top edge");
                assert_eq!(dragged.bottom(), target.y);
            }
        }
    }

    #[test]
    fn top_left_drag_recomputes_size_from_fixed_edges() {
        let dragged = apply_corner_drag(Corner::TopLeft, BOUNDS, Point::new(30.0, 25.0));
        assert_eq!(dragged, Rect::new(30.0, 25.0, 180.0, 95.0));

        let dragged = apply_corner_drag(Corner::BottomRight, BOUNDS, Point::new(100.0, 60.0));
        assert_eq!(dragged, Rect::new(10.0, 20.0, 90.0, 40.0));
    }

    #[test]
    fn hit_test_picks_nearest_handle_within_radius() {
        let layout = HandleLayout::for_bounds(BOUNDS);
        assert_eq!(
            layout.hit_test(Point::new(205.0, 118.0), HANDLE_HIT_RADIUS),
            Some(Corner::BottomRight)
        );
        assert_eq!(layout.hit_test(Point::new(100.0, 70.0), HANDLE_HIT_RADIUS), None);
    }
}
