/// Axis-aligned rectangle math used by collision resolution and by the
/// possession-candidate ranking.
///
/// `intersection_depth` is deliberately a full 2D measure: when two
/// rectangles overlap, BOTH components carry the signed
/// minimum-translation distance along their own axis. The collision
/// resolver decides which axis to apply; this module never does.

use glam::Vec2;

/// Rectangle in world pixels. `x`/`y` is the top-left corner.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.w / 2.0, self.h / 2.0)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }
}

/// Signed per-axis overlap between two rectangles.
///
/// Returns `Vec2::ZERO` when the rectangles are disjoint (or merely
/// touching edge-to-edge). Otherwise `depth.x` is the distance `a` must
/// move along X to separate from `b` (sign = direction to push `a`),
/// and `depth.y` the same along Y. Computed from center distances vs.
/// combined half-extents.
pub fn intersection_depth(a: &Rect, b: &Rect) -> Vec2 {
    let half_a = a.half_extents();
    let half_b = b.half_extents();

    let distance = a.center() - b.center();
    let min_distance = half_a + half_b;

    if distance.x.abs() >= min_distance.x || distance.y.abs() >= min_distance.y {
        return Vec2::ZERO;
    }

    let depth_x = if distance.x > 0.0 {
        min_distance.x - distance.x
    } else {
        -min_distance.x - distance.x
    };
    let depth_y = if distance.y > 0.0 {
        min_distance.y - distance.y
    } else {
        -min_distance.y - distance.y
    };

    Vec2::new(depth_x, depth_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_rects_have_zero_depth() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(intersection_depth(&a, &b), Vec2::ZERO);
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert_eq!(intersection_depth(&a, &b), Vec2::ZERO);
    }

    #[test]
    fn overlap_populates_both_axes() {
        // `a` hangs 4 px into `b` from the left and 2 px from above.
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(6.0, 8.0, 10.0, 10.0);
        let depth = intersection_depth(&a, &b);
        assert_eq!(depth.x, -4.0); // push `a` left to separate
        assert_eq!(depth.y, -2.0); // push `a` up to separate
    }

    #[test]
    fn overlap_sign_flips_with_relative_position() {
        let a = Rect::new(6.0, 8.0, 10.0, 10.0);
        let b = Rect::new(0.0, 0.0, 10.0, 10.0);
        let depth = intersection_depth(&a, &b);
        assert_eq!(depth.x, 4.0);
        assert_eq!(depth.y, 2.0);
    }

    #[test]
    fn contained_rect_reports_shallowest_escape() {
        // A small rect fully inside a big one, biased toward the top-left.
        let a = Rect::new(2.0, 2.0, 4.0, 4.0);
        let b = Rect::new(0.0, 0.0, 32.0, 32.0);
        let depth = intersection_depth(&a, &b);
        // Separation along X requires moving past the near (left) edge.
        assert!(depth.x < 0.0);
        assert!(depth.y < 0.0);
    }

    #[test]
    fn contains_uses_half_open_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(r.contains(Vec2::new(5.0, 5.0)));
        assert!(!r.contains(Vec2::new(10.0, 10.0)));
    }
}
