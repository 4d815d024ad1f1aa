// Point, rectangle and segment math shared by routing, label placement and
// hit-testing. All coordinates are canvas units.

use serde::Serialize;

use crate::ir::Node;

pub type Point = (f32, f32);
pub type Segment = (Point, Point);

const INTERSECT_EPS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered(center: Point, width: f32, height: f32) -> Self {
        Self::new(center.0 - width / 2.0, center.1 - height / 2.0, width, height)
    }

    pub fn from_node(node: &Node) -> Self {
        Self::new(node.x, node.y, node.width, node.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.0 >= self.x && point.0 <= self.right() && point.1 >= self.y && point.1 <= self.bottom()
    }

    /// Interior overlap; rectangles that only touch along a border do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn inflate(&self, pad: f32) -> Rect {
        Rect::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }
}

pub fn distance(a: Point, b: Point) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

pub fn point_segment_distance(point: Point, a: Point, b: Point) -> f32 {
    let vx = b.0 - a.0;
    let vy = b.1 - a.1;
    let len2 = vx * vx + vy * vy;
    if len2 <= 1e-6 {
        return distance(point, a);
    }
    let t = (((point.0 - a.0) * vx + (point.1 - a.1) * vy) / len2).clamp(0.0, 1.0);
    distance(point, (a.0 + vx * t, a.1 + vy * t))
}

pub fn point_polyline_distance(point: Point, points: &[Point]) -> f32 {
    match points {
        [] => f32::INFINITY,
        [only] => distance(point, *only),
        _ => points
            .windows(2)
            .map(|seg| point_segment_distance(point, seg[0], seg[1]))
            .fold(f32::INFINITY, f32::min),
    }
}

fn orientation(a: Point, b: Point, c: Point) -> f32 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn within_bounds(point: Point, a: Point, b: Point) -> bool {
    point.0 >= a.0.min(b.0) - INTERSECT_EPS
        && point.0 <= a.0.max(b.0) + INTERSECT_EPS
        && point.1 >= a.1.min(b.1) - INTERSECT_EPS
        && point.1 <= a.1.max(b.1) + INTERSECT_EPS
}

/// Closed-segment intersection test, collinear overlaps and touching ends included.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);
    let crosses = ((o1 > INTERSECT_EPS && o2 < -INTERSECT_EPS)
        || (o1 < -INTERSECT_EPS && o2 > INTERSECT_EPS))
        && ((o3 > INTERSECT_EPS && o4 < -INTERSECT_EPS)
            || (o3 < -INTERSECT_EPS && o4 > INTERSECT_EPS));
    if crosses {
        return true;
    }
    (o1.abs() <= INTERSECT_EPS && within_bounds(c, a, b))
        || (o2.abs() <= INTERSECT_EPS && within_bounds(d, a, b))
        || (o3.abs() <= INTERSECT_EPS && within_bounds(a, c, d))
        || (o4.abs() <= INTERSECT_EPS && within_bounds(b, c, d))
}

pub fn segment_intersects_rect(a: Point, b: Point, rect: &Rect) -> bool {
    if a.0.max(b.0) < rect.x
        || a.0.min(b.0) > rect.right()
        || a.1.max(b.1) < rect.y
        || a.1.min(b.1) > rect.bottom()
    {
        return false;
    }
    if rect.contains(a) || rect.contains(b) {
        return true;
    }
    let corners = [
        (rect.x, rect.y),
        (rect.right(), rect.y),
        (rect.right(), rect.bottom()),
        (rect.x, rect.bottom()),
    ];
    (0..4).any(|idx| segments_intersect(a, b, corners[idx], corners[(idx + 1) % 4]))
}

pub fn polyline_intersects_rect(points: &[Point], rect: &Rect) -> bool {
    match points {
        [] => false,
        [only] => rect.contains(*only),
        _ => points
            .windows(2)
            .any(|seg| segment_intersects_rect(seg[0], seg[1], rect)),
    }
}

pub fn path_length(points: &[Point]) -> f32 {
    points.windows(2).map(|seg| distance(seg[0], seg[1])).sum()
}

/// Point at `fraction` of the polyline's arc length, clamped to `[0, 1]`.
pub fn point_at_fraction(points: &[Point], fraction: f32) -> Option<Point> {
    let first = *points.first()?;
    let total = path_length(points);
    if total <= f32::EPSILON {
        return Some(first);
    }
    let mut remaining = total * fraction.clamp(0.0, 1.0);
    for seg in points.windows(2) {
        let len = distance(seg[0], seg[1]);
        if len <= f32::EPSILON {
            continue;
        }
        if remaining <= len {
            let t = remaining / len;
            return Some((
                seg[0].0 + (seg[1].0 - seg[0].0) * t,
                seg[0].1 + (seg[1].1 - seg[0].1) * t,
            ));
        }
        remaining -= len;
    }
    points.last().copied()
}

/// Whether `point` lies within `tolerance` of the polyline.
pub fn hit_test_path(point: Point, points: &[Point], tolerance: f32) -> bool {
    point_polyline_distance(point, points) <= tolerance
}

/// Counts segment crossings between `points` and `existing`, skipping pairs
/// that share an endpoint.
pub fn crossings_with_existing(points: &[Point], existing: &[Segment]) -> usize {
    if points.len() < 2 || existing.is_empty() {
        return 0;
    }
    let same = |p: Point, q: Point| (p.0 - q.0).abs() < 1e-6 && (p.1 - q.1).abs() < 1e-6;
    let mut crossings = 0usize;
    for seg in points.windows(2) {
        let (a1, a2) = (seg[0], seg[1]);
        for &(b1, b2) in existing {
            if same(a1, b1) || same(a1, b2) || same(a2, b1) || same(a2, b2) {
                continue;
            }
            if segments_intersect(a1, a2, b1, b2) {
                crossings += 1;
            }
        }
    }
    crossings
}

pub fn path_segments(points: &[Point]) -> impl Iterator<Item = Segment> + '_ {
    points.windows(2).map(|seg| (seg[0], seg[1]))
}

/// Canvas-to-screen transform for zoomed and panned views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan: Point,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: (0.0, 0.0),
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn to_screen(&self, point: Point) -> Point {
        (point.0 * self.zoom + self.pan.0, point.1 * self.zoom + self.pan.1)
    }

    pub fn to_canvas(&self, point: Point) -> Point {
        let zoom = if self.zoom.abs() <= f32::EPSILON { 1.0 } else { self.zoom };
        ((point.0 - self.pan.0) / zoom, (point.1 - self.pan.1) / zoom)
    }

    /// A screen-space tolerance expressed in canvas units.
    pub fn canvas_tolerance(&self, screen_tolerance: f32) -> f32 {
        if self.zoom.abs() <= f32::EPSILON {
            screen_tolerance
        } else {
            screen_tolerance / self.zoom.abs()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_segment_distance_projects_onto_segment() {
        assert!((point_segment_distance((5.0, 3.0), (0.0, 0.0), (10.0, 0.0)) - 3.0).abs() < 1e-5);
        assert!((point_segment_distance((13.0, 4.0), (0.0, 0.0), (10.0, 0.0)) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn point_segment_distance_handles_degenerate_segment() {
        assert!((point_segment_distance((3.0, 4.0), (0.0, 0.0), (0.0, 0.0)) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn crossing_segments_intersect() {
        assert!(segments_intersect((0.0, 0.0), (10.0, 10.0), (0.0, 10.0), (10.0, 0.0)));
        assert!(!segments_intersect((0.0, 0.0), (10.0, 0.0), (0.0, 5.0), (10.0, 5.0)));
    }

    #[test]
    fn collinear_overlap_counts_as_intersection() {
        assert!(segments_intersect((0.0, 0.0), (10.0, 0.0), (5.0, 0.0), (15.0, 0.0)));
        assert!(!segments_intersect((0.0, 0.0), (10.0, 0.0), (11.0, 0.0), (15.0, 0.0)));
    }

    #[test]
    fn segment_through_rect_intersects() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(segment_intersects_rect((0.0, 20.0), (40.0, 20.0), &rect));
        assert!(segment_intersects_rect((15.0, 15.0), (16.0, 16.0), &rect));
        assert!(!segment_intersects_rect((0.0, 40.0), (40.0, 40.0), &rect));
    }

    #[test]
    fn rect_overlap_ignores_shared_border() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(a.overlaps(&Rect::new(5.0, 5.0, 10.0, 10.0)));
    }

    #[test]
    fn point_at_fraction_walks_arc_length() {
        let points = vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)];
        assert_eq!(point_at_fraction(&points, 0.5), Some((100.0, 0.0)));
        let quarter = point_at_fraction(&points, 0.25).unwrap();
        assert!((quarter.0 - 50.0).abs() < 1e-4 && quarter.1.abs() < 1e-4);
        let late = point_at_fraction(&points, 0.75).unwrap();
        assert!((late.0 - 100.0).abs() < 1e-4 && (late.1 - 50.0).abs() < 1e-4);
    }

    #[test]
    fn point_at_fraction_of_zero_length_path_is_start() {
        let points = vec![(3.0, 4.0), (3.0, 4.0)];
        assert_eq!(point_at_fraction(&points, 0.5), Some((3.0, 4.0)));
        assert_eq!(point_at_fraction(&[], 0.5), None);
    }

    #[test]
    fn crossings_skip_shared_endpoints() {
        let path = vec![(0.0, 0.0), (10.0, 0.0)];
        let touching = vec![((10.0, 0.0), (10.0, 10.0))];
        let crossing = vec![((5.0, -5.0), (5.0, 5.0))];
        assert_eq!(crossings_with_existing(&path, &touching), 0);
        assert_eq!(crossings_with_existing(&path, &crossing), 1);
    }

    #[test]
    fn hit_test_uses_tolerance() {
        let path = vec![(0.0, 0.0), (100.0, 0.0)];
        assert!(hit_test_path((50.0, 14.0), &path, 15.0));
        assert!(!hit_test_path((50.0, 16.0), &path, 15.0));
    }

    #[test]
    fn viewport_round_trips_points() {
        let viewport = Viewport {
            pan: (20.0, -10.0),
            zoom: 2.0,
        };
        let screen = viewport.to_screen((5.0, 5.0));
        assert_eq!(screen, (30.0, 0.0));
        assert_eq!(viewport.to_canvas(screen), (5.0, 5.0));
        assert_eq!(viewport.canvas_tolerance(15.0), 7.5);
    }
}
