//! Minimum-area bounding rectangle of a pixel set
//!
//! Angles follow the on-screen convention: degrees, counter-clockwise
//! positive, even though pixel rows grow downwards.

use imageproc::geometry::convex_hull;
use imageproc::point::Point;

/// Rotated rectangle enclosing a point set with the smallest area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinAreaRect {
    pub center: (f64, f64),
    pub width: f64,
    pub height: f64,
    /// Orientation of one side, normalized into [-90, 0)
    pub angle: f64,
}

/// Compute the minimum-area rectangle of `points` with rotating calipers
/// over their convex hull.
///
/// Returns `None` for an empty set. A single point yields a zero-sized,
/// axis-aligned rectangle.
pub fn min_area_rect(points: &[Point<i32>]) -> Option<MinAreaRect> {
    let first = *points.first()?;
    let hull: Vec<Point<i32>> = convex_hull(points);

    if hull.len() < 2 {
        return Some(MinAreaRect {
            center: (first.x as f64, first.y as f64),
            width: 0.0,
            height: 0.0,
            angle: -90.0,
        });
    }

    let hull: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let n = hull.len();
    let mut best: Option<(f64, MinAreaRect)> = None;

    for i in 0..n {
        let (ox, oy) = hull[i];
        let (ex, ey) = (hull[(i + 1) % n].0 - ox, hull[(i + 1) % n].1 - oy);
        let length = (ex * ex + ey * ey).sqrt();
        if length < f64::EPSILON {
            continue;
        }

        // Unit vector along the edge and its normal
        let (ux, uy) = (ex / length, ey / length);
        let (vx, vy) = (-uy, ux);

        let mut min_u = f64::MAX;
        let mut max_u = f64::MIN;
        let mut min_v = f64::MAX;
        let mut max_v = f64::MIN;
        for &(px, py) in &hull {
            let u = ux * (px - ox) + uy * (py - oy);
            let v = vx * (px - ox) + vy * (py - oy);
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let (width, height) = (max_u - min_u, max_v - min_v);
        let area = width * height;
        if best.as_ref().is_some_and(|(best_area, _)| area >= *best_area) {
            continue;
        }

        let (cu, cv) = ((min_u + max_u) / 2.0, (min_v + max_v) / 2.0);
        let center = (ox + cu * ux + cv * vx, oy + cu * uy + cv * vy);

        // Rows grow downwards, so flip y to get the on-screen angle
        let angle = normalize_angle((-uy).atan2(ux).to_degrees());

        best = Some((
            area,
            MinAreaRect {
                center,
                width,
                height,
                angle,
            },
        ));
    }

    best.map(|(_, rect)| rect)
}

/// Fold a side orientation into [-90, 0). Opposite and perpendicular sides of
/// a rectangle all map to the same value.
fn normalize_angle(degrees: f64) -> f64 {
    let folded = degrees.rem_euclid(90.0) - 90.0;
    if folded >= 0.0 {
        -90.0
    } else {
        folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_rect(x0: i32, y0: i32, w: i32, h: i32) -> Vec<Point<i32>> {
        let mut points = Vec::new();
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                points.push(Point::new(x, y));
            }
        }
        points
    }

    #[test]
    fn test_empty_set_has_no_rect() {
        assert!(min_area_rect(&[]).is_none());
    }

    #[test]
    fn test_axis_aligned_block() {
        let rect = min_area_rect(&filled_rect(10, 20, 30, 5)).unwrap();
        assert_eq!(rect.angle, -90.0);
        assert!((rect.center.0 - 24.5).abs() < 1e-9);
        assert!((rect.center.1 - 22.0).abs() < 1e-9);
        let (long, short) = (rect.width.max(rect.height), rect.width.min(rect.height));
        assert!((long - 29.0).abs() < 1e-9 && (short - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_diagonal_segment_angle() {
        // Descends to the right on screen: -45 degrees
        let points: Vec<Point<i32>> = (0..50).map(|i| Point::new(i, i)).collect();
        let rect = min_area_rect(&points).unwrap();
        assert!((rect.angle + 45.0).abs() < 1e-6, "angle {}", rect.angle);
    }

    #[test]
    fn test_normalize_angle_range() {
        assert_eq!(normalize_angle(0.0), -90.0);
        assert_eq!(normalize_angle(90.0), -90.0);
        assert!((normalize_angle(8.0) + 82.0).abs() < 1e-9);
        assert!((normalize_angle(-8.0) + 8.0).abs() < 1e-9);
        assert!((normalize_angle(172.0) + 8.0).abs() < 1e-9);
    }
}
