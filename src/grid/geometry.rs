//! Planar geometry helpers used by the grid index and the snap engine.
//!
//! All footprint tests are done in the horizontal (x, y) plane. Vertical
//! resolution is handled separately by walking a column's depth spans.

/// Tolerance for on-edge tests, in model units (metres).
const EDGE_EPSILON: f64 = 1e-9;

/// 2-D horizontal distance between two (x, y) points.
pub fn horizontal_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// 3-D Euclidean distance.
pub fn distance_3d(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Signed shoelace area of a closed polygon (vertices in order, not repeated).
pub fn polygon_area(vertices: &[(f64, f64)]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let (x0, y0) = vertices[i];
            let (x1, y1) = vertices[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum();
    twice / 2.0
}

/// Arithmetic mean of the polygon vertices.
pub fn polygon_centroid(vertices: &[(f64, f64)]) -> (f64, f64) {
    if vertices.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = vertices.len() as f64;
    let (sx, sy) = vertices
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    (sx / n, sy / n)
}

fn on_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> bool {
    let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
    let len = horizontal_distance(a, b);
    if cross.abs() > EDGE_EPSILON * len.max(1.0) {
        return false;
    }
    p.0 >= a.0.min(b.0) - EDGE_EPSILON
        && p.0 <= a.0.max(b.0) + EDGE_EPSILON
        && p.1 >= a.1.min(b.1) - EDGE_EPSILON
        && p.1 <= a.1.max(b.1) + EDGE_EPSILON
}

/// Crossing-number point-in-polygon test. Points on an edge count as inside.
///
/// Works for any simple polygon regardless of vertex orientation.
pub fn point_in_polygon(p: (f64, f64), vertices: &[(f64, f64)]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[j];
        if on_segment(p, a, b) {
            return true;
        }
        if (a.1 > p.1) != (b.1 > p.1) {
            let x_cross = (b.0 - a.0) * (p.1 - a.1) / (b.1 - a.1) + a.0;
            if p.0 < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
