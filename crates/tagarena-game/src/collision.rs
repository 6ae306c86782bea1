//! Circle geometry shared by tag checks and boundary clamping.

/// Distance between two points.
pub fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

/// Circle-to-circle overlap. `min_distance` is the sum of both radii; the
/// comparison stays in squared space.
pub fn circles_overlap(x1: f32, y1: f32, x2: f32, y2: f32, min_distance: f32) -> bool {
    let dx = x1 - x2;
    let dy = y1 - y2;
    dx * dx + dy * dy < min_distance * min_distance
}

/// Pull a point back inside a circle of `max_dist` around the center,
/// preserving its bearing.
pub fn clamp_to_circle(x: f32, y: f32, center_x: f32, center_y: f32, max_dist: f32) -> (f32, f32) {
    let dx = x - center_x;
    let dy = y - center_y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist > max_dist {
        let angle = dy.atan2(dx);
        (
            center_x + angle.cos() * max_dist,
            center_y + angle.sin() * max_dist,
        )
    } else {
        (x, y)
    }
}

/// Midpoint between two players, where tag effects spawn.
pub fn collision_point(x1: f32, y1: f32, x2: f32, y2: f32) -> (f32, f32) {
    ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
}
