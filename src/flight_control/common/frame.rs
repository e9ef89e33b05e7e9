use super::vec2d::{Vec2D, normalize_deg};

/// Result of mapping one body-frame step into the navigation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavStep {
    /// Displacement in the navigation frame (x = north, y = east).
    pub delta: Vec2D<f64>,
    /// Heading the vehicle should face after the step, in `[0, 360)`.
    pub target_heading_deg: f64,
}

/// Rotates a body-frame displacement (x forward, y right) by the current heading into the
/// north/east navigation frame.
pub fn body_to_nav(body: Vec2D<f64>, heading_deg: f64) -> Vec2D<f64> { body.rotated(heading_deg) }

/// Bearing of a body-frame displacement relative to the vehicle nose, in `[0, 360)`.
/// A zero displacement yields 0.
pub fn relative_heading(body: Vec2D<f64>) -> f64 { body.heading_deg() }

/// Full frame transform: navigation displacement plus the absolute target heading
/// `(heading + relative_heading) mod 360`.
pub fn transform(body: Vec2D<f64>, heading_deg: f64) -> NavStep {
    NavStep {
        delta: body_to_nav(body, heading_deg),
        target_heading_deg: normalize_deg(heading_deg + relative_heading(body)),
    }
}
