use super::{
    frame::{body_to_nav, relative_heading, transform},
    vec2d::{Vec2D, normalize_deg},
};
use rand::Rng;

const TOL: f64 = 1e-9;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < TOL, "expected {b}, got {a}");
}

#[test]
fn test_zero_heading_is_identity() {
    let body = Vec2D::new(2.1, -0.7);
    let nav = body_to_nav(body, 0.0);
    assert_close(nav.x(), 2.1);
    assert_close(nav.y(), -0.7);
}

#[test]
fn test_quarter_turn() {
    let nav = body_to_nav(Vec2D::new(1.0, 0.0), 90.0);
    assert_close(nav.x(), 0.0);
    assert_close(nav.y(), 1.0);

    let nav = body_to_nav(Vec2D::new(0.0, 1.0), 90.0);
    assert_close(nav.x(), -1.0);
    assert_close(nav.y(), 0.0);
}

#[test]
fn test_rotation_preserves_magnitude() {
    let mut rng = rand::rng();
    for _ in 0..1000 {
        let body = Vec2D::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0));
        let heading = rng.random_range(0.0..360.0);
        let nav = body_to_nav(body, heading);
        assert!((nav.abs() - body.abs()).abs() < 1e-9 * body.abs().max(1.0));
    }
}

#[test]
fn test_relative_heading() {
    assert_close(relative_heading(Vec2D::new(1.0, 0.0)), 0.0);
    assert_close(relative_heading(Vec2D::new(0.0, 1.0)), 90.0);
    assert_close(relative_heading(Vec2D::new(-1.0, 0.0)), 180.0);
    assert_close(relative_heading(Vec2D::new(0.0, -1.0)), 270.0);
    assert_close(relative_heading(Vec2D::new(0.0, 0.0)), 0.0);
}

#[test]
fn test_target_heading_wraps() {
    let step = transform(Vec2D::new(0.0, -2.0), 45.0);
    assert_close(step.target_heading_deg, 315.0);

    let step = transform(Vec2D::new(1.0, 1.0), 350.0);
    assert_close(step.target_heading_deg, 35.0);

    let step = transform(Vec2D::new(0.0, 0.0), 123.0);
    assert_close(step.target_heading_deg, 123.0);
    assert_close(step.delta.abs(), 0.0);
}

#[test]
fn test_normalize_deg() {
    assert_close(normalize_deg(360.0), 0.0);
    assert_close(normalize_deg(-90.0), 270.0);
    assert_close(normalize_deg(725.0), 5.0);
    assert!(normalize_deg(-1e-20_f64) < 360.0);
}

#[test]
fn test_accumulation() {
    let mut acc: Vec2D<f64> = Vec2D::zero();
    acc += Vec2D::new(1.0, 2.0);
    acc += Vec2D::new(-0.5, 0.5);
    assert_close(acc.x(), 0.5);
    assert_close(acc.y(), 2.5);
    assert_eq!(format!("{acc:.1}"), "[0.5, 2.5]");
}
