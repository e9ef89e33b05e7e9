use num::traits::{Float, Num, NumAssignOps, NumCast};
use std::fmt::Display;
use std::ops::{Add, AddAssign};

/// A 2D vector generic over any numeric type.
///
/// Used both for body-frame displacements (x forward, y right) and for navigation-frame
/// positions (x north, y east). Both frames share the clockwise-positive angle convention, so a
/// rotation by the vehicle heading maps one onto the other.
///
/// # Type Parameters
/// * `T` - The functionality for the vector depends on traits implemented by `T`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct Vec2D<T> {
    /// The x-component (forward / north).
    x: T,
    /// The y-component (right / east).
    y: T,
}

impl<T> Vec2D<T>
where T: Float + NumCast + NumAssignOps
{
    /// Computes the magnitude (absolute value) of the vector.
    pub fn abs(&self) -> T { self.x.hypot(self.y) }

    /// Rotates the vector by a given angle in degrees (clockwise positive).
    ///
    /// ```text
    /// x' = x * cos(a) - y * sin(a)
    /// y' = x * sin(a) + y * cos(a)
    /// ```
    pub fn rotate_by(&mut self, angle_degrees: T) {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let new_x = self.x * cos - self.y * sin;
        self.y = self.x * sin + self.y * cos;
        self.x = new_x;
    }

    /// Returns a copy rotated by `angle_degrees`.
    pub fn rotated(mut self, angle_degrees: T) -> Self {
        self.rotate_by(angle_degrees);
        self
    }

    /// Direction of the vector in degrees, normalized into `[0, 360)`.
    ///
    /// The zero vector has no direction; it is defined to point at 0 degrees.
    pub fn heading_deg(&self) -> T {
        if self.x.is_zero() && self.y.is_zero() {
            return T::zero();
        }
        normalize_deg(self.y.atan2(self.x).to_degrees())
    }
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn normalize_deg<T: Float>(deg: T) -> T {
    let full = T::from(360.0).unwrap_or_else(T::zero);
    let wrapped = deg % full;
    let wrapped = if wrapped < T::zero() { wrapped + full } else { wrapped };
    // -1e-20 % 360 + 360 rounds to exactly 360
    if wrapped >= full { T::zero() } else { wrapped }
}

impl<T: Copy> Vec2D<T> {
    /// Creates a new vector with the given x and y components.
    pub const fn new(x: T, y: T) -> Self { Self { x, y } }

    pub const fn x(&self) -> T { self.x }

    pub const fn y(&self) -> T { self.y }
}

impl<T: Num + Copy> Vec2D<T> {
    /// Creates a zero vector (x = 0, y = 0).
    pub fn zero() -> Self { Self::new(T::zero(), T::zero()) }
}

impl<T: Num> Add for Vec2D<T> {
    type Output = Vec2D<T>;

    fn add(self, rhs: Vec2D<T>) -> Self::Output {
        Self::Output { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl<T: Num + Copy> AddAssign for Vec2D<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.x = self.x + rhs.x;
        self.y = self.y + rhs.y;
    }
}

impl<T: Display> Display for Vec2D<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(prec) = f.precision() {
            write!(f, "[{:.*}, {:.*}]", prec, self.x, prec, self.y)
        } else {
            write!(f, "[{}, {}]", self.x, self.y)
        }
    }
}
