pub(crate) mod frame;
pub(crate) mod vec2d;
#[cfg(test)]
mod tests;

pub use frame::{NavStep, transform};
pub use vec2d::Vec2D;
