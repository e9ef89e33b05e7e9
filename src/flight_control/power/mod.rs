mod estimator;
mod power_loop;

pub use estimator::{PowerEstimator, PowerState};
pub use power_loop::{PowerExit, PowerLoop, PowerStats};
