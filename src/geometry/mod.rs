pub mod control_point;

pub use control_point::{ControlPoint, Derivatives};
