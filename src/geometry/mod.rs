//! Geometry validity and repair.

mod repair;
mod validity;

pub use repair::repair;
pub use validity::{explain_validity, is_valid, problems, Problem};
