//! Composable experiment parameter bundles.

mod persist;
mod set;
mod value;

pub use set::{merge, ParameterSet};
pub use value::Value;
