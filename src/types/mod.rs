//! Native values that can be wrapped as SQL literals.

mod value;

pub use value::{DataType, Value};
