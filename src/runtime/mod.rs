//! Runtime-side view of values under test.

mod handle;
mod value;

pub use handle::{ValueHandle, ValueTag};
pub use value::Value;
