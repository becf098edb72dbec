//! Service status records and parsing of `services status` output.

mod status;

pub use status::*;
