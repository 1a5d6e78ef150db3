//! Config sources, applied in order after the defaults.

pub mod environment;
pub mod explicit_file;
pub mod global_file;
