pub mod completions;
pub mod config;
pub mod probe;
pub mod tap;
