//! Accept loop and connection dispatch.

pub mod listener;
pub mod pool;
