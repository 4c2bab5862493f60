extern crate self as blockdag_core;

pub mod log;
pub mod time;
