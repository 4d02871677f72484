#![forbid(unsafe_code)]

pub mod engine;
pub mod model;
pub mod time;

pub use time::Clock;
