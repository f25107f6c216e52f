//! Request handlers.

pub mod conf;
pub mod health;
pub mod processing;

pub use conf::*;
pub use health::*;
pub use processing::*;
