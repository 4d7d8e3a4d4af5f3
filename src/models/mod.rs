//! API models

pub mod scan;
pub mod user;

pub use scan::*;
pub use user::*;
