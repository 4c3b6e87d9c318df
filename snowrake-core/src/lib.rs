// src/lib.rs

pub mod pacing;
pub mod platforms;
pub mod services;
pub mod test_utils;
pub mod utils;

pub use snowrake_common::error::Error;
pub use snowrake_common::models;
