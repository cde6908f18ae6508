//! Services that sit between handlers and the outside world.

pub mod photos;

pub use photos::{PhotoError, PhotoService, PhotoUpload};
