//! API models

pub mod posture;
pub mod session;

pub use posture::*;
pub use session::*;
