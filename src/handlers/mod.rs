//! HTTP handlers

pub mod health;
pub mod history;
pub mod posture;
pub mod sessions;
pub mod stream;
