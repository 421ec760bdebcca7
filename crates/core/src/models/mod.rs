//! Data models for the Finance Agent API

mod advice;
mod holding;
mod id;
mod user;

pub use advice::*;
pub use holding::*;
pub use user::*;
