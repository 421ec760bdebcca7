//! View models
//!
//! Front-end state that sits between commands and the API client.

mod advice;
mod auth;
mod holdings;

pub use advice::AdviceViewModel;
pub use auth::AuthViewModel;
pub use holdings::HoldingsViewModel;
