//! Finance Agent Network Library
//!
//! HTTP access to the Finance Agent backend.
//!
//! # Architecture
//!
//! - **Gateway**: attaches credentials, refreshes expired tokens, normalizes
//!   responses and errors
//! - **Navigator**: hook the gateway calls when the session is lost
//! - **FinanceApi**: typed endpoints for users, holdings and advice
//!
//! # Usage
//!
//! ```ignore
//! let session = Arc::new(SessionContext::init(store)?);
//! let api = FinanceApi::connect(&config, session, Arc::new(NoopNavigator))?;
//!
//! api.sign_in(&SignIn { username, password }).await?;
//! let holdings = api.list_holdings(&user_id).await?;
//! ```

pub mod api;
pub mod error;
pub mod gateway;
pub mod navigator;

pub use api::{FinanceApi, DELETE_FALLBACK_MESSAGE};
pub use error::{Error, Result};
pub use gateway::{Gateway, RequestOptions};
pub use navigator::{CountingNavigator, Navigator, NoopNavigator, LANDING_ROUTE};
