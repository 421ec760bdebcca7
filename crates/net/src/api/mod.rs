//! Typed backend endpoints
//!
//! Each call is a fixed path, method and body shape on top of the gateway.

mod advice;
mod holdings;
mod users;

use std::sync::Arc;

use finagent_core::{ClientConfig, SessionContext};

use crate::error::Result;
use crate::gateway::Gateway;
use crate::navigator::Navigator;

pub use holdings::DELETE_FALLBACK_MESSAGE;

/// Finance Agent backend client
pub struct FinanceApi {
    gateway: Gateway,
}

impl FinanceApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Build a gateway from config and wrap it
    pub fn connect(
        config: &ClientConfig,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        Ok(Self::new(Gateway::new(config, session, navigator)?))
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        self.gateway.session()
    }
}
