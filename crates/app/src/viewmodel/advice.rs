//! Advice view model

use std::sync::{Arc, Mutex};

use finagent_core::{Advice, GenerateAdvice};
use finagent_net::FinanceApi;
use tracing::{info, instrument};

use crate::error::Result;

/// Requests advice and keeps only the most recent result
pub struct AdviceViewModel {
    api: Arc<FinanceApi>,
    user_id: String,
    latest: Mutex<Option<Advice>>,
}

impl AdviceViewModel {
    pub fn new(api: Arc<FinanceApi>, user_id: impl Into<String>) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            latest: Mutex::new(None),
        }
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn generate(&self) -> Result<Advice> {
        let advice = self
            .api
            .generate_advice(&GenerateAdvice {
                user_id: self.user_id.clone(),
            })
            .await?;
        info!(generated_at = %advice.generated_at, "Advice generated");

        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(advice.clone());
        }
        Ok(advice)
    }

    pub fn latest(&self) -> Option<Advice> {
        self.latest.lock().ok().and_then(|l| l.clone())
    }
}
