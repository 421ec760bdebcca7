//! Advice endpoint

use finagent_core::{Advice, GenerateAdvice};
use tracing::instrument;

use super::FinanceApi;
use crate::error::Result;
use crate::gateway::RequestOptions;

impl FinanceApi {
    /// `POST /generate_advice`
    #[instrument(skip(self, data), fields(user_id = %data.user_id))]
    pub async fn generate_advice(&self, data: &GenerateAdvice) -> Result<Advice> {
        self.gateway
            .request("/generate_advice", RequestOptions::post(data)?)
            .await
    }
}
