//! Holdings view model
//!
//! Caches the signed-in user's holdings list and applies deletes
//! optimistically. Every cache write is tagged with an epoch; bumping the
//! epoch cancels in-flight list fetches so they cannot overwrite a newer
//! optimistic state.

use std::sync::{Arc, Mutex, MutexGuard};

use finagent_core::{CreateHolding, DeleteHolding, DeleteHoldingResponse, Holding};
use finagent_net::FinanceApi;
use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, Result};

#[derive(Debug, Default)]
struct HoldingsCache {
    data: Option<Vec<Holding>>,
    /// Epoch for detecting stale list fetches
    epoch: u64,
}

pub struct HoldingsViewModel {
    api: Arc<FinanceApi>,
    user_id: String,
    cache: Mutex<HoldingsCache>,
}

impl HoldingsViewModel {
    pub fn new(api: Arc<FinanceApi>, user_id: impl Into<String>) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            cache: Mutex::new(HoldingsCache::default()),
        }
    }

    /// Last known list, `None` before the first successful fetch
    pub fn holdings(&self) -> Option<Vec<Holding>> {
        self.lock().ok().and_then(|c| c.data.clone())
    }

    /// Fetch the list and store it, unless the fetch was cancelled meanwhile
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn refresh(&self) -> Result<Vec<Holding>> {
        let epoch = self.lock()?.epoch;
        let holdings = self.api.list_holdings(&self.user_id).await?;

        let mut cache = self.lock()?;
        if cache.epoch != epoch {
            debug!(epoch, current = cache.epoch, "Discarding stale holdings fetch");
            return Ok(cache.data.clone().unwrap_or_default());
        }
        cache.data = Some(holdings.clone());
        Ok(holdings)
    }

    /// Invalidate any list fetch currently in flight
    pub fn cancel_queries(&self) -> Result<()> {
        self.lock()?.epoch += 1;
        Ok(())
    }

    /// Add a ticker with the default quantity, then refetch the list
    #[instrument(skip(self))]
    pub async fn add(&self, ticker: &str) -> Result<Holding> {
        let data = CreateHolding::from_input(&self.user_id, ticker)
            .ok_or_else(|| AppError::Validation("Ticker must not be empty".into()))?;

        let created = self.api.create_holding(&data).await?;
        info!(stock = %data.stock, "Holding added");
        self.refresh().await?;
        Ok(created)
    }

    /// Remove a holding optimistically.
    ///
    /// The row disappears from the cache before the backend is asked. The
    /// delete call itself never fails; the list refetch that follows is the
    /// source of truth. If that refetch fails the pre-delete list is put back.
    #[instrument(skip(self))]
    pub async fn delete(&self, stock: &str) -> Result<DeleteHoldingResponse> {
        self.cancel_queries()?;

        let snapshot = {
            let mut cache = self.lock()?;
            let snapshot = cache.data.clone();
            if let Some(data) = cache.data.as_mut() {
                data.retain(|h| h.stock != stock);
            }
            snapshot
        };

        let response = self
            .api
            .delete_holding(&DeleteHolding {
                user_id: self.user_id.clone(),
                stock: stock.to_string(),
            })
            .await;

        match self.refresh().await {
            Ok(holdings) => {
                if holdings.iter().any(|h| h.stock == stock) {
                    warn!(stock, "Holding still listed after delete");
                }
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "Refetch after delete failed, restoring previous list");
                self.lock()?.data = snapshot;
                Err(e)
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HoldingsCache>> {
        self.cache
            .lock()
            .map_err(|_| finagent_core::Error::LockPoisoned("holdings cache").into())
    }
}
