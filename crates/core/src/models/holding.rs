//! Holding models

use serde::{Deserialize, Serialize};

/// Quantity recorded for every holding created from the client
pub const DEFAULT_QUANTITY: u32 = 1;

/// A user's position in a stock ticker
///
/// Deletes address a holding by `(user_id, stock)`, not by `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    #[serde(
        default,
        deserialize_with = "super::id::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub stock: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(deserialize_with = "super::id::deserialize")]
    pub user_id: String,
}

/// Body of `POST /holding/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateHolding {
    pub user_id: String,
    pub stock: String,
    pub quantity: u32,
}

impl CreateHolding {
    /// Normalize a ticker as typed by the user: trimmed and upper-cased.
    ///
    /// Returns `None` when nothing is left after trimming.
    pub fn from_input(user_id: &str, ticker: &str) -> Option<Self> {
        let stock = ticker.trim().to_uppercase();
        if stock.is_empty() {
            return None;
        }
        Some(Self {
            user_id: user_id.to_string(),
            stock,
            quantity: DEFAULT_QUANTITY,
        })
    }
}

/// Body of `DELETE /holding/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteHolding {
    pub user_id: String,
    pub stock: String,
}

/// Response of `DELETE /holding/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteHoldingResponse {
    #[serde(default)]
    pub message: String,
}
