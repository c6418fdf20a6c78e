use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::InvalidEnumValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl FromStr for Side {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(InvalidEnumValue {
                kind: "side",
                value: other.to_string(),
            }),
        }
    }
}

/// A trade signal as the owner sees it.
///
/// `owner_stop_loss` / `owner_take_profit` are owner-only: they exist so the
/// server can manage exits, and must never appear in any device-facing
/// payload. The device DTO (`dispatch::wire::DeviceCommand`) has no fields
/// for them.
#[derive(Debug, Clone)]
pub struct Signal {
    pub signal_id: Uuid,
    pub instrument: String,
    pub side: Side,
    pub entry_price: f64,
    pub volume: f64,
    pub owner_stop_loss: Option<f64>,
    pub owner_take_profit: Option<f64>,
    pub created_at: DateTime<Utc>,
}
