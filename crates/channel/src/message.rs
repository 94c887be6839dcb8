//! Wire formats for the intent and failure topics.

use common::{BuyerId, ItemId, RejectReason, ReservationToken};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An admitted reservation on its way to fulfillment.
///
/// Wire format is `<buyerId>:<itemId>:<token>`, three colon-delimited
/// fields. The token is the idempotency key: a redelivered message
/// carries the same token as the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderIntent {
    pub buyer_id: BuyerId,
    pub item_id: ItemId,
    pub token: ReservationToken,
}

impl OrderIntent {
    /// Creates a new intent.
    pub fn new(buyer_id: BuyerId, item_id: ItemId, token: ReservationToken) -> Self {
        Self {
            buyer_id,
            item_id,
            token,
        }
    }

    /// Encodes the intent into its wire form.
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.buyer_id, self.item_id, self.token)
    }
}

/// Why an intent payload could not be parsed.
///
/// A malformed message is a poison message: the fulfillment stage
/// acknowledges and drops it so it can never block the channel.
#[derive(Debug, Error)]
pub enum MalformedIntent {
    /// Fewer than 3 colon-delimited fields.
    #[error("expected 3 colon-delimited fields, found {found}")]
    FieldCount { found: usize },

    /// Buyer id field was not numeric.
    #[error("buyer id is not numeric: '{0}'")]
    BuyerId(String),

    /// Item id field was not numeric.
    #[error("item id is not numeric: '{0}'")]
    ItemId(String),

    /// Token field was not a valid UUID.
    #[error("token is not a valid uuid: '{0}'")]
    Token(String),
}

impl std::str::FromStr for OrderIntent {
    type Err = MalformedIntent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 3 {
            return Err(MalformedIntent::FieldCount { found: parts.len() });
        }

        let buyer_id: i64 = parts[0]
            .parse()
            .map_err(|_| MalformedIntent::BuyerId(parts[0].to_string()))?;
        let item_id: i64 = parts[1]
            .parse()
            .map_err(|_| MalformedIntent::ItemId(parts[1].to_string()))?;
        let token: ReservationToken = parts[2]
            .parse()
            .map_err(|_| MalformedIntent::Token(parts[2].to_string()))?;

        Ok(Self {
            buyer_id: BuyerId::new(buyer_id),
            item_id: ItemId::new(item_id),
            token,
        })
    }
}

/// A rejected or erroring attempt, published on the failure topic as
/// JSON and recorded out of the hot path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEvent {
    pub buyer_id: BuyerId,
    pub item_id: ItemId,
    pub reason: RejectReason,
    pub origin_address: String,
}
