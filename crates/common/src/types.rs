use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a sale item.
///
/// Wraps the durable store's numeric key to provide type safety and
/// prevent mixing up item ids with buyer ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Creates an item ID from a raw numeric key.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric key.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Unique identifier for a buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuyerId(i64);

impl BuyerId {
    /// Creates a buyer ID from a raw numeric key.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric key.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for BuyerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for BuyerId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<BuyerId> for i64 {
    fn from(id: BuyerId) -> Self {
        id.0
    }
}

/// Error returned when a reservation token fails to parse.
#[derive(Debug, thiserror::Error)]
#[error("invalid reservation token: {0}")]
pub struct ParseTokenError(#[from] uuid::Error);

/// Globally unique token minted for one successful reservation attempt.
///
/// The token identifies a single logical purchase: a retried intent
/// message carries the same token, which is what makes redelivery
/// recognizable at the durable-commit stage. Tokens are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationToken(Uuid);

impl ReservationToken {
    /// Mints a new random token.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a token from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReservationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReservationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReservationToken {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for ReservationToken {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ReservationToken> for Uuid {
    fn from(token: ReservationToken) -> Self {
        token.0
    }
}

/// User-visible reason a reservation attempt was rejected.
///
/// All three are synchronous, non-retriable outcomes; the buyer may
/// retry manually. The serialized spelling is the wire/reporting code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Buyer is present in the blacklist.
    #[serde(rename = "BLACKLIST")]
    Blacklist,
    /// The fast-store counter reported no stock left.
    #[serde(rename = "OUT_OF_STOCK")]
    OutOfStock,
    /// The distributed-lock fallback timed out waiting for the lock.
    #[serde(rename = "SYSTEM_BUSY")]
    SystemBusy,
}

impl RejectReason {
    /// Returns the stable reporting code for this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blacklist => "BLACKLIST",
            Self::OutOfStock => "OUT_OF_STOCK",
            Self::SystemBusy => "SYSTEM_BUSY",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
