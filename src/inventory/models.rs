use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of sellable unit, determining shipping and reward rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Seat-limited event booking; earns a flat coin rate per seat
    Event,
    /// Marketplace stock item; earns percentage cashback and pays shipping
    Product,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Event => "event",
            UnitKind::Product => "product",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of finite inventory: an event with seats or a product with stock
///
/// Invariant: `0 <= reserved_count <= total_capacity`, enforced by the
/// conditional SQL updates in the repository (and a CHECK constraint).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SellableUnit {
    pub id: i32,
    pub name: String,
    pub kind: UnitKind,
    pub unit_price: Decimal,
    pub total_capacity: i32,
    pub reserved_count: i32,
    pub coins_per_unit: i64,
    pub active: bool,
}

impl SellableUnit {
    /// Capacity still available for new reservations
    pub fn remaining(&self) -> i32 {
        self.total_capacity - self.reserved_count
    }
}

/// A provisional capacity hold, created before payment confirmation
///
/// The row id doubles as the reservation token handed to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: Uuid,
    pub unit_id: i32,
    pub requester_id: i32,
    pub quantity: i32,
    pub idempotency_key: String,
    pub released: bool,
    pub created_at: DateTime<Utc>,
}
