/// Error types for inventory operations
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Sellable unit {0} not found")]
    UnitNotFound(i32),

    #[error("Sellable unit {0} is inactive")]
    UnitInactive(i32),

    #[error("Capacity exceeded for unit {0}")]
    CapacityExceeded(i32),
}

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        InventoryError::DatabaseError(err.to_string())
    }
}
