use thiserror::Error;

pub type Result<T> = std::result::Result<T, SettlementError>;

/// Failure taxonomy for the settlement core.
///
/// Every variant maps to a stable client-facing kind token (see [`SettlementError::kind`])
/// so boundaries can render a uniform `kind + message` envelope. None of these
/// are fatal to the process.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("checkout attempted with an empty cart")]
    CartEmpty,

    #[error("not enough stock for SKU {sku}: only {available} left")]
    OutOfStock { sku: String, available: u32 },

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("{kind} not found: {key}")]
    ResourceNotFound { kind: &'static str, key: String },

    #[error("no shipping address could be resolved for the buyer")]
    AddressNotFound,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("order is no longer in a cancellable status")]
    CancellationNotAllowed,

    #[error("order was modified concurrently; re-read and retry")]
    ConcurrencyConflict,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SettlementError {
    /// Stable kind token for the client-facing error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CartEmpty => "CART_EMPTY",
            Self::OutOfStock { .. } => "OUT_OF_STOCK",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::ResourceNotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::AddressNotFound => "ADDRESS_NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::CancellationNotAllowed => "CANCELLATION_NOT_ALLOWED",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::Csv(_) => "CSV_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tokens_are_stable() {
        assert_eq!(SettlementError::CartEmpty.kind(), "CART_EMPTY");
        assert_eq!(
            SettlementError::OutOfStock {
                sku: "SKU-1".into(),
                available: 2
            }
            .kind(),
            "OUT_OF_STOCK"
        );
        assert_eq!(
            SettlementError::ConcurrencyConflict.kind(),
            "CONCURRENCY_CONFLICT"
        );
    }

    #[test]
    fn test_out_of_stock_message_carries_sku_and_available() {
        let err = SettlementError::OutOfStock {
            sku: "SKU-9".into(),
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("SKU-9"));
        assert!(msg.contains('3'));
    }
}
