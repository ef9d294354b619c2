//! Domain validation errors for core domain types.
//!
//! These errors are returned when an order submission or a status value
//! violates the rules the backend enforces on checkout.
//!
//! # Examples
//!
//! ```
//! use ordersync::domain::error::DomainError;
//! use ordersync::domain::order::NewOrder;
//! use rust_decimal_macros::dec;
//!
//! let order = NewOrder::pickup("", vec![], dec!(0));
//! assert!(matches!(order.validate(), Err(DomainError::MissingField { field: "customer_phone" })));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Orders must contain at least one line item.
    #[error("order items cannot be empty")]
    EmptyItems,

    /// Totals are taken as given but must be positive.
    #[error("order total must be positive, got {total}")]
    NonPositiveTotal {
        /// The invalid total that was provided.
        total: rust_decimal::Decimal,
    },

    /// Delivery orders need somewhere to deliver to.
    #[error("delivery address is required for delivery orders")]
    MissingDeliveryAddress,

    /// Unrecognized order status name.
    #[error("unknown order status '{0}'")]
    UnknownStatus(String),
}
