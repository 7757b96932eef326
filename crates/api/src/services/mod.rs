//! Business services sitting between routes and repositories.
//!
//! - [`tenant`] - Shop ownership guard used by every owner route
//! - [`checkout`] - Order pricing pipeline behind the public checkout route
//! - [`order_number`] - Monotonic `ORD-<millis>` generator

pub mod checkout;
pub mod order_number;
pub mod tenant;

pub use checkout::{Checkout, CheckoutError, CheckoutRequest, OrderPlaced, PgCheckoutStore};
pub use order_number::OrderNumberGenerator;
pub use tenant::{ShopDirectory, owned_shop};
