//! Domain models for the API.
//!
//! Models double as `sqlx` row types (`FromRow`) and JSON response bodies,
//! except [`Shop`], which the repository reads through a validating row type.
//! Request bodies that are not whitelisted partial updates live next to the
//! model they create.

pub mod catalog;
pub mod coupon;
pub mod customer;
pub mod order;
pub mod payment;
pub mod session;
pub mod settings;
pub mod shipping;
pub mod shop;
pub mod user;

pub use catalog::{
    Category, CreateCategoryInput, CreateProductInput, ImportReport, Product, ProductCatalog,
    ProductExport, ProductListItem, PublicCategory, PublicProduct,
};
pub use coupon::{Coupon, CouponRejection, CreateCouponInput};
pub use customer::Customer;
pub use order::{
    BillingAddress, NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, ShippingAddress,
};
pub use payment::{CreatePaymentMethodInput, PaymentMethod, PublicPaymentMethod};
pub use session::{CurrentUser, session_keys};
pub use settings::ShopSettings;
pub use shipping::{CreateShippingMethodInput, PublicShippingMethod, ShippingMethod};
pub use shop::{AdminShopListItem, CreateShopInput, PublicShop, Shop, ShopSummary};
pub use user::{User, UserDetail};
