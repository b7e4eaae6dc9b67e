// core/src/models/mod.rs

//! Records shared by the checkout and settlement flows.

pub mod cart;
pub mod order;
pub mod product;

pub use cart::{CartItem, CartLine, ProductRef};
pub use order::{NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, OrderSummary, PaymentStatus, Settlement};
pub use product::CatalogEntry;
