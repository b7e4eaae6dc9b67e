// server/src/web/handlers/mod.rs

pub mod admin_product_handlers;
pub mod auth_handlers;
pub mod favorite_handlers;
pub mod inquiry_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod review_handlers;
pub mod user_handlers;
