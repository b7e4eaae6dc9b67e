// server/src/models/mod.rs

//! Row types for the catalog, account and feedback tables. Order records live
//! in the core crate.

pub mod inquiry;
pub mod product;
pub mod review;
pub mod user;

pub use inquiry::Inquiry;
pub use product::{Product, ProductListing};
pub use review::ReviewView;
pub use user::User;
