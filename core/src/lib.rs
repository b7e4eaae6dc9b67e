// core/src/lib.rs

//! Storefront core: the checkout and payment-settlement engine.
//!
//!  - [`checkout::CheckoutOrchestrator`] validates a cart against the catalog,
//!    opens a pending order and requests a hosted payment session.
//!  - [`settlement::SettlementReconciler`] verifies signed processor events and
//!    settles the matching order exactly once.
//!  - [`auth`] issues and verifies session tokens and hashes passwords.
//!
//! Both flows run on the small step-pipeline engine in [`pipeline`] and talk to
//! storage through the traits in [`store`].

pub mod auth;
pub mod checkout;
pub mod error;
pub mod models;
pub mod payment;
pub mod pipeline;
pub mod settlement;
pub mod store;

pub use crate::auth::{Principal, TokenIssuer};
pub use crate::checkout::{CheckoutOrchestrator, CheckoutReceipt, CheckoutRequest, CheckoutSettings};
pub use crate::error::{ErrorClass, PipelineError, ShopError, ShopResult};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
pub use crate::settlement::{SettlementOutcome, SettlementReconciler};
