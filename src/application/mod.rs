//! Application layer: the billing pass that ties the ports together.
//!
//! `BillingJob` fans each due subscription out to its own `tokio` task and
//! waits for all of them to settle before running the cancellation pass.

pub mod billing;
