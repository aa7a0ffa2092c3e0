//! Domain model for recurring subscription billing.
//!
//! Records (`Subscription`, `SubscriptionPayment`, `Wallet`), the money types
//! they carry, and the ports the billing job uses to reach storage and the
//! chain.

pub mod money;
pub mod payment;
pub mod portfolio;
pub mod ports;
pub mod subscription;
pub mod transfer;
pub mod wallet;
