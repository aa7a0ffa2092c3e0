use super::payment::{PaymentFailure, SubscriptionPayment};
use super::portfolio::Portfolio;
use super::subscription::Subscription;
use super::transfer::{TransferRequest, TransferResponse};
use super::wallet::Wallet;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn store(&self, subscription: Subscription) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Subscription>>;
    /// Active subscriptions whose next payment date is at or before `now`.
    async fn due_for_payment(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>>;
    /// Active subscriptions whose end date is at or before `now`.
    async fn expired(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>>;
    async fn deactivate(&self, id: Uuid) -> Result<()>;
    async fn set_next_payment_date(&self, id: Uuid, date: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create(&self, payment: SubscriptionPayment) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<SubscriptionPayment>>;
    async fn for_subscription(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionPayment>>;
    /// Fails with `InvalidState` unless the payment is still pending.
    async fn mark_succeeded(&self, id: Uuid, transaction_hash: String) -> Result<()>;
    /// Fails with `InvalidState` unless the payment is still pending.
    async fn mark_failed(&self, id: Uuid, failure: &PaymentFailure) -> Result<()>;
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn store(&self, wallet: Wallet) -> Result<()>;
    async fn for_user(&self, user_id: Uuid) -> Result<Vec<Wallet>>;
}

/// Looks up the fungible assets a wallet holds on chain.
#[async_trait]
pub trait AssetIndexer: Send + Sync {
    async fn search_wallet_assets(&self, owner: &str) -> Result<Portfolio>;
}

/// Moves funds out of a user's server-managed wallet.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn transfer(&self, request: TransferRequest) -> Result<TransferResponse>;
}

pub type SubscriptionStoreRef = Arc<dyn SubscriptionStore>;
pub type PaymentStoreRef = Arc<dyn PaymentStore>;
pub type WalletStoreRef = Arc<dyn WalletStore>;
pub type AssetIndexerRef = Arc<dyn AssetIndexer>;
pub type TransferExecutorRef = Arc<dyn TransferExecutor>;

/// Everything the billing job talks to. Cheap to clone into tasks.
#[derive(Clone)]
pub struct BillingPorts {
    pub subscriptions: SubscriptionStoreRef,
    pub payments: PaymentStoreRef,
    pub wallets: WalletStoreRef,
    pub indexer: AssetIndexerRef,
    pub transfers: TransferExecutorRef,
}
