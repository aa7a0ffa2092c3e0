use crate::domain::payment::{PaymentFailure, SubscriptionPayment};
use crate::domain::ports::{PaymentStore, SubscriptionStore, WalletStore};
use crate::domain::subscription::Subscription;
use crate::domain::wallet::Wallet;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store for subscriptions.
///
/// Uses `Arc<RwLock<HashMap<Uuid, Subscription>>>` so clones share state.
/// Used by tests and by the CLI when no database path is given.
#[derive(Default, Clone)]
pub struct InMemorySubscriptionStore {
    subscriptions: Arc<RwLock<HashMap<Uuid, Subscription>>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Subscription) + Send,
    {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("subscription {id}")))?;
        apply(subscription);
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn store(&self, subscription: Subscription) -> Result<()> {
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.insert(subscription.id, subscription);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Subscription>> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions.get(&id).cloned())
    }

    async fn due_for_payment(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions
            .values()
            .filter(|s| s.is_due(now))
            .cloned()
            .collect())
    }

    async fn expired(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions
            .values()
            .filter(|s| s.is_expired(now))
            .cloned()
            .collect())
    }

    async fn deactivate(&self, id: Uuid) -> Result<()> {
        self.update(id, |s| s.active = false).await
    }

    async fn set_next_payment_date(&self, id: Uuid, date: DateTime<Utc>) -> Result<()> {
        self.update(id, |s| s.next_payment_date = date).await
    }
}

/// A thread-safe in-memory store for payment attempts.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<Uuid, SubscriptionPayment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<SubscriptionPayment> {
        let payments = self.payments.read().await;
        payments.values().cloned().collect()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create(&self, payment: SubscriptionPayment) -> Result<()> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.id) {
            return Err(Error::InvalidState(format!(
                "payment {} already exists",
                payment.id
            )));
        }
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubscriptionPayment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }

    async fn for_subscription(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionPayment>> {
        let payments = self.payments.read().await;
        let mut matching: Vec<_> = payments
            .values()
            .filter(|p| p.subscription_id == subscription_id)
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.payment_date);
        Ok(matching)
    }

    async fn mark_succeeded(&self, id: Uuid, transaction_hash: String) -> Result<()> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("payment {id}")))?;
        payment.succeed(transaction_hash)
    }

    async fn mark_failed(&self, id: Uuid, failure: &PaymentFailure) -> Result<()> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("payment {id}")))?;
        payment.fail(failure)
    }
}

/// A thread-safe in-memory store for wallets, indexed by id.
#[derive(Default, Clone)]
pub struct InMemoryWalletStore {
    wallets: Arc<RwLock<HashMap<Uuid, Wallet>>>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn store(&self, wallet: Wallet) -> Result<()> {
        let mut wallets = self.wallets.write().await;
        wallets.insert(wallet.id, wallet);
        Ok(())
    }

    async fn for_user(&self, user_id: Uuid) -> Result<Vec<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets
            .values()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }
}
