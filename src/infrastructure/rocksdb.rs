use crate::domain::payment::{PaymentFailure, SubscriptionPayment};
use crate::domain::ports::{PaymentStore, SubscriptionStore, WalletStore};
use crate::domain::subscription::Subscription;
use crate::domain::wallet::Wallet;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for subscription records.
pub const CF_SUBSCRIPTIONS: &str = "subscriptions";
/// Column Family for payment attempts.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for user wallets.
pub const CF_WALLETS: &str = "wallets";

/// A persistent store implementation using RocksDB.
///
/// Subscriptions, payments and wallets live in separate Column Families, keyed
/// by the record's UUID bytes and encoded as JSON.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_SUBSCRIPTIONS, CF_PAYMENTS, CF_WALLETS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            Error::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn put<T: Serialize>(&self, cf_name: &str, id: Uuid, value: &T) -> Result<()> {
        let cf = self.handle(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, id.as_bytes(), bytes)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf_name: &str, id: Uuid) -> Result<Option<T>> {
        let cf = self.handle(cf_name)?;
        match self.db.get_pinned_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.handle(cf_name)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }

    fn modify_subscription<F>(&self, id: Uuid, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Subscription),
    {
        let mut subscription: Subscription = self
            .fetch(CF_SUBSCRIPTIONS, id)?
            .ok_or_else(|| Error::NotFound(format!("subscription {id}")))?;
        apply(&mut subscription);
        self.put(CF_SUBSCRIPTIONS, id, &subscription)
    }

    fn modify_payment<F>(&self, id: Uuid, apply: F) -> Result<()>
    where
        F: FnOnce(&mut SubscriptionPayment) -> Result<()>,
    {
        let mut payment: SubscriptionPayment = self
            .fetch(CF_PAYMENTS, id)?
            .ok_or_else(|| Error::NotFound(format!("payment {id}")))?;
        apply(&mut payment)?;
        self.put(CF_PAYMENTS, id, &payment)
    }
}

#[async_trait]
impl SubscriptionStore for RocksDBStore {
    async fn store(&self, subscription: Subscription) -> Result<()> {
        self.put(CF_SUBSCRIPTIONS, subscription.id, &subscription)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Subscription>> {
        self.fetch(CF_SUBSCRIPTIONS, id)
    }

    async fn due_for_payment(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>> {
        let all: Vec<Subscription> = self.scan(CF_SUBSCRIPTIONS)?;
        Ok(all.into_iter().filter(|s| s.is_due(now)).collect())
    }

    async fn expired(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>> {
        let all: Vec<Subscription> = self.scan(CF_SUBSCRIPTIONS)?;
        Ok(all.into_iter().filter(|s| s.is_expired(now)).collect())
    }

    async fn deactivate(&self, id: Uuid) -> Result<()> {
        self.modify_subscription(id, |s| s.active = false)
    }

    async fn set_next_payment_date(&self, id: Uuid, date: DateTime<Utc>) -> Result<()> {
        self.modify_subscription(id, |s| s.next_payment_date = date)
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn create(&self, payment: SubscriptionPayment) -> Result<()> {
        let cf = self.handle(CF_PAYMENTS)?;
        if self.db.get_pinned_cf(cf, payment.id.as_bytes())?.is_some() {
            return Err(Error::InvalidState(format!(
                "payment {} already exists",
                payment.id
            )));
        }
        self.put(CF_PAYMENTS, payment.id, &payment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubscriptionPayment>> {
        self.fetch(CF_PAYMENTS, id)
    }

    async fn for_subscription(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionPayment>> {
        let all: Vec<SubscriptionPayment> = self.scan(CF_PAYMENTS)?;
        let mut matching: Vec<_> = all
            .into_iter()
            .filter(|p| p.subscription_id == subscription_id)
            .collect();
        matching.sort_by_key(|p| p.payment_date);
        Ok(matching)
    }

    async fn mark_succeeded(&self, id: Uuid, transaction_hash: String) -> Result<()> {
        self.modify_payment(id, |p| p.succeed(transaction_hash))
    }

    async fn mark_failed(&self, id: Uuid, failure: &PaymentFailure) -> Result<()> {
        self.modify_payment(id, |p| p.fail(failure))
    }
}

#[async_trait]
impl WalletStore for RocksDBStore {
    async fn store(&self, wallet: Wallet) -> Result<()> {
        self.put(CF_WALLETS, wallet.id, &wallet)
    }

    async fn for_user(&self, user_id: Uuid) -> Result<Vec<Wallet>> {
        let all: Vec<Wallet> = self.scan(CF_WALLETS)?;
        Ok(all.into_iter().filter(|w| w.user_id == user_id).collect())
    }
}
