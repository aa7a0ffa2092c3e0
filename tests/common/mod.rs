#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use subscription_cron::application::billing::{BillingJob, BillingSettings};
use subscription_cron::domain::money::{Amount, Balance};
use subscription_cron::domain::payment::{PaymentFailure, SubscriptionPayment};
use subscription_cron::domain::portfolio::{Portfolio, SOL_MINT, SOL_SYMBOL};
use subscription_cron::domain::ports::{
    AssetIndexer, BillingPorts, PaymentStore, SubscriptionStore, TransferExecutor, WalletStore,
};
use subscription_cron::domain::subscription::Subscription;
use subscription_cron::domain::transfer::{TransferRequest, TransferResponse};
use subscription_cron::domain::wallet::Wallet;
use subscription_cron::error::{Error, Result};
use subscription_cron::infrastructure::in_memory::{
    InMemoryPaymentStore, InMemorySubscriptionStore, InMemoryWalletStore,
};
use uuid::Uuid;

pub const RECEIVER: &str = "EapReceive1111111111111111111111111111111111";

pub fn price() -> Amount {
    Amount::new(dec!(0.5)).unwrap()
}

#[derive(Clone)]
pub enum IndexerBehavior {
    Sol(Decimal),
    Fail(String),
    Panic,
    Slow(Decimal, Duration),
}

/// Asset indexer answering from a per-wallet script. Unknown wallets are empty.
#[derive(Default)]
pub struct FakeIndexer {
    wallets: Mutex<HashMap<String, IndexerBehavior>>,
}

impl FakeIndexer {
    pub fn set(&self, public_key: &str, behavior: IndexerBehavior) {
        self.wallets
            .lock()
            .unwrap()
            .insert(public_key.to_string(), behavior);
    }
}

fn sol_portfolio(owner: &str, sol: Decimal) -> Portfolio {
    let mut portfolio = Portfolio::new(owner);
    portfolio.credit(SOL_MINT, Some(SOL_SYMBOL), Balance::new(sol));
    portfolio
}

#[async_trait]
impl AssetIndexer for FakeIndexer {
    async fn search_wallet_assets(&self, owner: &str) -> Result<Portfolio> {
        let behavior = self.wallets.lock().unwrap().get(owner).cloned();
        match behavior {
            None => Ok(Portfolio::new(owner)),
            Some(IndexerBehavior::Sol(sol)) => Ok(sol_portfolio(owner, sol)),
            Some(IndexerBehavior::Fail(message)) => Err(Error::UpstreamError(message)),
            Some(IndexerBehavior::Panic) => panic!("indexer blew up for {owner}"),
            Some(IndexerBehavior::Slow(sol, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(sol_portfolio(owner, sol))
            }
        }
    }
}

#[derive(Clone)]
pub enum TransferBehavior {
    Reject(String),
    SuccessWithoutData,
    Fail(String),
}

/// Transfer executor that confirms by default with signature `sig-<wallet id>`
/// and records every request.
#[derive(Default)]
pub struct FakeTransfers {
    overrides: Mutex<HashMap<Uuid, TransferBehavior>>,
    requests: Mutex<Vec<TransferRequest>>,
}

impl FakeTransfers {
    pub fn set(&self, wallet_id: Uuid, behavior: TransferBehavior) {
        self.overrides.lock().unwrap().insert(wallet_id, behavior);
    }

    pub fn requests(&self) -> Vec<TransferRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferExecutor for FakeTransfers {
    async fn transfer(&self, request: TransferRequest) -> Result<TransferResponse> {
        let wallet_id = request.wallet_id;
        self.requests.lock().unwrap().push(request);
        let behavior = self.overrides.lock().unwrap().get(&wallet_id).cloned();
        match behavior {
            None => Ok(TransferResponse::confirmed(format!("sig-{wallet_id}"))),
            Some(TransferBehavior::Reject(reason)) => Ok(TransferResponse::rejected(reason)),
            Some(TransferBehavior::SuccessWithoutData) => Ok(TransferResponse {
                success: true,
                data: None,
                error: None,
            }),
            Some(TransferBehavior::Fail(message)) => Err(Error::UpstreamError(message)),
        }
    }
}

/// Subscription store wrapper that counts every call made through it.
pub struct CountingSubscriptionStore {
    inner: InMemorySubscriptionStore,
    calls: AtomicUsize,
}

impl CountingSubscriptionStore {
    pub fn new(inner: InMemorySubscriptionStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriptionStore for CountingSubscriptionStore {
    async fn store(&self, subscription: Subscription) -> Result<()> {
        self.touch();
        self.inner.store(subscription).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Subscription>> {
        self.touch();
        self.inner.get(id).await
    }

    async fn due_for_payment(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>> {
        self.touch();
        self.inner.due_for_payment(now).await
    }

    async fn expired(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>> {
        self.touch();
        self.inner.expired(now).await
    }

    async fn deactivate(&self, id: Uuid) -> Result<()> {
        self.touch();
        self.inner.deactivate(id).await
    }

    async fn set_next_payment_date(&self, id: Uuid, date: DateTime<Utc>) -> Result<()> {
        self.touch();
        self.inner.set_next_payment_date(id, date).await
    }
}

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    DueForPayment,
    Deactivate,
    SetNextPaymentDate,
    MarkSucceeded,
}

/// Shared switchboard of failing store operations.
#[derive(Default)]
pub struct Faults {
    active: Mutex<HashSet<Fault>>,
}

impl Faults {
    pub fn inject(&self, fault: Fault) {
        self.active.lock().unwrap().insert(fault);
    }

    fn check(&self, fault: Fault) -> Result<()> {
        if self.active.lock().unwrap().contains(&fault) {
            Err(Error::UpstreamError("write lost".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Subscription store wrapper that fails the operations switched on in `faults`.
pub struct FaultySubscriptionStore {
    inner: Arc<CountingSubscriptionStore>,
    faults: Arc<Faults>,
}

#[async_trait]
impl SubscriptionStore for FaultySubscriptionStore {
    async fn store(&self, subscription: Subscription) -> Result<()> {
        self.inner.store(subscription).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Subscription>> {
        self.inner.get(id).await
    }

    async fn due_for_payment(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>> {
        self.faults.check(Fault::DueForPayment)?;
        self.inner.due_for_payment(now).await
    }

    async fn expired(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>> {
        self.inner.expired(now).await
    }

    async fn deactivate(&self, id: Uuid) -> Result<()> {
        self.faults.check(Fault::Deactivate)?;
        self.inner.deactivate(id).await
    }

    async fn set_next_payment_date(&self, id: Uuid, date: DateTime<Utc>) -> Result<()> {
        self.faults.check(Fault::SetNextPaymentDate)?;
        self.inner.set_next_payment_date(id, date).await
    }
}

/// Payment store wrapper that fails the operations switched on in `faults`.
pub struct FaultyPaymentStore {
    inner: InMemoryPaymentStore,
    faults: Arc<Faults>,
}

#[async_trait]
impl PaymentStore for FaultyPaymentStore {
    async fn create(&self, payment: SubscriptionPayment) -> Result<()> {
        self.inner.create(payment).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubscriptionPayment>> {
        self.inner.get(id).await
    }

    async fn for_subscription(&self, subscription_id: Uuid) -> Result<Vec<SubscriptionPayment>> {
        self.inner.for_subscription(subscription_id).await
    }

    async fn mark_succeeded(&self, id: Uuid, transaction_hash: String) -> Result<()> {
        self.faults.check(Fault::MarkSucceeded)?;
        self.inner.mark_succeeded(id, transaction_hash).await
    }

    async fn mark_failed(&self, id: Uuid, failure: &PaymentFailure) -> Result<()> {
        self.inner.mark_failed(id, failure).await
    }
}

/// In-memory stores plus scripted collaborators.
pub struct Harness {
    pub subscriptions: InMemorySubscriptionStore,
    pub counting: Arc<CountingSubscriptionStore>,
    pub faults: Arc<Faults>,
    pub payments: InMemoryPaymentStore,
    pub wallets: InMemoryWalletStore,
    pub indexer: Arc<FakeIndexer>,
    pub transfers: Arc<FakeTransfers>,
}

impl Harness {
    pub fn new() -> Self {
        let subscriptions = InMemorySubscriptionStore::new();
        Self {
            counting: Arc::new(CountingSubscriptionStore::new(subscriptions.clone())),
            subscriptions,
            faults: Arc::new(Faults::default()),
            payments: InMemoryPaymentStore::new(),
            wallets: InMemoryWalletStore::new(),
            indexer: Arc::new(FakeIndexer::default()),
            transfers: Arc::new(FakeTransfers::default()),
        }
    }

    pub fn ports(&self) -> BillingPorts {
        BillingPorts {
            subscriptions: Arc::new(FaultySubscriptionStore {
                inner: self.counting.clone(),
                faults: self.faults.clone(),
            }),
            payments: Arc::new(FaultyPaymentStore {
                inner: self.payments.clone(),
                faults: self.faults.clone(),
            }),
            wallets: Arc::new(self.wallets.clone()),
            indexer: self.indexer.clone(),
            transfers: self.transfers.clone(),
        }
    }

    pub fn job(&self) -> BillingJob {
        BillingJob::new(
            self.ports(),
            BillingSettings {
                receive_wallet: RECEIVER.to_string(),
                price: price(),
            },
        )
    }

    /// Stores a subscription for a fresh user without any wallet.
    pub async fn subscription(&self, next_payment_date: DateTime<Utc>) -> Subscription {
        let subscription = Subscription::new(Uuid::new_v4(), next_payment_date);
        self.subscriptions
            .store(subscription.clone())
            .await
            .unwrap();
        subscription
    }

    /// Stores a subscription whose user has one active wallet holding `sol`.
    pub async fn funded_subscription(
        &self,
        next_payment_date: DateTime<Utc>,
        sol: Decimal,
    ) -> (Subscription, Wallet) {
        let subscription = self.subscription(next_payment_date).await;
        let wallet = Wallet::new(
            subscription.user_id,
            format!("Wallet{}", subscription.user_id.simple()),
        );
        self.wallets.store(wallet.clone()).await.unwrap();
        self.indexer
            .set(&wallet.public_key, IndexerBehavior::Sol(sol));
        (subscription, wallet)
    }

    pub async fn stored(&self, subscription: &Subscription) -> Subscription {
        self.subscriptions
            .get(subscription.id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn payments_for(&self, subscription: &Subscription) -> Vec<SubscriptionPayment> {
        self.payments
            .for_subscription(subscription.id)
            .await
            .unwrap()
    }
}
