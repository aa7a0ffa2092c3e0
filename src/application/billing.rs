use crate::domain::money::Amount;
use crate::domain::payment::{PaymentFailure, SubscriptionPayment};
use crate::domain::portfolio::{SOL_MINT, SOL_SYMBOL, can_afford_subscription};
use crate::domain::ports::BillingPorts;
use crate::domain::subscription::Subscription;
use crate::domain::transfer::TransferRequest;
use crate::domain::wallet::active_wallet;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Values every billing cycle needs besides the ports.
#[derive(Debug, Clone)]
pub struct BillingSettings {
    /// Destination of all subscription payments.
    pub receive_wallet: String,
    /// Price of one cycle, in SOL.
    pub price: Amount,
}

/// How one billing attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub subscription_id: Uuid,
    pub payment_id: Uuid,
    /// Transaction signature on success, classified failure otherwise.
    pub result: std::result::Result<String, PaymentFailure>,
}

impl PaymentOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingReport {
    pub payments: Vec<PaymentOutcome>,
    pub cancelled: Vec<Uuid>,
}

impl BillingReport {
    pub fn succeeded(&self) -> usize {
        self.payments.iter().filter(|p| p.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.payments.len() - self.succeeded()
    }
}

/// The recurring billing pass.
///
/// Charges every due subscription, then cancels every expired one. Each
/// subscription is handled on its own task; a failure in one never stops the
/// others and never surfaces as an error of the pass itself.
#[derive(Clone)]
pub struct BillingJob {
    ports: BillingPorts,
    settings: Arc<BillingSettings>,
}

impl BillingJob {
    pub fn new(ports: BillingPorts, settings: BillingSettings) -> Self {
        Self {
            ports,
            settings: Arc::new(settings),
        }
    }

    /// Runs payments to completion, then cancellations.
    ///
    /// Only the two batch queries can fail the pass; per-subscription problems
    /// are recorded on the payment and logged.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<BillingReport> {
        let payments = self.process_due_payments(now).await?;
        let cancelled = self.cancel_expired(now).await?;

        let report = BillingReport {
            payments,
            cancelled,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            cancelled = report.cancelled.len(),
            "Billing pass finished"
        );
        Ok(report)
    }

    pub async fn process_due_payments(&self, now: DateTime<Utc>) -> Result<Vec<PaymentOutcome>> {
        let due = self.ports.subscriptions.due_for_payment(now).await?;
        info!(count = due.len(), "Fetched subscriptions to process");

        let mut tasks = JoinSet::new();
        for subscription in due {
            let job = self.clone();
            tasks.spawn(async move {
                let subscription_id = subscription.id;
                (subscription_id, job.bill(subscription, now).await)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => outcomes.push(outcome),
                Ok((subscription_id, Err(err))) => {
                    error!(%subscription_id, error = %err, "Could not record billing outcome");
                }
                Err(err) => error!(error = %err, "Billing task aborted"),
            }
        }
        Ok(outcomes)
    }

    pub async fn cancel_expired(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let expired = self.ports.subscriptions.expired(now).await?;
        info!(count = expired.len(), "Fetched subscriptions to cancel");

        let mut tasks = JoinSet::new();
        for subscription in expired {
            let subscriptions = self.ports.subscriptions.clone();
            tasks.spawn(async move {
                info!(subscription_id = %subscription.id, "Cancelling subscription");
                let result = subscriptions.deactivate(subscription.id).await;
                (subscription.id, result)
            });
        }

        let mut cancelled = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Ok(()))) => cancelled.push(id),
                Ok((subscription_id, Err(err))) => {
                    error!(%subscription_id, error = %err, "Failed to cancel subscription");
                }
                Err(err) => error!(error = %err, "Cancellation task aborted"),
            }
        }
        Ok(cancelled)
    }

    /// One billing cycle for one subscription.
    ///
    /// The pending payment is written before anything else so that every
    /// attempt leaves a record. The charge itself runs on a nested task: a
    /// panic there still ends the payment as `UNKNOWN`.
    async fn bill(&self, subscription: Subscription, now: DateTime<Utc>) -> Result<PaymentOutcome> {
        info!(subscription_id = %subscription.id, "Processing subscription");

        let payment = SubscriptionPayment::pending(subscription.id, self.settings.price, now);
        let payment_id = payment.id;
        self.ports.payments.create(payment).await?;

        let attempt = {
            let job = self.clone();
            let subscription = subscription.clone();
            tokio::spawn(async move { job.charge(&subscription).await })
        };
        let charged = match attempt.await {
            Ok(result) => result,
            Err(err) => {
                error!(subscription_id = %subscription.id, error = %err, "Unknown error occurred");
                Err(PaymentFailure::unknown())
            }
        };

        let result = match charged {
            Ok(signature) => self
                .settle(&subscription, payment_id, &signature)
                .await
                .map(|()| signature),
            Err(failure) => Err(failure),
        };

        if let Err(failure) = &result {
            self.fail(&subscription, payment_id, failure).await?;
        }

        Ok(PaymentOutcome {
            subscription_id: subscription.id,
            payment_id,
            result,
        })
    }

    /// Wallet lookup, balance check and transfer. Returns the signature.
    async fn charge(&self, subscription: &Subscription) -> std::result::Result<String, PaymentFailure> {
        let wallets = self.ports.wallets.for_user(subscription.user_id).await?;
        let wallet = active_wallet(&wallets).ok_or_else(PaymentFailure::bad_wallet)?;

        let portfolio = self
            .ports
            .indexer
            .search_wallet_assets(&wallet.public_key)
            .await?;
        if !can_afford_subscription(&portfolio, self.settings.price) {
            return Err(PaymentFailure::insufficient_balance());
        }

        let response = self
            .ports
            .transfers
            .transfer(TransferRequest {
                user_id: subscription.user_id,
                wallet_id: wallet.id,
                receiver_address: self.settings.receive_wallet.clone(),
                token_address: SOL_MINT.to_string(),
                amount: self.settings.price.value(),
                token_symbol: SOL_SYMBOL.to_string(),
            })
            .await?;

        match response.signature() {
            Some(signature) => Ok(signature.to_string()),
            None => {
                error!(
                    subscription_id = %subscription.id,
                    success = response.success,
                    error = response.error.as_deref().unwrap_or("no transfer data"),
                    "Error in transfer"
                );
                Err(PaymentFailure::transfer_failed())
            }
        }
    }

    /// Records a confirmed transfer and moves the billing date forward.
    ///
    /// Only a failure to mark the payment itself is returned; the payment is
    /// then still pending and gets failed by the caller. If the payment is
    /// recorded but the date cannot be moved, the subscription is switched off
    /// instead so the next pass cannot charge the same cycle twice.
    async fn settle(
        &self,
        subscription: &Subscription,
        payment_id: Uuid,
        signature: &str,
    ) -> std::result::Result<(), PaymentFailure> {
        self.ports
            .payments
            .mark_succeeded(payment_id, signature.to_string())
            .await?;

        let next_payment_date = subscription.following_payment_date();
        if let Err(err) = self
            .ports
            .subscriptions
            .set_next_payment_date(subscription.id, next_payment_date)
            .await
        {
            warn!(
                subscription_id = %subscription.id,
                error = %err,
                "Payment recorded but next payment date not advanced, deactivating"
            );
            if let Err(err) = self.ports.subscriptions.deactivate(subscription.id).await {
                error!(subscription_id = %subscription.id, error = %err, "Failed to deactivate subscription");
            }
            return Ok(());
        }

        info!(
            subscription_id = %subscription.id,
            %next_payment_date,
            "Subscription payment succeeded"
        );
        Ok(())
    }

    /// Switches the subscription off and marks the payment FAILED.
    ///
    /// Only a failure to write the payment is returned. A subscription that
    /// could not be deactivated is logged; the payment is still finalized.
    async fn fail(&self, subscription: &Subscription, payment_id: Uuid, failure: &PaymentFailure) -> Result<()> {
        error!(
            subscription_id = %subscription.id,
            code = %failure.code,
            "Payment error occurred: {}",
            failure.message
        );
        info!(subscription_id = %subscription.id, "Marking subscription payment as failed");

        if let Err(err) = self.ports.subscriptions.deactivate(subscription.id).await {
            error!(subscription_id = %subscription.id, error = %err, "Failed to deactivate subscription");
        }
        self.ports.payments.mark_failed(payment_id, failure).await
    }
}
