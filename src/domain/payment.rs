use super::money::Amount;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

/// Why a billing attempt failed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentErrorCode {
    BadWallet,
    InsufficientBalance,
    TransferFailed,
    /// A collaborator (store, indexer, transfer service) returned an error.
    ExternalError,
    /// The attempt died without producing an error value.
    Unknown,
}

impl PaymentErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadWallet => "BAD_WALLET",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::TransferFailed => "TRANSFER_FAILED",
            Self::ExternalError => "EXTERNAL_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified billing failure, recorded on the payment that it ended.
#[derive(ThisError, Debug, Clone, PartialEq)]
#[error("{message} (code: {code})")]
pub struct PaymentFailure {
    pub code: PaymentErrorCode,
    pub message: String,
}

impl PaymentFailure {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_wallet() -> Self {
        Self::new(
            PaymentErrorCode::BadWallet,
            "User does not have an active wallet",
        )
    }

    pub fn insufficient_balance() -> Self {
        Self::new(PaymentErrorCode::InsufficientBalance, "Insufficient balance")
    }

    pub fn transfer_failed() -> Self {
        Self::new(PaymentErrorCode::TransferFailed, "Failed to transfer funds")
    }

    pub fn unknown() -> Self {
        Self::new(PaymentErrorCode::Unknown, "Unknown error occurred")
    }
}

impl From<Error> for PaymentFailure {
    fn from(err: Error) -> Self {
        Self::new(PaymentErrorCode::ExternalError, err.to_string())
    }
}

/// One billing attempt for a subscription.
///
/// Created `Pending` before any external call is made, then finalized exactly
/// once as `Success` or `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPayment {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub amount: Amount,
    pub payment_date: DateTime<Utc>,
    pub status: PaymentStatus,
    pub transaction_hash: Option<String>,
    pub failure_reason: Option<String>,
    pub failure_code: Option<PaymentErrorCode>,
}

impl SubscriptionPayment {
    pub fn pending(subscription_id: Uuid, amount: Amount, payment_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            amount,
            payment_date,
            status: PaymentStatus::Pending,
            transaction_hash: None,
            failure_reason: None,
            failure_code: None,
        }
    }

    pub fn succeed(&mut self, transaction_hash: String) -> Result<()> {
        self.ensure_pending()?;
        self.status = PaymentStatus::Success;
        self.transaction_hash = Some(transaction_hash);
        Ok(())
    }

    pub fn fail(&mut self, failure: &PaymentFailure) -> Result<()> {
        self.ensure_pending()?;
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(failure.message.clone());
        self.failure_code = Some(failure.code);
        Ok(())
    }

    fn ensure_pending(&self) -> Result<()> {
        if self.status == PaymentStatus::Pending {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "payment {} is already {:?}",
                self.id, self.status
            )))
        }
    }
}
