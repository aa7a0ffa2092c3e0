use crate::domain::payment::{PaymentErrorCode, PaymentStatus, SubscriptionPayment};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use uuid::Uuid;

const HEADERS: [&str; 7] = [
    "payment",
    "subscription",
    "status",
    "amount",
    "transaction_hash",
    "failure_code",
    "failure_reason",
];

#[derive(Serialize)]
struct PaymentRow<'a> {
    payment: Uuid,
    subscription: Uuid,
    status: PaymentStatus,
    amount: Decimal,
    transaction_hash: Option<&'a str>,
    failure_code: Option<PaymentErrorCode>,
    failure_reason: Option<&'a str>,
}

impl<'a> From<&'a SubscriptionPayment> for PaymentRow<'a> {
    fn from(payment: &'a SubscriptionPayment) -> Self {
        Self {
            payment: payment.id,
            subscription: payment.subscription_id,
            status: payment.status,
            amount: payment.amount.value(),
            transaction_hash: payment.transaction_hash.as_deref(),
            failure_code: payment.failure_code,
            failure_reason: payment.failure_reason.as_deref(),
        }
    }
}

/// Writes payment records as CSV, one row per billing attempt.
///
/// The header row is always written, even when there are no payments.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        Self { writer }
    }

    pub fn write_payments<'a, I>(&mut self, payments: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a SubscriptionPayment>,
    {
        self.writer.write_record(HEADERS)?;
        for payment in payments {
            self.writer.serialize(PaymentRow::from(payment))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
