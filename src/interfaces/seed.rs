use crate::domain::ports::BillingPorts;
use crate::domain::subscription::Subscription;
use crate::domain::wallet::Wallet;
use crate::error::Result;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Records to load into the stores before a one-shot billing pass.
///
/// ```json
/// { "subscriptions": [ ... ], "wallets": [ ... ] }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
}

impl SeedData {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub async fn load_into(self, ports: &BillingPorts) -> Result<()> {
        let (subscriptions, wallets) = (self.subscriptions.len(), self.wallets.len());
        for subscription in self.subscriptions {
            ports.subscriptions.store(subscription).await?;
        }
        for wallet in self.wallets {
            ports.wallets.store(wallet).await?;
        }
        tracing::info!(subscriptions, wallets, "Loaded seed data");
        Ok(())
    }
}
