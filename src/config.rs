use crate::domain::money::Amount;
use crate::error::{Error, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

pub const DEFAULT_HELIUS_RPC_URL: &str = "https://mainnet.helius-rpc.com";
pub const DEFAULT_TRANSFER_URL: &str = "http://localhost:3000/api/wallet/transfer";
pub const DEFAULT_SUBSCRIPTION_PRICE_SOL: &str = "0.5";

/// Runtime settings, read from the environment.
///
/// The cron secret and the receive wallet stay optional here: the cron route
/// reports them as missing per request instead of refusing to start.
#[derive(Clone, Debug)]
pub struct Config {
    pub cron_secret: Option<String>,
    pub receive_wallet: Option<String>,
    pub helius_rpc_url: String,
    pub helius_api_key: Option<String>,
    pub transfer_url: String,
    pub transfer_api_key: Option<String>,
    pub subscription_price: Amount,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let price_raw = get("SUBSCRIPTION_PRICE_SOL")
            .unwrap_or_else(|| DEFAULT_SUBSCRIPTION_PRICE_SOL.to_string());
        let price = Decimal::from_str(price_raw.trim()).map_err(|e| {
            Error::ConfigError(format!("SUBSCRIPTION_PRICE_SOL is not a number: {e}"))
        })?;
        let subscription_price = Amount::new(price)
            .map_err(|_| Error::ConfigError("SUBSCRIPTION_PRICE_SOL must be positive".to_string()))?;

        Ok(Self {
            cron_secret: get("CRON_SECRET"),
            receive_wallet: get("EAP_RECEIVE_WALLET_ADDRESS")
                .or_else(|| get("NEXT_PUBLIC_EAP_RECEIVE_WALLET_ADDRESS")),
            helius_rpc_url: get("HELIUS_RPC_URL")
                .unwrap_or_else(|| DEFAULT_HELIUS_RPC_URL.to_string()),
            helius_api_key: get("HELIUS_API_KEY"),
            transfer_url: get("TRANSFER_URL").unwrap_or_else(|| DEFAULT_TRANSFER_URL.to_string()),
            transfer_api_key: get("TRANSFER_API_KEY"),
            subscription_price,
        })
    }
}
