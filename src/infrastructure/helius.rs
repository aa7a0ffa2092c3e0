use crate::domain::money::Balance;
use crate::domain::portfolio::{Portfolio, SOL_DECIMALS, SOL_MINT, SOL_SYMBOL};
use crate::domain::ports::AssetIndexer;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Asset lookup against a Helius DAS endpoint (`searchAssets`).
#[derive(Clone)]
pub struct HeliusIndexer {
    client: reqwest::Client,
    rpc_url: String,
    api_key: Option<String>,
}

impl HeliusIndexer {
    pub fn new(client: reqwest::Client, rpc_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            rpc_url: rpc_url.into(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<SearchAssetsResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchAssetsResult {
    #[serde(default)]
    items: Vec<Asset>,
    native_balance: Option<NativeBalance>,
}

#[derive(Debug, Deserialize)]
struct NativeBalance {
    lamports: u64,
}

#[derive(Debug, Deserialize)]
struct Asset {
    id: String,
    token_info: Option<TokenInfo>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    symbol: Option<String>,
    #[serde(default)]
    balance: u64,
    #[serde(default)]
    decimals: u32,
}

fn portfolio_from_response(owner: &str, response: RpcResponse) -> Result<Portfolio> {
    if let Some(err) = response.error {
        return Err(Error::UpstreamError(format!(
            "searchAssets failed ({}): {}",
            err.code, err.message
        )));
    }
    let result = response
        .result
        .ok_or_else(|| Error::UpstreamError("searchAssets returned no result".to_string()))?;

    let mut portfolio = Portfolio::new(owner);
    if let Some(native) = result.native_balance
        && let Some(balance) = Balance::from_raw(native.lamports, SOL_DECIMALS)
    {
        portfolio.credit(SOL_MINT, Some(SOL_SYMBOL), balance);
    }
    for asset in result.items {
        let Some(info) = asset.token_info else {
            continue;
        };
        // Wrapped SOL sits in a token account the native transfer cannot spend.
        if asset.id == SOL_MINT {
            continue;
        }
        if let Some(balance) = Balance::from_raw(info.balance, info.decimals) {
            portfolio.credit(&asset.id, info.symbol.as_deref(), balance);
        }
    }
    Ok(portfolio)
}

#[async_trait]
impl AssetIndexer for HeliusIndexer {
    async fn search_wallet_assets(&self, owner: &str) -> Result<Portfolio> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": "subscription-cron",
            "method": "searchAssets",
            "params": {
                "ownerAddress": owner,
                "tokenType": "fungible",
                "displayOptions": { "showNativeBalance": true },
            },
        });

        let mut request = self.client.post(&self.rpc_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api-key", key)]);
        }

        let response: RpcResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let portfolio = portfolio_from_response(owner, response)?;
        tracing::debug!(
            owner,
            holdings = portfolio.holdings.len(),
            "Fetched wallet assets"
        );
        Ok(portfolio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse(json: &str) -> RpcResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_native_and_token_balances() {
        let response = parse(
            r#"{
                "jsonrpc": "2.0",
                "id": "subscription-cron",
                "result": {
                    "total": 2,
                    "items": [
                        {
                            "id": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                            "token_info": { "symbol": "USDC", "balance": 12500000, "decimals": 6 }
                        },
                        {
                            "id": "So11111111111111111111111111111111111111112",
                            "token_info": { "symbol": "SOL", "balance": 250000000, "decimals": 9 }
                        },
                        { "id": "NftWithoutTokenInfo" }
                    ],
                    "nativeBalance": { "lamports": 1000000000, "price_per_sol": 150.0 }
                }
            }"#,
        );

        let portfolio = portfolio_from_response("Owner", response).unwrap();
        assert_eq!(portfolio.owner, "Owner");
        assert_eq!(portfolio.sol_balance(), Balance::new(dec!(1)));
        assert_eq!(
            portfolio.balance_of("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
            Balance::new(dec!(12.5))
        );
        assert_eq!(portfolio.holdings.len(), 2);
    }

    #[test]
    fn test_wrapped_sol_alone_cannot_pay() {
        let response = parse(
            r#"{
                "result": {
                    "items": [
                        {
                            "id": "So11111111111111111111111111111111111111112",
                            "token_info": { "symbol": "SOL", "balance": 5000000000, "decimals": 9 }
                        }
                    ]
                }
            }"#,
        );
        let portfolio = portfolio_from_response("Owner", response).unwrap();
        assert_eq!(portfolio.sol_balance(), Balance::ZERO);
        assert!(portfolio.holdings.is_empty());
    }

    #[test]
    fn test_missing_native_balance_is_zero() {
        let response = parse(r#"{ "result": { "items": [] } }"#);
        let portfolio = portfolio_from_response("Owner", response).unwrap();
        assert_eq!(portfolio.sol_balance(), Balance::ZERO);
    }

    #[test]
    fn test_rpc_error_is_upstream_error() {
        let response = parse(r#"{ "error": { "code": -32602, "message": "invalid owner" } }"#);
        let err = portfolio_from_response("Owner", response).unwrap_err();
        assert!(matches!(err, Error::UpstreamError(msg) if msg.contains("invalid owner")));
    }
}
