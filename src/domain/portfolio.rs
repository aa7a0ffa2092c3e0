use super::money::{Amount, Balance};
use serde::{Deserialize, Serialize};

/// Wrapped-SOL mint, used as the identifier for native SOL holdings.
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const SOL_SYMBOL: &str = "SOL";
pub const SOL_DECIMALS: u32 = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub mint: String,
    pub symbol: Option<String>,
    pub balance: Balance,
}

/// Aggregated fungible holdings of one wallet, as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub owner: String,
    pub holdings: Vec<TokenHolding>,
}

impl Portfolio {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            holdings: Vec::new(),
        }
    }

    /// Adds `balance` to the holding for `mint`, creating it if needed.
    pub fn credit(&mut self, mint: &str, symbol: Option<&str>, balance: Balance) {
        match self.holdings.iter_mut().find(|h| h.mint == mint) {
            Some(holding) => {
                holding.balance += balance;
                if holding.symbol.is_none() {
                    holding.symbol = symbol.map(str::to_string);
                }
            }
            None => self.holdings.push(TokenHolding {
                mint: mint.to_string(),
                symbol: symbol.map(str::to_string),
                balance,
            }),
        }
    }

    pub fn balance_of(&self, mint: &str) -> Balance {
        self.holdings
            .iter()
            .find(|h| h.mint == mint)
            .map(|h| h.balance)
            .unwrap_or(Balance::ZERO)
    }

    pub fn sol_balance(&self) -> Balance {
        self.balance_of(SOL_MINT)
    }
}

/// Subscriptions are paid in SOL; only the SOL holding counts.
pub fn can_afford_subscription(portfolio: &Portfolio, price: Amount) -> bool {
    portfolio.sol_balance().covers(price)
}
