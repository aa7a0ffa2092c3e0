use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's custodial wallet. Only active wallets can be charged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub active: bool,
    pub public_key: String,
}

impl Wallet {
    pub fn new(user_id: Uuid, public_key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            active: true,
            public_key: public_key.into(),
        }
    }
}

/// First active wallet in `wallets`. Users are expected to have one.
pub fn active_wallet(wallets: &[Wallet]) -> Option<&Wallet> {
    wallets.iter().find(|wallet| wallet.active)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_wallet_skips_inactive() {
        let user = Uuid::new_v4();
        let mut old = Wallet::new(user, "OldKey111");
        old.active = false;
        let current = Wallet::new(user, "NewKey222");

        let wallets = vec![old, current.clone()];
        assert_eq!(active_wallet(&wallets), Some(&current));
    }

    #[test]
    fn test_active_wallet_none() {
        let mut only = Wallet::new(Uuid::new_v4(), "Key333");
        only.active = false;
        assert!(active_wallet(&[only]).is_none());
        assert!(active_wallet(&[]).is_none());
    }
}
