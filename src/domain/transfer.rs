use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Instruction for the server-side wallet to send tokens on a user's behalf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub receiver_address: String,
    pub token_address: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub token_symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferData {
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<TransferData>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TransferResponse {
    pub fn confirmed(signature: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(TransferData {
                signature: signature.into(),
            }),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// The transaction signature, only when the transfer both succeeded and
    /// reported one.
    pub fn signature(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.data
            .as_ref()
            .map(|data| data.signature.as_str())
            .filter(|signature| !signature.is_empty())
    }
}
