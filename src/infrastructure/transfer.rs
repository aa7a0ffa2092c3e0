use crate::domain::ports::TransferExecutor;
use crate::domain::transfer::{TransferRequest, TransferResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;

/// Sends transfer instructions to the server-wallet signing service.
///
/// The service answers `{ success, data: { signature }, error }`. A rejected
/// transfer is a normal response with `success: false`; only transport
/// failures and unparseable bodies become errors.
#[derive(Clone)]
pub struct HttpTransferExecutor {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpTransferExecutor {
    pub fn new(client: reqwest::Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
        }
    }
}

fn interpret(status: reqwest::StatusCode, body: &str) -> Result<TransferResponse> {
    match serde_json::from_str::<TransferResponse>(body) {
        Ok(response) => Ok(response),
        Err(_) if !status.is_success() => Err(Error::UpstreamError(format!(
            "transfer service returned {status}"
        ))),
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl TransferExecutor for HttpTransferExecutor {
    async fn transfer(&self, request: TransferRequest) -> Result<TransferResponse> {
        let mut call = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await?;
        let status = response.status();
        let body = response.text().await?;
        interpret(status, &body)
    }
}
