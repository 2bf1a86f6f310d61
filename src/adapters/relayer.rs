use crate::domain::model::{Address, TransactionId};
use crate::domain::ports::IssuanceClient;
use crate::utils::error::{FaucetError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    token: &'a str,
    recipient: &'a str,
    /// 最小單位的金額，用字串避免 JSON 數字精度問題
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferResponse {
    transaction_hash: String,
}

/// Issues transfers through an HTTP relayer that holds the faucet key and
/// signs the token `transfer` call.
#[derive(Debug, Clone)]
pub struct RelayerIssuanceClient {
    client: Client,
    transfer_url: Url,
    token_contract: String,
    decimals: u32,
    api_key: Option<String>,
}

impl RelayerIssuanceClient {
    pub fn new(
        endpoint: &str,
        token_contract: impl Into<String>,
        decimals: u32,
        api_key: Option<String>,
    ) -> Result<Self> {
        let base = Url::parse(endpoint).map_err(|e| FaucetError::InvalidConfigValueError {
            field: "issuance.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        let transfer_url = join_path(&base, "transfer")?;

        Ok(Self {
            client: Client::new(),
            transfer_url,
            token_contract: token_contract.into(),
            decimals,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn transfer_url(&self) -> &Url {
        &self.transfer_url
    }
}

fn join_path(base: &Url, segment: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(segment)
        .map_err(|e| FaucetError::ConfigError {
            message: format!("Cannot build relayer URL: {}", e),
        })
}

/// `units * 10^decimals`, 等同 ethers 的 parseUnits
pub fn to_base_units(units: u64, decimals: u32) -> Option<u128> {
    10u128
        .checked_pow(decimals)
        .and_then(|scale| scale.checked_mul(units as u128))
}

#[async_trait]
impl IssuanceClient for RelayerIssuanceClient {
    async fn issue(&self, address: &Address, amount: u64) -> Result<TransactionId> {
        let base_units =
            to_base_units(amount, self.decimals).ok_or_else(|| FaucetError::IssuanceError {
                address: address.to_string(),
                message: format!(
                    "amount {} overflows with {} decimals",
                    amount, self.decimals
                ),
            })?;

        let body = TransferRequest {
            token: &self.token_contract,
            recipient: address.as_str(),
            amount: base_units.to_string(),
        };

        tracing::debug!("Posting transfer to relayer: {}", self.transfer_url);
        let mut request = self.client.post(self.transfer_url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Relayer response status: {}", status);

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FaucetError::IssuanceError {
                address: address.to_string(),
                message: format!("relayer returned {}: {}", status, detail.trim()),
            });
        }

        let payload: TransferResponse = serde_json::from_slice(&response.bytes().await?)?;
        Ok(TransactionId(payload.transaction_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units(1, 18), Some(1_000_000_000_000_000_000));
        assert_eq!(to_base_units(3, 0), Some(3));
        assert_eq!(to_base_units(1, 40), None);
    }

    #[test]
    fn test_transfer_url_keeps_base_path() {
        let client = RelayerIssuanceClient::new(
            "https://relayer.example.com/v1",
            "0x0000000000000000000000000000000000000001",
            18,
            None,
        )
        .unwrap();
        assert_eq!(
            client.transfer_url().as_str(),
            "https://relayer.example.com/v1/transfer"
        );
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let result = RelayerIssuanceClient::new("not a url", "0x0", 18, None);
        assert!(result.is_err());
    }
}
