use crate::domain::model::{Address, TransactionId};
use crate::domain::ports::IssuanceClient;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// 不送任何交易，只記錄並回傳假的交易雜湊
#[derive(Debug, Default)]
pub struct DryRunIssuanceClient {
    issued: AtomicU64,
}

impl DryRunIssuanceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl IssuanceClient for DryRunIssuanceClient {
    async fn issue(&self, address: &Address, amount: u64) -> Result<TransactionId> {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!("🧪 [dry-run] transfer {} tokens to {}", amount, address);
        Ok(TransactionId(format!("0x{:064x}", n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_returns_distinct_ids() {
        let client = DryRunIssuanceClient::new();
        let address = Address::parse("0x00000000000000000000000000000000000000aa").unwrap();

        let first = client.issue(&address, 1).await.unwrap();
        let second = client.issue(&address, 2).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first.0.len(), 66);
        assert_eq!(client.issued(), 2);
    }
}
