use crate::utils::error::Result;
use crate::utils::validation::validate_address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 已驗證的收款地址。統一轉成小寫，同一個收款人不論大小寫都會合併。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self> {
        validate_address(raw)?;
        let hex = raw.strip_prefix("0x").unwrap_or(raw);
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = crate::utils::error::FaucetError;

    fn try_from(value: String) -> Result<Self> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DripRequest {
    pub id: u64,
    pub address: Address,
    pub amount: u64,
    pub requested_at: DateTime<Utc>,
}

/// 一次結算中某個地址的應付總額
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub address: Address,
    pub amount: u64,
    pub request_count: u64,
}

/// Address totals for one drain, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettlementBatch {
    pub entries: Vec<BatchEntry>,
}

impl SettlementBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, address: &Address) -> Option<&BatchEntry> {
        self.entries.iter().find(|entry| &entry.address == address)
    }

    pub fn amount_for(&self, address: &Address) -> u64 {
        self.get(address).map(|entry| entry.amount).unwrap_or(0)
    }

    pub fn total_amount(&self) -> u64 {
        self.entries.iter().map(|entry| entry.amount).sum()
    }
}

impl IntoIterator for SettlementBatch {
    type Item = BatchEntry;
    type IntoIter = std::vec::IntoIter<BatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AddressOutcome {
    Settled { transaction: TransactionId },
    Failed { reason: String },
    /// 前面的地址失敗後被放棄，本輪不重試也不重新排隊
    Abandoned,
    Requeued,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressSettlement {
    pub address: Address,
    pub amount: u64,
    pub outcome: AddressOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub requests_drained: usize,
    pub settlements: Vec<AddressSettlement>,
}

impl CycleReport {
    pub fn new(cycle: u64, requests_drained: usize) -> Self {
        Self {
            cycle,
            requests_drained,
            settlements: Vec::new(),
        }
    }

    pub fn record(&mut self, entry: &BatchEntry, outcome: AddressOutcome) {
        self.settlements.push(AddressSettlement {
            address: entry.address.clone(),
            amount: entry.amount,
            outcome,
        });
    }

    pub fn settled(&self) -> impl Iterator<Item = &AddressSettlement> {
        self.settlements
            .iter()
            .filter(|s| matches!(s.outcome, AddressOutcome::Settled { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &AddressSettlement> {
        self.settlements
            .iter()
            .filter(|s| matches!(s.outcome, AddressOutcome::Failed { .. }))
    }

    pub fn settled_amount(&self) -> u64 {
        self.settled().map(|s| s.amount).sum()
    }

    /// 本輪沒有送出、也沒有放回佇列的金額
    pub fn lost_amount(&self) -> u64 {
        self.settlements
            .iter()
            .filter(|s| {
                matches!(
                    s.outcome,
                    AddressOutcome::Failed { .. } | AddressOutcome::Abandoned
                )
            })
            .map(|s| s.amount)
            .sum()
    }

    pub fn outcome_for(&self, address: &Address) -> Option<&AddressOutcome> {
        self.settlements
            .iter()
            .find(|s| &s.address == address)
            .map(|s| &s.outcome)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 佇列是空的，本輪不做事
    Idle,
    /// 上一輪還在送交易，本輪不 drain
    Busy,
    Completed(CycleReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingEntry {
    pub address: Address,
    pub requests: u64,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingReport {
    pub taken_at: DateTime<Utc>,
    pub total_requests: usize,
    pub entries: Vec<PendingEntry>,
}

impl PendingReport {
    pub fn requests_for(&self, address: &Address) -> u64 {
        self.entries
            .iter()
            .find(|entry| &entry.address == address)
            .map(|entry| entry.requests)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DripReceipt {
    pub request_id: u64,
    pub address: Address,
}
