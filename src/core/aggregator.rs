use crate::domain::model::{Address, BatchEntry, DripRequest, SettlementBatch};
use std::collections::HashMap;

/// 把請求依地址加總。輸出依地址第一次出現的順序排列。
pub fn aggregate(requests: &[DripRequest]) -> SettlementBatch {
    let mut index: HashMap<&Address, usize> = HashMap::with_capacity(requests.len());
    let mut entries: Vec<BatchEntry> = Vec::new();

    for request in requests {
        match index.get(&request.address) {
            Some(&position) => {
                let entry = &mut entries[position];
                entry.amount += request.amount;
                entry.request_count += 1;
            }
            None => {
                index.insert(&request.address, entries.len());
                entries.push(BatchEntry {
                    address: request.address.clone(),
                    amount: request.amount,
                    request_count: 1,
                });
            }
        }
    }

    SettlementBatch { entries }
}
