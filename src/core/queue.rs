use crate::domain::model::{Address, DripRequest};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct QueueState {
    pending: Vec<DripRequest>,
    next_id: u64,
}

/// 待結算的領取請求。
///
/// `enqueue`、`drain`、`snapshot` 都在同一把鎖裡完成，所以每個請求
/// 只會出現在一次 drain 的結果裡。Cloning the queue yields another handle
/// to the same buffer.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    state: Arc<Mutex<QueueState>>,
    amount_per_request: u64,
}

impl RequestQueue {
    pub fn new(amount_per_request: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            amount_per_request,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // 鎖內沒有會 panic 的操作，中毒時直接沿用內容
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn amount_per_request(&self) -> u64 {
        self.amount_per_request
    }

    /// Appends one request for the fixed per-request amount and returns its id.
    pub fn enqueue(&self, address: Address) -> u64 {
        self.enqueue_amount(address, self.amount_per_request)
    }

    /// Appends a request carrying an explicit amount, used when a failed
    /// settlement puts an address total back for the next cycle.
    pub fn enqueue_amount(&self, address: Address, amount: u64) -> u64 {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.pending.push(DripRequest {
            id,
            address,
            amount,
            requested_at: Utc::now(),
        });
        id
    }

    pub fn drain(&self) -> Vec<DripRequest> {
        std::mem::take(&mut self.lock().pending)
    }

    pub fn snapshot(&self) -> Vec<DripRequest> {
        self.lock().pending.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new(1)
    }
}
