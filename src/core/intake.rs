use crate::core::queue::RequestQueue;
use crate::domain::model::{Address, DripReceipt};
use crate::utils::error::Result;

/// Validates an address and queues one drip for it.
///
/// Acceptance only means "queued": no settlement outcome is ever reported
/// back to the caller.
#[derive(Debug, Clone)]
pub struct IntakeEndpoint {
    queue: RequestQueue,
}

impl IntakeEndpoint {
    pub fn new(queue: RequestQueue) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn submit(&self, raw_address: &str) -> Result<DripReceipt> {
        let address = match Address::parse(raw_address) {
            Ok(address) => address,
            Err(e) => {
                tracing::debug!("Rejected drip request: {}", e);
                return Err(e);
            }
        };

        let request_id = self.queue.enqueue(address.clone());
        tracing::info!("💧 Token drip request queued: {} (id {})", address, request_id);

        Ok(DripReceipt {
            request_id,
            address,
        })
    }
}
