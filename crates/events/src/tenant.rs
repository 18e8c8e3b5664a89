use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use rentbook_core::TenantId;

use crate::{EventEnvelope, Subscription};

/// Messages that belong to exactly one tenant.
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;
}

impl<E> TenantScoped for EventEnvelope<E> {
    fn tenant_id(&self) -> TenantId {
        EventEnvelope::tenant_id(self)
    }
}

/// A subscription pinned to one tenant: messages of other tenants are
/// discarded before they reach the consumer.
#[derive(Debug)]
pub struct TenantFeed<M> {
    tenant_id: TenantId,
    inner: Subscription<M>,
}

impl<M: TenantScoped> TenantFeed<M> {
    pub fn new(tenant_id: TenantId, inner: Subscription<M>) -> Self {
        Self { tenant_id, inner }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Wait up to `timeout` for the next message of this tenant.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let message = self.inner.recv_timeout(remaining)?;
            if message.tenant_id() == self.tenant_id {
                return Ok(message);
            }
        }
    }

    /// This tenant's queued messages, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.inner
            .drain()
            .into_iter()
            .filter(|m| m.tenant_id() == self.tenant_id)
            .collect()
    }
}
