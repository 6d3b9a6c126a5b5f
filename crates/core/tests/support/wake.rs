//! Mock wake resource.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chime_core::session::ports::WakeSource;
use chime_domain::{ChimeError, Result as DomainResult};

/// Counts acquisitions and releases; optionally denies every acquire to
/// exercise degraded-mode entry.
#[derive(Default)]
pub struct MockWakeSource {
    deny: bool,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl MockWakeSource {
    pub fn denying() -> Self {
        Self { deny: true, ..Self::default() }
    }

    pub fn acquire_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WakeSource for MockWakeSource {
    async fn acquire(&self, _timeout: Duration) -> DomainResult<()> {
        if self.deny {
            return Err(ChimeError::Actuator("wake resource denied".into()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn release(&self) -> DomainResult<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
