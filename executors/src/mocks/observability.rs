//! Mock observability sink.

use std::future::Future;
use std::sync::{Arc, Mutex};

use flowgate_core::ServiceError;

use super::poisoned;
use crate::services::{FlowEvent, ObservabilityService};

/// Captures published events in memory.
#[derive(Debug, Clone)]
pub struct MockObservabilityService {
    enabled: bool,
    events: Arc<Mutex<Vec<FlowEvent>>>,
    fail_with: Arc<Mutex<Option<ServiceError>>>,
}

impl Default for MockObservabilityService {
    fn default() -> Self {
        Self {
            enabled: true,
            events: Arc::new(Mutex::new(Vec::new())),
            fail_with: Arc::new(Mutex::new(None)),
        }
    }
}

impl MockObservabilityService {
    /// Create an enabled sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a disabled sink.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Make every subsequent publish fail with `error`.
    pub fn set_failure(&self, error: Option<ServiceError>) {
        if let Ok(mut fail) = self.fail_with.lock() {
            *fail = error;
        }
    }

    /// Events captured so far.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ObservabilityService for MockObservabilityService {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn publish_event(
        &self,
        event: FlowEvent,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        let events = Arc::clone(&self.events);
        let failure = self.fail_with.lock().ok().and_then(|guard| guard.clone());

        async move {
            if let Some(error) = failure {
                return Err(error);
            }
            events.lock().map_err(|_| poisoned())?.push(event);
            Ok(())
        }
    }
}
