//! CapturingEventSink - テスト用、イベントをメモリに貯める

use std::sync::Mutex;

use crate::domain::ReapEvent;
use crate::ports::EventSink;

#[derive(Debug, Default)]
pub struct CapturingEventSink {
    events: Mutex<Vec<ReapEvent>>,
}

impl CapturingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of captured events matching `pred`.
    pub fn count(&self, pred: impl Fn(&ReapEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| pred(e))
            .count()
    }
}

impl EventSink for CapturingEventSink {
    fn emit(&self, event: ReapEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}
