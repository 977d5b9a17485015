//! EventSink port - イベント記録の抽象化
//!
//! - TracingEventSink: `tracing` に構造化ログとして流す（本番用）
//! - CapturingEventSink: メモリに貯める（テスト用）

use std::sync::Arc;

use crate::domain::ReapEvent;

/// EventSink は reconcile 中のイベントを記録
///
/// 記録の失敗で reconcile を止めたくないので戻り値は無し。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ReapEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: ReapEvent) {
        (**self).emit(event)
    }
}
