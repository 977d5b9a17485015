//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。reconciler はクラスタ・時計・ログ出力を
//! すべてこの trait 越しに使うので、テストでは全部差し替えられる。

pub mod clock;
pub mod cluster;
pub mod event_sink;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::cluster::{Cluster, ClusterError};
pub use self::event_sink::EventSink;
