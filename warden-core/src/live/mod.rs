//! Live/paper routing: the same lifecycle manager and risk brain driven by
//! a real-time feed and an execution sink instead of a historical replay.

pub mod broker;
pub mod router;
pub mod shared;

pub use broker::{ExecutionSink, PaperSink, SinkAck};
pub use router::{RouterReport, RuntimeRouter, StopCause};
pub use shared::SharedAccount;
