//! The simulation engine: cost model, feed contract, lifecycle state
//! machine, and the bar-by-bar driver.

pub mod costs;
pub mod driver;
pub mod feed;
pub mod lifecycle;
pub mod strategy;

pub use costs::CostModel;
pub use driver::{run_simulation, RunResult, SimConfig};
pub use feed::{BarFeed, FeedError, IntegrityCheck, SliceFeed};
pub use lifecycle::{EngagementEvent, EngagementOutcome, LifecycleManager, RejectReason};
pub use strategy::{ConstantRegime, NullStrategy, RegimeSource, ScriptedStrategy, Strategy};
