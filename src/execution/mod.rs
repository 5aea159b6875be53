pub mod executor;
pub mod options;
pub mod result;
pub mod status;
pub mod task_manager;
pub mod temporal;

pub use executor::{ActionExecutor, InstantaneousExecutor, executor_for};
pub use options::{ExecutionOptions, OverallCheckMode};
pub use result::ActionResult;
pub use status::{ActionNodeStatus, ConditionStatus, DispatcherStatus, MonitorStatus};
pub use task_manager::{TaskContainer, TaskGuard, TaskManager, TaskTracker};
pub use temporal::TemporalExecutor;
