//! Walker module - recursive enumeration, per-subject tasks and fan-out

pub mod backend;
pub mod coordinator;
pub mod subject;
pub mod walk;

pub use backend::{ExecutionBackend, SequentialBackend, SubjectTask, ThreadedBackend};
pub use coordinator::{InventoryCoordinator, ScanOutcome};
pub use subject::{
    process_subject, ApiSubjectProcessor, SourceBreakdown, SubjectResult, SubjectStatus,
};
pub use walk::{WalkStats, Walker, DEFAULT_MAX_DEPTH, SIZE_ESTIMATE_BYTES};
