mod candidates;
mod queue;
mod task;

pub use candidates::{CandidateSource, FixedCandidates, NoCandidates};
pub use queue::{EnrichmentQueue, QueueEvent, QueueStats};
pub use task::{EnrichmentTask, TaskFailure, TaskId, TaskKind, TaskOrigin, TaskState};
