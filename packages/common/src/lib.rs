pub mod config;
pub mod error;
pub mod judging;
pub mod judging_result;
pub mod rejudging;
pub mod run;
pub mod time_format;

pub use judging::{JudgingId, JudgingRecord, JudgingState, JudgingTransition};
pub use judging_result::JudgingResult;
pub use rejudging::{Rejudging, RejudgingId};
pub use run::RunRecord;
