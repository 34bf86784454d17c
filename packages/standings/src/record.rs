use serde::{Deserialize, Serialize};

pub type ParticipantId = i32;

/// One correctness fact from the result store: whether a participant solved
/// one problem in one period, and the runtime it counted with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CorrectnessRecord {
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub period_label: String,
    pub is_correct: bool,
    /// Seconds.
    pub runtime: f64,
}

impl CorrectnessRecord {
    pub fn new(
        participant_id: ParticipantId,
        participant_name: impl Into<String>,
        period_label: impl Into<String>,
        is_correct: bool,
        runtime: f64,
    ) -> Self {
        Self {
            participant_id,
            participant_name: participant_name.into(),
            period_label: period_label.into(),
            is_correct,
            runtime,
        }
    }
}
