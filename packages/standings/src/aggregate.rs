use std::collections::HashMap;

use crate::period::PeriodCatalog;
use crate::record::{CorrectnessRecord, ParticipantId};

/// Raw counts for one participant.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticipantTally {
    pub participant_id: ParticipantId,
    pub participant_name: String,
    /// Correct records across every input period, catalogued or not.
    pub total_correct: u32,
    /// One slot per catalogued period.
    pub per_period_correct: Vec<u32>,
    pub total_runtime: f64,
}

impl ParticipantTally {
    fn new(record: &CorrectnessRecord, periods: usize) -> Self {
        Self {
            participant_id: record.participant_id,
            participant_name: record.participant_name.clone(),
            total_correct: 0,
            per_period_correct: vec![0; periods],
            total_runtime: 0.0,
        }
    }

    pub fn periods_passed(&self, threshold: u32) -> u32 {
        self.per_period_correct
            .iter()
            .filter(|&&count| count >= threshold)
            .count() as u32
    }
}

/// Group `records` by participant, in order of first appearance.
pub fn tally(records: &[CorrectnessRecord], catalog: &PeriodCatalog) -> Vec<ParticipantTally> {
    let mut tallies: Vec<ParticipantTally> = Vec::new();
    let mut index: HashMap<ParticipantId, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.participant_id).or_insert_with(|| {
            tallies.push(ParticipantTally::new(record, catalog.len()));
            tallies.len() - 1
        });
        let tally = &mut tallies[slot];

        tally.total_runtime += record.runtime;
        if record.is_correct {
            tally.total_correct += 1;
            if let Some(period) = catalog.slot(&record.period_label) {
                tally.per_period_correct[period] += 1;
            }
        }
    }

    tallies
}
