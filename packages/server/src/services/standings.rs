use std::sync::Arc;

use common::config::ProgressConfig;
use serde::Serialize;
use standings::{Standings, compute_standings};
use tracing::{info, instrument};

use crate::store::{PeriodBound, ResultStore, StoreError};

/// Everything the standings page renders.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StandingsReport {
    pub standings: Standings,
    /// Earliest course period, by label.
    pub first_period: Option<PeriodBound>,
    /// Latest course period, by label.
    pub last_period: Option<PeriodBound>,
}

#[derive(Clone)]
pub struct StandingsService {
    store: Arc<dyn ResultStore>,
    config: ProgressConfig,
}

impl StandingsService {
    pub fn new(store: Arc<dyn ResultStore>, config: ProgressConfig) -> Self {
        Self { store, config }
    }

    #[instrument(skip(self))]
    pub async fn report(&self) -> Result<StandingsReport, StoreError> {
        let records = self
            .store
            .fetch_correctness_records(
                self.config.participant_category,
                &self.config.period_label_prefix,
            )
            .await?;
        let bounds = self
            .store
            .fetch_period_bounds(&self.config.period_label_prefix)
            .await?;

        let standings = compute_standings(&records, &self.config);
        info!(
            records = records.len(),
            participants = standings.rows.len(),
            periods = bounds.len(),
            "Built standings report"
        );

        Ok(StandingsReport {
            first_period: bounds.first().cloned(),
            last_period: bounds.last().cloned(),
            standings,
        })
    }
}
