use std::sync::Arc;

use common::time_format::DisplayClock;

use crate::config::AppConfig;
use crate::services::judging::JudgingService;
use crate::services::standings::StandingsService;
use crate::store::ResultStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub judgings: JudgingService,
    pub standings: StandingsService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ResultStore>) -> Self {
        let clock = Arc::new(DisplayClock::new(config.judging.display_utc_offset_minutes));
        Self {
            judgings: JudgingService::new(store.clone(), clock),
            standings: StandingsService::new(store, config.progress.clone()),
            config,
        }
    }
}
