use crate::config::AppConfig;
use crate::services::scheduling::SchedulingProvider;

pub struct AppState {
    pub config: AppConfig,
    pub scheduler: Box<dyn SchedulingProvider>,
}
