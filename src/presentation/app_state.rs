// Application state for HTTP handlers
use crate::application::monitor_service::DashboardReceiver;

#[derive(Clone)]
pub struct AppState {
    pub dashboards: DashboardReceiver,
}
