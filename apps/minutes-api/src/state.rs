use std::sync::Arc;

use minutes_service::MinutesService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MinutesService>,
}
impl AppState {
	pub fn new(config: minutes_config::Config) -> Self {
		Self::from_service(MinutesService::new(config))
	}

	pub fn from_service(service: MinutesService) -> Self {
		Self { service: Arc::new(service) }
	}
}
