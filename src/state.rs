use std::sync::Arc;
use crate::bookings::Repository;
use crate::notify::Notifier;
use crate::rate_limit::Admission;
// app's shared state

pub struct AppState {
    pub admission: Arc<Admission>, // one per process, owns the rate limit store
    pub repository: Repository,
    pub notifier: Arc<Notifier>,
}

impl AppState {
    pub fn new(admission: Arc<Admission>, repository: Repository, notifier: Notifier) -> Self {
        Self {
            admission,
            repository,
            notifier: Arc::new(notifier),
        }
    }
}
