//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::sync::Arc;
use zenstudy_core::ports::AttendanceStore;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AttendanceStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// The current instant, carried in the institution's fixed offset.
    /// Every handler derives "today" from this one value so the client,
    /// the core, and the storage layer agree on the day boundary.
    pub fn now_local(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.config.utc_offset)
    }

    pub fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }
}
