//! Runtime values shared between the theme and restore-point facets.

use std::sync::Mutex;

/// Mutable runtime state, owned once and handed to each facet by `Arc`.
#[derive(Debug, Default)]
pub struct EngineState {
    last_update_timestamp: Mutex<Option<String>>,
    detected_bar: Mutex<Option<String>>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_update_timestamp(&self) -> Option<String> {
        self.last_update_timestamp
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    pub fn set_last_update_timestamp(&self, timestamp: impl Into<String>) {
        if let Ok(mut guard) = self.last_update_timestamp.lock() {
            *guard = Some(timestamp.into());
        }
    }

    /// Bar found running the last time it was probed.
    pub fn detected_bar(&self) -> Option<String> {
        self.detected_bar.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn set_detected_bar(&self, bar: Option<String>) {
        if let Ok(mut guard) = self.detected_bar.lock() {
            *guard = bar;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrips_values() {
        let state = EngineState::new();
        assert!(state.last_update_timestamp().is_none());

        state.set_last_update_timestamp("2024-05-01 10:00:00");
        state.set_detected_bar(Some("waybar".to_string()));

        assert_eq!(state.last_update_timestamp().as_deref(), Some("2024-05-01 10:00:00"));
        assert_eq!(state.detected_bar().as_deref(), Some("waybar"));
    }
}
