use serde::Serialize;

/// Notifications emitted towards the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum EngineEvent {
    /// The theme directory changed and the cached list was dropped.
    ThemesChanged,
    /// The restore-point manifest was rewritten.
    RestorePointsChanged,
    /// A restore point was copied back into the live theme.
    RestorePointRestored { id: String },
    /// The "last restore point" label should show a new entry.
    RestorePointDisplayUpdated { id: String, timestamp: String },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::ThemesChanged => "themes-changed",
            EngineEvent::RestorePointsChanged => "restore-points-changed",
            EngineEvent::RestorePointRestored { .. } => "restore-point-restored",
            EngineEvent::RestorePointDisplayUpdated { .. } => "restore-point-display-updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = EngineEvent::RestorePointRestored {
            id: "rp-1700000000000-abc123".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["id"], "rp-1700000000000-abc123");
    }
}
