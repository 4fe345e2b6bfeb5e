//! Wires the engine facets to their concrete collaborators.

use crate::config::AppConfig;
use engine::adapters::{JsonSettingsStore, ShellBackupScriptBuilder, TokioCommandExecutor};
use engine::ports::{CommandExecutor, EngineEvent, EventBus, ScriptBuilder, SettingsService};
use engine::restore_points::Collaborators;
use engine::state::EngineState;
use engine::{EngineLayout, EngineOptions, RestorePointService, ThemeRepository};
use std::sync::Arc;

/// Writes engine events to the log; the terminal has no widgets to refresh.
#[derive(Debug, Clone, Default)]
pub struct LogEventBus;

impl EventBus for LogEventBus {
    fn emit(&self, event: EngineEvent) {
        match &event {
            EngineEvent::RestorePointDisplayUpdated { id, timestamp } => {
                log::info!("Last restore point: {id} ({timestamp})");
            }
            EngineEvent::RestorePointRestored { id } => log::info!("Restored {id}"),
            other => log::debug!("Event: {}", other.name()),
        }
    }
}

pub struct App {
    pub layout: EngineLayout,
    pub themes: Arc<ThemeRepository>,
    pub points: RestorePointService,
    pub settings: Arc<dyn SettingsService>,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        let layout = config.layout();
        let settings = Arc::new(JsonSettingsStore::load(layout.settings_path()));
        let scripts = Arc::new(ShellBackupScriptBuilder::from_user_dirs());
        Self::with_collaborators(
            layout,
            config.engine_options(),
            Arc::new(TokioCommandExecutor::new()),
            settings,
            scripts,
        )
    }

    pub fn with_collaborators(
        layout: EngineLayout,
        options: EngineOptions,
        executor: Arc<dyn CommandExecutor>,
        settings: Arc<dyn SettingsService>,
        scripts: Arc<dyn ScriptBuilder>,
    ) -> Self {
        let themes = Arc::new(ThemeRepository::new(layout.clone(), &options));
        let points = RestorePointService::new(
            &layout,
            options,
            Arc::clone(&themes),
            Arc::new(EngineState::new()),
            Collaborators {
                executor,
                settings: Arc::clone(&settings),
                events: Arc::new(LogEventBus),
                scripts,
            },
        );

        Self {
            layout,
            themes,
            points,
            settings,
        }
    }

    /// Theme recorded as the source of new restore points.
    pub fn current_theme(&self) -> String {
        self.settings
            .current_theme()
            .unwrap_or_else(|| engine::layout::DEFAULT_THEME_NAME.to_string())
    }
}
