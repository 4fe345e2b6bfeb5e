#![allow(dead_code)]

use async_trait::async_trait;
use engine::adapters::{FlumeEventBus, JsonSettingsStore, ShellBackupScriptBuilder};
use engine::common::{EngineError, EngineResult};
use engine::ports::{CommandExecutor, EngineEvent};
use engine::restore_points::Collaborators;
use engine::state::EngineState;
use engine::{EngineLayout, EngineOptions, RestorePointService, ThemeRepository};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Answers `ps` with canned output and pretends to run scripts.
pub struct ScriptedExecutor {
    pub ps_output: String,
    pub fail_scripts: bool,
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new(ps_output: &str, fail_scripts: bool) -> Self {
        Self {
            ps_output: ps_output.to_string(),
            fail_scripts,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|argv| argv[0].clone())
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn exec(&self, argv: &[String]) -> EngineResult<String> {
        self.calls.lock().unwrap().push(argv.to_vec());
        match argv.first().map(String::as_str) {
            Some("ps") => Ok(self.ps_output.clone()),
            Some("bash") if self.fail_scripts => Err(EngineError::Exec {
                command: "bash".to_string(),
                reason: "exit status 1".to_string(),
            }),
            Some("bash") => Ok(String::new()),
            _ => Err(EngineError::Exec {
                command: argv.join(" "),
                reason: "unexpected command".to_string(),
            }),
        }
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub layout: EngineLayout,
    pub service: RestorePointService,
    pub settings: Arc<JsonSettingsStore>,
    pub executor: Arc<ScriptedExecutor>,
    pub events: flume::Receiver<EngineEvent>,
}

impl Harness {
    pub fn new(executor: ScriptedExecutor) -> Self {
        Self::with_options(executor, EngineOptions::default())
    }

    pub fn with_options(executor: ScriptedExecutor, options: EngineOptions) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let layout = EngineLayout::rooted_at(dir.path());
        let settings = Arc::new(JsonSettingsStore::load(layout.settings_path()));
        let executor = Arc::new(executor);
        let (bus, events) = FlumeEventBus::new();
        let themes = Arc::new(ThemeRepository::new(layout.clone(), &options));

        let service = RestorePointService::new(
            &layout,
            options,
            themes,
            Arc::new(EngineState::new()),
            Collaborators {
                executor: executor.clone(),
                settings: settings.clone(),
                events: Arc::new(bus),
                scripts: Arc::new(ShellBackupScriptBuilder::new(dir.path().join("config"))),
            },
        );

        Self {
            dir,
            layout,
            service,
            settings,
            executor,
            events,
        }
    }

    pub fn default_dir(&self) -> PathBuf {
        self.layout.default_theme_dir()
    }

    /// A default theme with a waybar config and a hyprland autostart.
    pub fn seed_default_theme(&self) {
        let live = self.default_dir();
        write(&live.join("waybar/config.jsonc"), "{\"layer\": \"top\"}");
        write(&live.join("waybar/style.css"), "* { font-size: 12px; }");
        write(&live.join("hypr/hyprland.conf"), "exec-once = waybar\n");
    }

    pub fn drain_events(&self) -> Vec<EngineEvent> {
        self.events.try_iter().collect()
    }
}

pub fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Relative file paths and contents under `root`, sorted.
pub fn snapshot_files(root: &Path) -> Vec<(String, String)> {
    let mut files: Vec<(String, String)> = walkdir::WalkDir::new(root)
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            (relative, fs::read_to_string(entry.path()).unwrap_or_default())
        })
        .collect();
    files.sort();
    files
}
