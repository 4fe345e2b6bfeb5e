//! Concrete collaborators used outside of tests.

pub mod events;
pub mod exec;
pub mod scripts;
pub mod settings;

pub use events::{FlumeEventBus, NullEventBus};
pub use exec::TokioCommandExecutor;
pub use scripts::ShellBackupScriptBuilder;
pub use settings::JsonSettingsStore;
