//! Running-bar detection and the settings writes that follow a theme change.

use super::state_paths::{DEFAULT_BAR, KNOWN_BARS, normalize_bar_name, timestamp_from_millis};
use crate::common::EngineResult;
use crate::common::fs_util::now_millis;
use crate::ports::{CommandExecutor, SettingsService};
use crate::state::EngineState;

/// `comm` names can carry a leading dot and a `-wrapped` suffix (Nix wrappers).
fn process_bar_name(line: &str) -> Option<&'static str> {
    let name = line.trim().to_ascii_lowercase();
    let name = name.trim_start_matches('.');
    let name = name.strip_suffix("-wrapped").unwrap_or(name);
    KNOWN_BARS.iter().copied().find(|bar| *bar == name)
}

/// First known bar in `ps -eo comm=` output.
pub fn parse_running_bar(ps_output: &str) -> Option<&'static str> {
    ps_output.lines().find_map(process_bar_name)
}

pub async fn detect_running_bar(executor: &dyn CommandExecutor) -> Option<String> {
    let argv = ["ps", "-eo", "comm="].map(str::to_string);
    match executor.exec(&argv).await {
        Ok(output) => parse_running_bar(&output).map(str::to_string),
        Err(e) => {
            log::warn!("Bar detection failed: {e}");
            None
        }
    }
}

/// Records the bar used by the default theme. Returns the normalized name.
pub fn set_default_theme_bar(
    settings: &dyn SettingsService,
    bar: &str,
    manual: bool,
) -> EngineResult<String> {
    let bar = normalize_bar_name(bar);
    settings.set_default_theme_bar(&bar)?;
    settings.set_default_bar_manual(manual)?;
    Ok(bar)
}

/// Pushes the applied theme into settings and stamps the update time.
///
/// Each write is independent; a failure leaves earlier writes in place.
pub fn sync_theme_to_settings(
    settings: &dyn SettingsService,
    state: &EngineState,
    theme: &str,
    bar: Option<&str>,
    manual: bool,
) -> EngineResult<String> {
    settings.set_current_theme(theme)?;
    set_default_theme_bar(settings, bar.unwrap_or(DEFAULT_BAR), manual)?;

    let timestamp = timestamp_from_millis(now_millis());
    settings.set_last_update_timestamp(&timestamp)?;
    state.set_last_update_timestamp(timestamp.clone());
    log::info!("Settings now point at theme '{theme}'");
    Ok(timestamp)
}
