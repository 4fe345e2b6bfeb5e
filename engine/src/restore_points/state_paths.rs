//! Pure helpers for restore-point ids, timestamps, containment and bar heuristics.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rand::Rng;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const RESTORE_POINT_ID_PREFIX: &str = "rp-";
const ID_MILLIS_LEN: usize = 13;
const ID_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Bar value stored when no status bar is known.
pub const DEFAULT_BAR: &str = "none";

/// Status bars the heuristics look for, in priority order.
pub const KNOWN_BARS: &[&str] = &[
    "waybar",
    "hyprpanel",
    "ags",
    "eww",
    "polybar",
    "ironbar",
    "nwg-panel",
    "quickshell",
    "yambar",
    "fabric",
];

const MAX_SCANNED_FILE_BYTES: u64 = 512 * 1024;

/// The only id shape ever used to address a directory:
/// `rp-<13 digit epoch ms>-<6 lowercase base36>`.
pub fn is_trusted_restore_point_id(id: &str) -> bool {
    let Some(rest) = id.strip_prefix(RESTORE_POINT_ID_PREFIX) else {
        return false;
    };
    let Some((millis, suffix)) = rest.split_once('-') else {
        return false;
    };

    millis.len() == ID_MILLIS_LEN
        && millis.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == ID_SUFFIX_LEN
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

/// New id for the current instant. No collision check is made.
pub fn build_restore_point_id() -> String {
    build_restore_point_id_at(Utc::now().timestamp_millis(), &mut rand::thread_rng())
}

pub fn build_restore_point_id_at<R: Rng>(millis: i64, rng: &mut R) -> String {
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{RESTORE_POINT_ID_PREFIX}{millis:013}-{suffix}")
}

/// Epoch milliseconds encoded in a trusted id.
pub fn restore_point_id_millis(id: &str) -> Option<i64> {
    if !is_trusted_restore_point_id(id) {
        return None;
    }
    id[RESTORE_POINT_ID_PREFIX.len()..RESTORE_POINT_ID_PREFIX.len() + ID_MILLIS_LEN]
        .parse()
        .ok()
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Best-effort parse of the time representations found in manifests.
///
/// Accepts RFC 3339 with an offset, and `YYYY-MM-DD HH:MM[:SS]` with either a
/// space or `T` separator (interpreted as local time).
pub fn parse_snapshot_datetime(value: &str) -> Option<DateTime<Local>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Local));
    }

    NAIVE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
    })
}

/// `YYYY-MM-DD HH:MM:SS`; unparseable input becomes the current time.
pub fn normalize_snapshot_timestamp(value: &str) -> String {
    parse_snapshot_datetime(value)
        .unwrap_or_else(Local::now)
        .format(SNAPSHOT_TIMESTAMP_FORMAT)
        .to_string()
}

/// ISO-8601 UTC with milliseconds; unparseable input becomes the current time.
pub fn normalize_created_at(value: &str) -> String {
    parse_snapshot_datetime(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn utc_from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn timestamp_from_millis(millis: i64) -> String {
    utc_from_millis(millis)
        .with_timezone(&Local)
        .format(SNAPSHOT_TIMESTAMP_FORMAT)
        .to_string()
}

pub fn created_at_from_millis(millis: i64) -> String {
    utc_from_millis(millis).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Collapses `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Absolute, canonical form of `path`.
///
/// The longest existing ancestor is canonicalized (resolving symlinks) and
/// the not-yet-existing remainder is appended, so targets that are about to
/// be created can be checked too.
pub fn resolve_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let absolute = lexical_normalize(&absolute);

    let mut existing = absolute.as_path();
    let mut remainder = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            let mut resolved = canonical;
            for part in remainder.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                remainder.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

/// True when `path` is `dir` itself or lies below it, after both are resolved.
pub fn is_path_in_directory(path: &Path, dir: &Path) -> bool {
    let path = resolve_path(path);
    let dir = resolve_path(dir);
    path == dir || path.starts_with(&dir)
}

/// Lower-cased bar name, or [`DEFAULT_BAR`] for empty input.
pub fn normalize_bar_name(value: &str) -> String {
    let value = value.trim().to_ascii_lowercase();
    if value.is_empty() {
        DEFAULT_BAR.to_string()
    } else {
        value
    }
}

pub fn is_known_bar(value: &str) -> bool {
    KNOWN_BARS.contains(&value)
}

/// First known bar launched by an `exec`/`exec-once` line (or a plain
/// autostart line) in `text`.
pub fn detect_bar_in_text(text: &str) -> Option<&'static str> {
    let mut found: Option<usize> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let lowered = line.to_ascii_lowercase();
        let command = match lowered.split_once('=') {
            Some((key, rest)) if key.trim().starts_with("exec") => rest.to_string(),
            Some(_) => continue,
            None => lowered,
        };

        for token in command.split(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_')) {
            if let Some(index) = KNOWN_BARS.iter().position(|bar| *bar == token) {
                found = Some(found.map_or(index, |current| current.min(index)));
            }
        }
    }

    found.map(|index| KNOWN_BARS[index])
}

fn read_small_file(path: &Path) -> Option<String> {
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() || meta.len() > MAX_SCANNED_FILE_BYTES {
        return None;
    }
    fs::read_to_string(path).ok()
}

fn startup_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = vec![
        dir.join("hypr").join("hyprland.conf"),
        dir.join("hyprland.conf"),
        dir.join("autostart"),
        dir.join("autostart.sh"),
        dir.join("start.sh"),
    ];

    if let Ok(entries) = fs::read_dir(dir.join("hypr")) {
        let mut extra: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "conf"))
            .filter(|p| !files.contains(p))
            .collect();
        extra.sort();
        files.extend(extra);
    }
    files
}

/// Heuristic scan of a theme or snapshot directory for the status bar it uses.
///
/// Startup lines win over directory names because a theme may ship configs
/// for bars it never launches.
pub fn detect_bar_in_directory(dir: &Path) -> Option<String> {
    if !dir.is_dir() {
        return None;
    }

    for file in startup_files(dir) {
        if let Some(bar) = read_small_file(&file).as_deref().and_then(detect_bar_in_text) {
            return Some(bar.to_string());
        }
    }

    KNOWN_BARS
        .iter()
        .find(|bar| dir.join(bar).is_dir())
        .map(|bar| bar.to_string())
}
