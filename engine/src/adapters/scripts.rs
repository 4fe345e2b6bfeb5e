use crate::ports::{BackupScriptRequest, ScriptBuilder};
use std::fmt::Write;
use std::path::PathBuf;

/// Builds a bash script that mirrors the selected `~/.config` folders into
/// the live default theme.
#[derive(Debug, Clone)]
pub struct ShellBackupScriptBuilder {
    config_dir: PathBuf,
}

impl ShellBackupScriptBuilder {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn from_user_dirs() -> Self {
        Self::new(dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")))
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

impl ScriptBuilder for ShellBackupScriptBuilder {
    fn build_backup_script(&self, request: &BackupScriptRequest) -> String {
        let mut script = String::from("#!/usr/bin/env bash\nset -u\n");
        let _ = writeln!(
            script,
            "SOURCE={}",
            shell_quote(&self.config_dir.to_string_lossy())
        );
        let _ = writeln!(
            script,
            "TARGET={}",
            shell_quote(&request.target_dir.to_string_lossy())
        );
        let _ = writeln!(script, "# source theme: {}", request.source_theme.replace('\n', " "));
        script.push_str("mkdir -p \"$TARGET\"\n");

        for folder in &request.folders {
            let folder = folder.trim();
            if folder.is_empty() || folder.contains('/') || folder == "." || folder == ".." {
                continue;
            }
            let quoted = shell_quote(folder);
            let _ = writeln!(
                script,
                "if [ -e \"$SOURCE\"/{quoted} ]; then rm -rf \"$TARGET\"/{quoted}; cp -a \"$SOURCE\"/{quoted} \"$TARGET\"/; fi"
            );
        }
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_copies_each_folder() {
        let builder = ShellBackupScriptBuilder::new("/home/u/.config");
        let script = builder.build_backup_script(&BackupScriptRequest {
            folders: vec!["waybar".to_string(), "hypr".to_string()],
            source_theme: "nord".to_string(),
            target_dir: PathBuf::from("/home/u/.config/themes/default"),
        });

        assert!(script.starts_with("#!/usr/bin/env bash"));
        assert!(script.contains("SOURCE='/home/u/.config'"));
        assert!(script.contains("cp -a \"$SOURCE\"/'waybar' \"$TARGET\"/"));
        assert!(script.contains("cp -a \"$SOURCE\"/'hypr' \"$TARGET\"/"));
    }

    #[test]
    fn test_script_skips_unsafe_folders_and_quotes() {
        let builder = ShellBackupScriptBuilder::new("/c");
        let script = builder.build_backup_script(&BackupScriptRequest {
            folders: vec!["..".to_string(), "a/b".to_string(), "it's".to_string()],
            source_theme: "x".to_string(),
            target_dir: PathBuf::from("/t"),
        });

        assert!(!script.contains("'..'"));
        assert!(!script.contains("a/b"));
        assert!(script.contains(r"'it'\''s'"));
    }
}
