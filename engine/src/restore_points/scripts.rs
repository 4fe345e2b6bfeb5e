//! Runs the backup script that refreshes the live default theme.

use crate::common::fs_util::now_millis;
use crate::common::{EngineError, EngineResult};
use crate::ports::{BackupScriptRequest, CommandExecutor, ScriptBuilder};
use std::fs;
use std::path::{Path, PathBuf};

const SCRIPT_PREFIX: &str = "lastlayer-backup-";

pub fn script_path_for(scratch_dir: &Path, stamp: i64) -> PathBuf {
    scratch_dir.join(format!("{SCRIPT_PREFIX}{stamp}.sh"))
}

/// Writes the builder's script into `scratch_dir`, runs it with `bash` and
/// removes it again. Returns the script's stdout.
pub async fn run_backup_script(
    executor: &dyn CommandExecutor,
    builder: &dyn ScriptBuilder,
    request: &BackupScriptRequest,
    scratch_dir: &Path,
) -> EngineResult<String> {
    let script = builder.build_backup_script(request);
    if script.trim().is_empty() {
        return Err(EngineError::Exec {
            command: "bash".to_string(),
            reason: "backup script is empty".to_string(),
        });
    }

    fs::create_dir_all(scratch_dir).map_err(|e| EngineError::io(scratch_dir, e))?;
    let script_path = script_path_for(scratch_dir, now_millis());
    fs::write(&script_path, script).map_err(|e| EngineError::io(&script_path, e))?;

    log::info!(
        "Running backup script for {} folder(s) into {}",
        request.folders.len(),
        request.target_dir.display()
    );
    let argv = vec!["bash".to_string(), script_path.to_string_lossy().into_owned()];
    let result = executor.exec(&argv).await;

    if let Err(e) = fs::remove_file(&script_path) {
        log::debug!("Could not remove {}: {e}", script_path.display());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingExecutor {
        calls: Mutex<Vec<Vec<String>>>,
        script_seen: Mutex<Option<String>>,
        fail: bool,
    }

    #[async_trait]
    impl CommandExecutor for RecordingExecutor {
        async fn exec(&self, argv: &[String]) -> EngineResult<String> {
            self.calls.lock().unwrap().push(argv.to_vec());
            *self.script_seen.lock().unwrap() = fs::read_to_string(&argv[1]).ok();
            if self.fail {
                Err(EngineError::Exec {
                    command: argv[0].clone(),
                    reason: "exit status 1".to_string(),
                })
            } else {
                Ok("done".to_string())
            }
        }
    }

    struct FixedScript(&'static str);

    impl ScriptBuilder for FixedScript {
        fn build_backup_script(&self, _request: &BackupScriptRequest) -> String {
            self.0.to_string()
        }
    }

    fn request() -> BackupScriptRequest {
        BackupScriptRequest {
            folders: vec!["waybar".to_string()],
            source_theme: "nord".to_string(),
            target_dir: PathBuf::from("/tmp/default"),
        }
    }

    fn executor(fail: bool) -> RecordingExecutor {
        RecordingExecutor {
            calls: Mutex::new(Vec::new()),
            script_seen: Mutex::new(None),
            fail,
        }
    }

    #[tokio::test]
    async fn test_script_is_run_with_bash_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor(false);

        let output = run_backup_script(&executor, &FixedScript("echo hi\n"), &request(), dir.path())
            .await
            .unwrap();

        assert_eq!(output, "done");
        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], "bash");
        assert_eq!(executor.script_seen.lock().unwrap().as_deref(), Some("echo hi\n"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_script_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor(true);

        let result =
            run_backup_script(&executor, &FixedScript("exit 1\n"), &request(), dir.path()).await;
        assert!(result.is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_script_never_executes() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor(false);

        let result = run_backup_script(&executor, &FixedScript("  \n"), &request(), dir.path()).await;
        assert!(result.is_err());
        assert!(executor.calls.lock().unwrap().is_empty());
    }
}
