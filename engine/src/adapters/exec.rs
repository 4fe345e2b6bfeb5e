use crate::common::{EngineError, EngineResult};
use crate::ports::CommandExecutor;
use async_trait::async_trait;
use tokio::process::Command;

/// Runs commands with `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandExecutor;

impl TokioCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for TokioCommandExecutor {
    async fn exec(&self, argv: &[String]) -> EngineResult<String> {
        let Some((program, args)) = argv.split_first() else {
            return Err(EngineError::Exec {
                command: String::new(),
                reason: "empty argv".to_string(),
            });
        };

        log::debug!("Executing {program} {args:?}");
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| EngineError::Exec {
                command: program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(EngineError::Exec {
                command: program.clone(),
                reason: format!(
                    "exit status {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_argv_is_rejected() {
        let result = TokioCommandExecutor::new().exec(&[]).await;
        assert!(matches!(result, Err(EngineError::Exec { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_echo_output_is_returned() {
        let argv = vec!["echo".to_string(), "hello".to_string()];
        let output = TokioCommandExecutor::new().exec(&argv).await.unwrap();
        assert_eq!(output.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_error() {
        let argv = vec!["false".to_string()];
        assert!(TokioCommandExecutor::new().exec(&argv).await.is_err());
    }
}
