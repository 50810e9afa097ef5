use std::path::PathBuf;

use crate::kubectl::KubectlError;

/// Abstraction over kubectl execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait KubectlExecutor: Send + Sync {
    /// Execute a kubectl command and capture stdout.
    async fn exec(&self, args: &[String]) -> Result<String, KubectlError>;

    /// Execute a kubectl command with a manifest piped to stdin.
    async fn exec_with_stdin(
        &self,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, KubectlError>;
}

/// Real kubectl CLI executor.
#[derive(Debug, Clone, Default)]
pub struct RealExecutor {
    kubeconfig: Option<PathBuf>,
}

impl RealExecutor {
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        Self { kubeconfig }
    }

    fn command(&self, args: &[String]) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("kubectl");
        if let Some(path) = &self.kubeconfig {
            cmd.arg("--kubeconfig").arg(path);
        }
        cmd.args(args);
        cmd
    }
}

impl KubectlExecutor for RealExecutor {
    async fn exec(&self, args: &[String]) -> Result<String, KubectlError> {
        use std::process::Stdio;

        tracing::debug!(?args, "kubectl");
        let output = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| KubectlError::NotFound { source: e })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| KubectlError::InvalidUtf8 { source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(KubectlError::command_failed(args.to_vec(), stderr))
        }
    }

    async fn exec_with_stdin(
        &self,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, KubectlError> {
        use std::process::Stdio;
        use tokio::io::AsyncWriteExt;

        tracing::debug!(?args, bytes = stdin_data.len(), "kubectl (stdin)");
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| KubectlError::NotFound { source: e })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(stdin_data)
                .await
                .map_err(|e| KubectlError::StdinWrite { source: e })?;
            stdin
                .shutdown()
                .await
                .map_err(|e| KubectlError::StdinWrite { source: e })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| KubectlError::NotFound { source: e })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| KubectlError::InvalidUtf8 { source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(KubectlError::command_failed(args.to_vec(), stderr))
        }
    }
}
