#[derive(Debug, thiserror::Error)]
pub enum KubectlError {
    #[error("kubectl not found — install: https://kubernetes.io/docs/tasks/tools/")]
    NotFound { source: std::io::Error },

    #[error("kubectl {} failed{}\n{stderr}", verb(.args), reason_suffix(.reason))]
    CommandFailed {
        args: Vec<String>,
        /// API status reason from `Error from server (<reason>): ...`.
        reason: Option<String>,
        stderr: String,
    },

    #[error("kubectl output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },

    #[error("failed to write to kubectl stdin")]
    StdinWrite { source: std::io::Error },
}

impl KubectlError {
    pub fn command_failed(args: Vec<String>, stderr: String) -> Self {
        let reason = api_reason(&stderr).map(str::to_owned);
        Self::CommandFailed {
            args,
            reason,
            stderr,
        }
    }

    /// API status reason of a failed command, if the server reported one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}

fn verb(args: &[String]) -> &str {
    args.first().map_or("command", String::as_str)
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default()
}

fn api_reason(stderr: &str) -> Option<&str> {
    let rest = stderr.split("Error from server (").nth(1)?;
    let (reason, _) = rest.split_once(')')?;
    Some(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_api_reason() {
        let err = KubectlError::command_failed(
            vec!["get".to_owned()],
            r#"Error from server (NotFound): tasks.tekton.dev "kaniko" not found"#.to_owned(),
        );
        assert_eq!(err.reason(), Some("NotFound"));
        assert!(err.to_string().starts_with("kubectl get failed (NotFound)"));
    }

    #[test]
    fn client_side_failures_have_no_reason() {
        let err = KubectlError::command_failed(
            vec![],
            "Unable to connect to the server: dial tcp: i/o timeout".to_owned(),
        );
        assert_eq!(err.reason(), None);
        assert!(err.to_string().starts_with("kubectl command failed\n"));
    }
}
