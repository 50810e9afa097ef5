use std::path::PathBuf;

/// Inline text starting with this is taken as the function body itself.
pub const FUNCTION_MARKER: &str = "function ";

/// Where inline code text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineOrigin {
    Literal,
    Url,
    File,
}

/// Classify inline code text, in priority order: literal function body,
/// then http(s) URL, then local file path.
pub fn classify(text: &str) -> InlineOrigin {
    if text.starts_with(FUNCTION_MARKER) {
        InlineOrigin::Literal
    } else if text.starts_with("http://") || text.starts_with("https://") {
        InlineOrigin::Url
    } else {
        InlineOrigin::File
    }
}

/// Remove the first `\n` in `content`, wherever it occurs. Only one is removed.
pub fn strip_first_newline(content: &str) -> String {
    content.replacen('\n', "", 1)
}

/// Resolves inline code text to the source it names.
#[derive(Debug, Clone, Default)]
pub struct SourceResolver {
    client: reqwest::Client,
}

impl SourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn resolve(&self, text: &str) -> Result<String, SourceError> {
        let origin = classify(text);
        let code = match origin {
            InlineOrigin::Literal => text.to_owned(),
            InlineOrigin::Url => strip_first_newline(&self.fetch(text).await?),
            InlineOrigin::File => {
                let content = tokio::fs::read_to_string(text).await.map_err(|e| {
                    SourceError::Read {
                        path: PathBuf::from(text),
                        source: e,
                    }
                })?;
                strip_first_newline(&content)
            }
        };

        tracing::info!(?origin, bytes = code.len(), "resolved inline source");
        Ok(code)
    }

    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        let fetch_err = |e| SourceError::Fetch {
            url: url.to_owned(),
            source: e,
        };

        self.client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fetch_err)?
            .text()
            .await
            .map_err(fetch_err)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read inline source file {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to fetch inline source from {url}")]
    Fetch { url: String, source: reqwest::Error },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_marker_wins_over_everything() {
        assert_eq!(classify("function main(){}"), InlineOrigin::Literal);
    }

    #[test]
    fn urls_are_detected_by_scheme() {
        assert_eq!(classify("http://x/y"), InlineOrigin::Url);
        assert_eq!(classify("https://x/y"), InlineOrigin::Url);
        assert_eq!(classify("httpd.js"), InlineOrigin::File);
    }

    #[test]
    fn everything_else_is_a_file() {
        assert_eq!(classify("./local/path"), InlineOrigin::File);
        assert_eq!(classify("main(){}"), InlineOrigin::File);
    }

    #[test]
    fn strip_removes_only_the_first_newline() {
        assert_eq!(strip_first_newline("\nfunction a(){}\n"), "function a(){}\n");
        assert_eq!(strip_first_newline("a\nb\nc"), "ab\nc");
        assert_eq!(strip_first_newline("no newline"), "no newline");
    }
}
