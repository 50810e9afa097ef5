use crate::error::{Error, Result};

/// Where the application source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// A git repository checked out by the builder.
    Git {
        url: String,
        revision: String,
        /// Sub-path of the application inside the repository.
        path: String,
    },
    /// Inline code: a literal function body, an http(s) URL, or a local file path.
    Inline { code: String },
}

impl SourceLocator {
    pub const DEFAULT_REVISION: &'static str = "master";
    pub const DEFAULT_PATH: &'static str = ".";

    /// Build a locator from CLI-style flags. Exactly one of `git_url` or
    /// `file` must be non-empty.
    pub fn from_flags(
        git_url: Option<&str>,
        git_revision: Option<&str>,
        git_path: Option<&str>,
        file: Option<&str>,
    ) -> Result<Self> {
        let git_url = non_empty(git_url);
        let file = non_empty(file);

        match (git_url, file) {
            (Some(_), Some(_)) => Err(Error::ConflictingSource),
            (None, None) => Err(Error::MissingSource),
            (Some(url), None) => Ok(Self::Git {
                url: url.to_owned(),
                revision: non_empty(git_revision)
                    .unwrap_or(Self::DEFAULT_REVISION)
                    .to_owned(),
                path: non_empty(git_path).unwrap_or(Self::DEFAULT_PATH).to_owned(),
            }),
            (None, Some(code)) => Ok(Self::Inline {
                code: code.to_owned(),
            }),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline { .. })
    }

    /// Inline code text, if this is an inline source.
    pub fn inline_code(&self) -> Option<&str> {
        match self {
            Self::Inline { code } => Some(code),
            Self::Git { .. } => None,
        }
    }
}

/// Everything needed to build one image. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIntent {
    name: String,
    namespace: String,
    builder: String,
    source: SourceLocator,
    target_image: String,
    service_account: String,
}

impl BuildIntent {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        builder: impl Into<String>,
        source: SourceLocator,
        target_image: impl Into<String>,
        service_account: impl Into<String>,
    ) -> Result<Self> {
        let intent = Self {
            name: name.into(),
            namespace: namespace.into(),
            builder: builder.into(),
            source,
            target_image: target_image.into(),
            service_account: service_account.into(),
        };

        if intent.name.is_empty() {
            return Err(Error::EmptyName);
        }
        if intent.namespace.is_empty() {
            return Err(Error::MissingFlag { flag: "namespace" });
        }
        if intent.builder.is_empty() {
            return Err(Error::MissingFlag { flag: "builder" });
        }
        if intent.target_image.is_empty() {
            return Err(Error::MissingFlag { flag: "image" });
        }

        Ok(intent)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn builder(&self) -> &str {
        &self.builder
    }

    pub fn source(&self) -> &SourceLocator {
        &self.source
    }

    pub fn target_image(&self) -> &str {
        &self.target_image
    }

    pub fn service_account(&self) -> &str {
        &self.service_account
    }

    /// Name of the source resource reconciled for this intent.
    pub fn source_resource_name(&self) -> String {
        format!("{}-git", self.name)
    }

    /// Name of the output-image resource reconciled for this intent.
    pub fn image_resource_name(&self) -> String {
        format!("{}-image", self.name)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
