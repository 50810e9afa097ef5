//! Recover a build intent from what a previous build left in the store.

use knap_build::resources::{
    BUILDER_LABEL, INLINE_CODE_ANNOTATION, SERVICE_ACCOUNT_LABEL, TARGET_IMAGE_ANNOTATION,
};
use knap_core::{BuildIntent, DeclarativeResource, ResourceKind, SourceLocator};
use tokio::sync::OnceCell;

use crate::store::{ResourceStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RedeployError {
    #[error("cannot recover {flag} for redeploy, please use --{flag} to set")]
    MissingFlag { flag: &'static str },

    #[error("{kind} resource '{name}' not found, build it first or pass every flag explicitly")]
    MissingResource { kind: ResourceKind, name: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Invalid(#[from] knap_core::Error),
}

/// Values given on the command line. `None` and empty strings both mean
/// "recover from the store".
#[derive(Debug, Clone, Default)]
pub struct RedeployOverrides {
    pub builder: Option<String>,
    pub service_account: Option<String>,
    pub git_url: Option<String>,
    pub git_revision: Option<String>,
    pub git_path: Option<String>,
    pub file: Option<String>,
    pub image: Option<String>,
}

pub struct RedeployPlanner<'a, S> {
    store: &'a S,
}

impl<'a, S: ResourceStore> RedeployPlanner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Merge `overrides` with the labels, annotation and params of the
    /// saved `<name>-image` and `<name>-git` resources. Each saved resource
    /// is read at most once, and only when something is missing.
    pub async fn plan(
        &self,
        name: &str,
        namespace: &str,
        overrides: &RedeployOverrides,
    ) -> Result<BuildIntent, RedeployError> {
        let image_name = format!("{name}-image");
        let source_name = format!("{name}-git");
        let saved_image = OnceCell::new();
        let saved_source = OnceCell::new();
        let image_res = || self.cached(&saved_image, ResourceKind::Image, &image_name);
        let source_res = || self.cached(&saved_source, ResourceKind::Source, &source_name);

        let builder = match given(&overrides.builder) {
            Some(builder) => builder.to_owned(),
            None => recovered(image_res().await?.label(BUILDER_LABEL), "builder")?,
        };
        let service_account = match given(&overrides.service_account) {
            Some(sa) => sa.to_owned(),
            None => recovered(
                image_res().await?.label(SERVICE_ACCOUNT_LABEL),
                "serviceaccount",
            )?,
        };

        let git_url = given(&overrides.git_url);
        let code = match (given(&overrides.file), git_url) {
            (Some(_), Some(_)) => return Err(knap_core::Error::ConflictingSource.into()),
            (Some(file), None) => Some(file.to_owned()),
            (None, Some(_)) => None,
            (None, None) => image_res()
                .await?
                .annotation(INLINE_CODE_ANNOTATION)
                .filter(|code| !code.is_empty())
                .map(str::to_owned),
        };

        let source = match code {
            Some(code) => SourceLocator::Inline { code },
            None => {
                let url = match git_url {
                    Some(url) => url.to_owned(),
                    None => recovered(source_res().await?.spec_param(0), "git-url")?,
                };
                let revision = match given(&overrides.git_revision) {
                    Some(revision) => revision.to_owned(),
                    None => recovered(source_res().await?.spec_param(1), "git-revision")?,
                };
                let path = given(&overrides.git_path)
                    .unwrap_or(SourceLocator::DEFAULT_PATH)
                    .to_owned();
                SourceLocator::Git {
                    url,
                    revision,
                    path,
                }
            }
        };

        let image = match given(&overrides.image) {
            Some(image) => image.to_owned(),
            None => {
                // a tagged build leaves the tag in the url; the annotation keeps the target
                let saved = image_res().await?;
                let target = saved
                    .annotation(TARGET_IMAGE_ANNOTATION)
                    .filter(|image| !image.is_empty())
                    .or_else(|| saved.spec_param(0));
                recovered(target, "image")?
            }
        };

        Ok(BuildIntent::new(
            name,
            namespace,
            builder,
            source,
            image,
            service_account,
        )?)
    }

    async fn cached<'c>(
        &self,
        cell: &'c OnceCell<DeclarativeResource>,
        kind: ResourceKind,
        name: &str,
    ) -> Result<&'c DeclarativeResource, RedeployError> {
        cell.get_or_try_init(|| self.fetch(kind, name)).await
    }

    async fn fetch(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Result<DeclarativeResource, RedeployError> {
        self.store
            .get_resource(kind, name)
            .await?
            .ok_or_else(|| RedeployError::MissingResource {
                kind,
                name: name.to_owned(),
            })
    }
}

fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn recovered(value: Option<&str>, flag: &'static str) -> Result<String, RedeployError> {
    value
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(RedeployError::MissingFlag { flag })
}
