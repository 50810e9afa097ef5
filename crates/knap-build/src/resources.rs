//! Source and output-image resources reconciled before each build.

use knap_core::{BuildConfig, BuildIntent, DeclarativeResource, ResourceKind, SourceLocator};
use serde_json::{Value, json};

/// Image resource label recording the builder, read back by `knap redeploy`.
pub const BUILDER_LABEL: &str = "builder";
/// Image resource label recording the service account.
pub const SERVICE_ACCOUNT_LABEL: &str = "serviceaccount";
/// Image resource annotation recording the inline code locator.
pub const INLINE_CODE_ANNOTATION: &str = "file";
/// Image resource annotation recording the untagged target image.
pub const TARGET_IMAGE_ANNOTATION: &str = "image";

pub fn git_source_spec(url: &str, revision: &str) -> Value {
    json!({
        "type": "git",
        "params": [
            {"name": "url", "value": url},
            {"name": "revision", "value": revision},
        ],
    })
}

pub fn image_output_spec(image: &str) -> Value {
    json!({
        "type": "image",
        "params": [
            {"name": "url", "value": image},
        ],
    })
}

/// The `<name>-git` source resource. Inline builds check out the runtime repository.
pub fn source_resource(intent: &BuildIntent, build: &BuildConfig) -> DeclarativeResource {
    let spec = match intent.source() {
        SourceLocator::Git { url, revision, .. } => git_source_spec(url, revision),
        SourceLocator::Inline { .. } => {
            git_source_spec(&build.runtime_repo_url, &build.runtime_repo_revision)
        }
    };

    DeclarativeResource::new(
        ResourceKind::Source,
        intent.source_resource_name(),
        intent.namespace(),
        spec,
    )
}

/// The `<name>-image` output resource pushing to `image_url`, labelled so a
/// later redeploy can recover the builder, service account, target image
/// and inline code.
///
/// `image_url` is the intent's target image, with a tag appended when the
/// build tags images.
pub fn image_resource(intent: &BuildIntent, image_url: &str) -> DeclarativeResource {
    let resource = DeclarativeResource::new(
        ResourceKind::Image,
        intent.image_resource_name(),
        intent.namespace(),
        image_output_spec(image_url),
    )
    .with_label(BUILDER_LABEL, intent.builder())
    .with_label(SERVICE_ACCOUNT_LABEL, intent.service_account())
    .with_annotation(TARGET_IMAGE_ANNOTATION, intent.target_image());

    match intent.source().inline_code() {
        Some(code) => resource.with_annotation(INLINE_CODE_ANNOTATION, code),
        None => resource,
    }
}
