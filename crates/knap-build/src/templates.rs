//! Default builder shipped with knap.
//!
//! `knap builder install` reconciles [`source_to_image_task`] so a cluster
//! without a pre-installed builder can run `--builder build-to-image`. The
//! matching run is produced by the `build-to-image` row of the dispatch table.

use knap_core::{DeclarativeResource, ResourceKind};
use serde_json::json;

use crate::dispatch::SOURCE_TO_IMAGE_BUILDER;

const KANIKO_EXECUTOR_IMAGE: &str = "gcr.io/kaniko-project/executor";

/// Single-step kaniko task building `git-source` into `imageUrl:imageTag`.
pub fn source_to_image_task(namespace: &str) -> DeclarativeResource {
    let spec = json!({
        "inputs": {
            "resources": [
                {"name": "git-source", "type": "git"}
            ],
            "params": [
                {
                    "name": "pathToContext",
                    "description": "The path to the build context, used by Kaniko - within the workspace",
                    "default": "."
                },
                {
                    "name": "pathToDockerFile",
                    "description": "The path to the dockerfile to build (relative to the context)",
                    "default": "Dockerfile"
                },
                {
                    "name": "imageUrl",
                    "description": "Url of image repository"
                },
                {
                    "name": "imageTag",
                    "description": "Tag to apply to the built image",
                    "default": "latest"
                }
            ]
        },
        "steps": [
            {
                "name": "build-and-push",
                "image": KANIKO_EXECUTOR_IMAGE,
                "command": ["/kaniko/executor"],
                "args": [
                    "--dockerfile=${inputs.params.pathToDockerFile}",
                    "--destination=${inputs.params.imageUrl}:${inputs.params.imageTag}",
                    "--context=/workspace/git-source/${inputs.params.pathToContext}"
                ]
            }
        ]
    });

    DeclarativeResource::new(ResourceKind::Task, SOURCE_TO_IMAGE_BUILDER, namespace, spec)
}
