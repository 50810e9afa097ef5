//! Build-run construction for knap.
//!
//! # Build pipeline
//!
//! ```text
//! knap build
//!   1. Builder check ── Task or Pipeline named by --builder must exist
//!   2. Source        ── <name>-git resource (git URL or runtime repo)
//!   3. Image         ── <name>-image resource (labels: builder, serviceaccount)
//!   4. Run           ── RunBuilder::build_run() → TaskRun | PipelineRun
//!   5. Watch         ── poll conditions[0] until Succeeded/True or timeout
//! ```
//!
//! # Builder dispatch
//!
//! | builder               | run         | builder image          |
//! |-----------------------|-------------|------------------------|
//! | `buildpacks-v3`       | TaskRun     | `[builders].buildpacks_image` |
//! | `kaniko`              | TaskRun     | `[builders].kaniko_image`     |
//! | `build-openwhisk-app` | PipelineRun | defined by the pipeline       |
//! | `build-to-image`      | TaskRun     | defined by the embedded task  |
//! | inline code (any)     | TaskRun     | defined by the task           |

pub mod dispatch;
pub mod resources;
pub mod run;
pub mod source;
pub mod templates;

pub use dispatch::{BuilderKind, BuilderProfile};
pub use run::{RunBuildError, RunBuilder, RunRefs};
pub use source::{SourceError, SourceResolver};
