mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use common::{MockStore, conflict, git_intent, poll_policy, running, succeeded};
use knap_build::{RunBuilder, resources};
use knap_cloud::{
    AbortSignal, BuildError, BuildOrchestrator, ReconcileAction, Reconciler, RunWatcher,
    WatchError, abort_pair, install_default_builder,
};
use knap_core::{
    BuildConfig, BuilderImages, DeclarativeResource, ParamValue, ResourceKind, RetryPolicy,
    RunKind, RunStatusSnapshot, TagMode,
};
use mockall::Sequence;

// ── Reconcile ──

#[tokio::test]
async fn reconcile_creates_missing_resource() {
    let mut store = MockStore::new();
    store
        .expect_resource_exists()
        .withf(|kind, name| *kind == ResourceKind::Source && name == "demo-git")
        .times(1)
        .returning(|_, _| Ok(false));
    store
        .expect_create_resource()
        .withf(|r| r.name == "demo-git" && r.concurrency_token().is_none())
        .times(1)
        .returning(|_| Ok(()));
    store.expect_update_resource().times(0);

    let desired = resources::source_resource(&git_intent("kaniko"), &BuildConfig::default());
    let action = Reconciler::new(&store, RetryPolicy::default())
        .reconcile(&desired)
        .await
        .unwrap();

    assert_eq!(action, ReconcileAction::Created);
}

#[tokio::test]
async fn reconcile_updates_with_observed_token() {
    let desired = resources::source_resource(&git_intent("kaniko"), &BuildConfig::default());
    let stored = desired.clone().observed(Some("42".to_owned()), Some(2));

    let mut store = MockStore::new();
    store.expect_resource_exists().returning(|_, _| Ok(true));
    store
        .expect_get_resource()
        .times(1)
        .returning(move |_, _| Ok(Some(stored.clone())));
    store
        .expect_update_resource()
        .withf(|r| r.concurrency_token() == Some("42") && r.spec["type"] == "git")
        .times(1)
        .returning(|_| Ok(()));
    store.expect_create_resource().times(0);

    let action = Reconciler::new(&store, RetryPolicy::default())
        .reconcile(&desired)
        .await
        .unwrap();

    assert_eq!(action, ReconcileAction::Updated);
}

#[tokio::test]
async fn reconcile_twice_creates_then_updates_from_fresh_token() {
    // a single stored object; every write bumps its version
    let stored: Arc<Mutex<Option<DeclarativeResource>>> = Arc::default();
    let update_tokens: Arc<Mutex<Vec<String>>> = Arc::default();

    let mut store = MockStore::new();
    let state = Arc::clone(&stored);
    store
        .expect_resource_exists()
        .returning(move |_, _| Ok(state.lock().unwrap().is_some()));
    let state = Arc::clone(&stored);
    store
        .expect_get_resource()
        .returning(move |_, _| Ok(state.lock().unwrap().clone()));
    let state = Arc::clone(&stored);
    store
        .expect_create_resource()
        .times(1)
        .returning(move |r| {
            *state.lock().unwrap() = Some(r.clone().observed(Some("1".to_owned()), Some(1)));
            Ok(())
        });
    let state = Arc::clone(&stored);
    let tokens = Arc::clone(&update_tokens);
    store
        .expect_update_resource()
        .times(1)
        .returning(move |r| {
            let mut current = state.lock().unwrap();
            let token = r.concurrency_token().unwrap_or_default().to_owned();
            let latest = current.as_ref().and_then(|c| c.concurrency_token());
            assert_eq!(latest, Some(token.as_str()));
            tokens.lock().unwrap().push(token);
            *current = Some(r.clone().observed(Some("2".to_owned()), Some(2)));
            Ok(())
        });

    let desired = resources::source_resource(&git_intent("kaniko"), &BuildConfig::default());
    let reconciler = Reconciler::new(&store, RetryPolicy::default());
    let first = reconciler.reconcile(&desired).await.unwrap();
    let second = reconciler.reconcile(&desired).await.unwrap();

    assert_eq!(first, ReconcileAction::Created);
    assert_eq!(second, ReconcileAction::Updated);
    assert_eq!(*update_tokens.lock().unwrap(), vec!["1".to_owned()]);
}

#[tokio::test]
async fn reconcile_retries_conflicts_with_fresh_reads() {
    let desired = resources::image_resource(&git_intent("kaniko"), "reg/demo");
    let reads = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&reads);
    let base = desired.clone();

    let mut store = MockStore::new();
    store.expect_resource_exists().returning(|_, _| Ok(true));
    store.expect_get_resource().times(3).returning(move |_, _| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(base.clone().observed(Some(format!("v{n}")), Some(1))))
    });

    let mut seq = Sequence::new();
    store
        .expect_update_resource()
        .withf(|r| r.concurrency_token() == Some("v0"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|r| Err(conflict("image", &r.name)));
    store
        .expect_update_resource()
        .withf(|r| r.concurrency_token() == Some("v1"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|r| Err(conflict("image", &r.name)));
    store
        .expect_update_resource()
        .withf(|r| r.concurrency_token() == Some("v2"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let action = Reconciler::new(&store, RetryPolicy::default())
        .reconcile(&desired)
        .await
        .unwrap();

    assert_eq!(action, ReconcileAction::Updated);
    assert_eq!(reads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn reconcile_gives_up_after_retry_budget() {
    let desired = resources::image_resource(&git_intent("kaniko"), "reg/demo");
    let stored = desired.clone().observed(Some("1".to_owned()), Some(1));

    let mut store = MockStore::new();
    store.expect_resource_exists().returning(|_, _| Ok(true));
    store
        .expect_get_resource()
        .returning(move |_, _| Ok(Some(stored.clone())));
    // 3 retries = 4 attempts
    store
        .expect_update_resource()
        .times(4)
        .returning(|r| Err(conflict("image", &r.name)));

    let err = Reconciler::new(&store, RetryPolicy { max_retries: 3 })
        .reconcile(&desired)
        .await
        .unwrap_err();

    assert!(err.is_conflict());
}

// ── Watch ──

#[tokio::test(start_paused = true)]
async fn watch_returns_on_first_success() {
    let mut store = MockStore::new();
    store
        .expect_create_run()
        .times(1)
        .returning(|_| Ok("demo-build-x7k2p".to_owned()));
    store
        .expect_get_run_status()
        .withf(|kind, name| *kind == RunKind::TaskRun && name == "demo-build-x7k2p")
        .times(1)
        .returning(|_, name| Ok(succeeded(name)));

    let run = RunBuilder::default()
        .build_embedded_run(&git_intent("kaniko"))
        .unwrap();
    let name = RunWatcher::new(&store, poll_policy(10))
        .start_and_watch(&run, &AbortSignal::never())
        .await
        .unwrap();

    assert_eq!(name, "demo-build-x7k2p");
}

#[tokio::test(start_paused = true)]
async fn watch_times_out_before_late_success() {
    let polls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&polls);

    let mut store = MockStore::new();
    store
        .expect_create_run()
        .returning(|_| Ok("demo-build-late".to_owned()));
    store.expect_get_run_status().returning(move |_, name| {
        // Success only arrives on the third poll.
        if counter.fetch_add(1, Ordering::SeqCst) >= 2 {
            Ok(succeeded(name))
        } else {
            Ok(running(name))
        }
    });

    let run = RunBuilder::default()
        .build_embedded_run(&git_intent("kaniko"))
        .unwrap();
    let err = RunWatcher::new(&store, poll_policy(2))
        .start_and_watch(&run, &AbortSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, WatchError::Timeout { polls: 2, .. }));
    assert_eq!(polls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn watch_fails_when_no_condition_reported() {
    let mut store = MockStore::new();
    store
        .expect_create_run()
        .returning(|_| Ok("demo-build-empty".to_owned()));
    store.expect_get_run_status().times(1).returning(|_, name| {
        Ok(RunStatusSnapshot {
            name: name.to_owned(),
            conditions: vec![],
        })
    });

    let run = RunBuilder::default()
        .build_embedded_run(&git_intent("kaniko"))
        .unwrap();
    let err = RunWatcher::new(&store, poll_policy(10))
        .start_and_watch(&run, &AbortSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(err, WatchError::NoConditionReported { .. }));
}

#[tokio::test(start_paused = true)]
async fn watch_stops_when_aborted() {
    let mut store = MockStore::new();
    store
        .expect_create_run()
        .times(1)
        .returning(|_| Ok("demo-build-stop".to_owned()));
    store.expect_get_run_status().times(0);

    let (handle, signal) = abort_pair();
    handle.abort();

    let run = RunBuilder::default()
        .build_embedded_run(&git_intent("kaniko"))
        .unwrap();
    let err = RunWatcher::new(&store, poll_policy(10))
        .start_and_watch(&run, &signal)
        .await
        .unwrap_err();

    assert!(matches!(err, WatchError::Cancelled { .. }));
}

// ── Orchestrator ──

fn expect_fresh_namespace(store: &mut MockStore, image_url: &'static str) {
    store
        .expect_resource_exists()
        .withf(|kind, name| *kind == ResourceKind::Task && name == "kaniko")
        .times(1)
        .returning(|_, _| Ok(true));
    store
        .expect_resource_exists()
        .withf(|kind, _| matches!(kind, ResourceKind::Source | ResourceKind::Image))
        .times(2)
        .returning(|_, _| Ok(false));
    store
        .expect_create_resource()
        .withf(|r| {
            r.kind == ResourceKind::Source
                && r.name == "demo-git"
                && r.spec_param(0) == Some("https://github.com/example/demo")
        })
        .times(1)
        .returning(|_| Ok(()));
    store
        .expect_create_resource()
        .withf(|r| {
            r.kind == ResourceKind::Image
                && r.name == "demo-image"
                && r.spec_param(0) == Some(image_url)
                && r.label("builder") == Some("kaniko")
                && r.annotation("image") == Some("reg/demo")
        })
        .times(1)
        .returning(|_| Ok(()));
    store
        .expect_create_run()
        .withf(|run| {
            run.kind == RunKind::TaskRun
                && run.generated_name_prefix == "demo-build-"
                && run.param("BUILDER_IMAGE").and_then(ParamValue::as_str)
                    == Some(BuilderImages::default().kaniko_image.as_str())
        })
        .times(1)
        .returning(|_| Ok("demo-build-q8z4w".to_owned()));
    store
        .expect_get_run_status()
        .times(1)
        .returning(|_, name| Ok(succeeded(name)));
}

#[tokio::test(start_paused = true)]
async fn build_end_to_end_returns_image_as_given() {
    let mut store = MockStore::new();
    expect_fresh_namespace(&mut store, "reg/demo");

    let orchestrator =
        BuildOrchestrator::new(&store, RunBuilder::default(), BuildConfig::default());
    let image = orchestrator
        .build(&git_intent("kaniko"), &AbortSignal::never())
        .await
        .unwrap();

    assert_eq!(image, "reg/demo");
}

#[tokio::test(start_paused = true)]
async fn build_in_generation_mode_pushes_the_returned_tag() {
    let mut store = MockStore::new();
    expect_fresh_namespace(&mut store, "reg/demo:3.0");
    let stored = resources::source_resource(&git_intent("kaniko"), &BuildConfig::default())
        .observed(Some("811".to_owned()), Some(3));
    store
        .expect_get_resource()
        .withf(|kind, name| *kind == ResourceKind::Source && name == "demo-git")
        .times(1)
        .returning(move |_, _| Ok(Some(stored.clone())));

    let config = BuildConfig {
        tag_mode: TagMode::Generation,
        ..BuildConfig::default()
    };
    let image = BuildOrchestrator::new(&store, RunBuilder::default(), config)
        .build(&git_intent("kaniko"), &AbortSignal::never())
        .await
        .unwrap();

    assert_eq!(image, "reg/demo:3.0");
}

#[tokio::test(start_paused = true)]
async fn build_fails_fast_without_builder() {
    let mut store = MockStore::new();
    store
        .expect_resource_exists()
        .withf(|kind, name| *kind == ResourceKind::Task && name == "kaniko")
        .times(1)
        .returning(|_, _| Ok(false));
    store.expect_create_resource().times(0);
    store.expect_create_run().times(0);

    let err = BuildOrchestrator::new(&store, RunBuilder::default(), BuildConfig::default())
        .build(&git_intent("kaniko"), &AbortSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::BuilderNotFound {
            kind: ResourceKind::Task,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn pipeline_builders_are_looked_up_as_pipelines() {
    let mut store = MockStore::new();
    store
        .expect_resource_exists()
        .withf(|kind, name| *kind == ResourceKind::Pipeline && name == "build-openwhisk-app")
        .times(1)
        .returning(|_, _| Ok(false));

    let err = BuildOrchestrator::new(&store, RunBuilder::default(), BuildConfig::default())
        .build(&git_intent("build-openwhisk-app"), &AbortSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::BuilderNotFound {
            kind: ResourceKind::Pipeline,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn embedded_build_skips_resources() {
    let mut store = MockStore::new();
    store
        .expect_resource_exists()
        .withf(|kind, name| *kind == ResourceKind::Task && name == "kaniko")
        .times(1)
        .returning(|_, _| Ok(true));
    store.expect_create_resource().times(0);
    store
        .expect_create_run()
        .withf(|run| {
            run.generated_name_prefix == "demo-"
                && run.input_resources[0].resource_name().is_none()
        })
        .times(1)
        .returning(|_| Ok("demo-h2v9c".to_owned()));
    store
        .expect_get_run_status()
        .times(1)
        .returning(|_, name| Ok(succeeded(name)));

    let config = BuildConfig {
        tag_mode: TagMode::Generation,
        ..BuildConfig::default()
    };
    let image = BuildOrchestrator::new(&store, RunBuilder::default(), config)
        .build_embedded(&git_intent("kaniko"), &AbortSignal::never())
        .await
        .unwrap();

    assert_eq!(image, "reg/demo");
}

#[tokio::test]
async fn installs_default_builder_task() {
    let mut store = MockStore::new();
    store
        .expect_resource_exists()
        .withf(|kind, name| *kind == ResourceKind::Task && name == "build-to-image")
        .returning(|_, _| Ok(false));
    store
        .expect_create_resource()
        .withf(|r| r.namespace == "tekton-builds" && r.kind == ResourceKind::Task)
        .times(1)
        .returning(|_| Ok(()));

    let (task, action) =
        install_default_builder(&store, "tekton-builds", RetryPolicy::default())
            .await
            .unwrap();

    assert_eq!(task.name, "build-to-image");
    assert_eq!(action, ReconcileAction::Created);
}
