//! End-to-end tests for `TaskRunner`: submission, execution, webhook.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use common::{harness, spawn_hooks};
use imgedit_core::conversation::SessionRequest;
use imgedit_core::error::CoreError;
use imgedit_core::gem::Gem;
use imgedit_core::model::Model;
use imgedit_core::task::{TaskData, TaskStatus};

fn request(prompt: &str) -> SessionRequest {
    SessionRequest {
        prompt: prompt.into(),
        image_urls: vec![],
        model: Model::Unspecified,
        gem: Gem::Unset,
    }
}

// ---------------------------------------------------------------------------
// Test: a successful task completes and notifies once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_task_completes_and_notifies_once() {
    let (hook_url, hooks) = spawn_hooks().await;
    let h = harness(2, 8);

    let task = h
        .runner
        .submit(request("describe cat"), hook_url)
        .await
        .unwrap();
    assert_eq!(task.data.status, TaskStatus::Pending);

    let received = hooks.wait_for(1).await;
    assert_eq!(received[0]["task_id"], task.id.as_str());
    assert_eq!(received[0]["status"], "completed");
    assert_eq!(received[0]["result"]["text"], "echo: describe cat");
    assert!(received[0].get("error").is_none());

    let stored = h.runner.get(&task.id).await.unwrap();
    assert_eq!(stored.data.status, TaskStatus::Completed);
    let result = stored.data.result.unwrap();
    assert_eq!(serde_json::to_value(&result).unwrap(), received[0]["result"]);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(hooks.received.lock().await.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: an engine failure fails the task with a descriptive message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn engine_failure_fails_task_with_description() {
    let (hook_url, hooks) = spawn_hooks().await;
    let h = harness(1, 8);

    let task = h.runner.submit(request("quota"), hook_url).await.unwrap();

    let received = hooks.wait_for(1).await;
    assert_eq!(received[0]["status"], "failed");
    assert_eq!(received[0]["error"], "Usage limit exceeded: daily cap reached");
    assert!(received[0].get("result").is_none());

    let stored = h.tasks.get(&task.id).await.unwrap();
    assert_eq!(stored.data.status, TaskStatus::Failed);
    assert_eq!(
        stored.data.error.as_deref(),
        Some("Usage limit exceeded: daily cap reached")
    );
}

// ---------------------------------------------------------------------------
// Test: a running task reads as processing before its terminal status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn running_task_reads_as_processing_until_it_finishes() {
    let (hook_url, hooks) = spawn_hooks().await;
    let h = harness(1, 8);

    let task = h.runner.submit(request("block"), hook_url).await.unwrap();
    h.engine.wait_for_calls(1).await;

    let running = h.runner.get(&task.id).await.unwrap();
    assert_eq!(running.data.status, TaskStatus::Processing);
    assert!(running.data.result.is_none());
    assert!(running.data.error.is_none());

    h.engine.gate.add_permits(1);
    let received = hooks.wait_for(1).await;
    assert_eq!(received[0]["status"], "completed");
    assert_eq!(
        h.runner.get(&task.id).await.unwrap().data.status,
        TaskStatus::Completed
    );
}

// ---------------------------------------------------------------------------
// Test: run_task drives a stored task once and leaves finished ones alone
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_task_executes_stored_task_exactly_once() {
    let (hook_url, hooks) = spawn_hooks().await;
    let h = harness(1, 8);
    h.tasks
        .create("direct", TaskData::pending(request("direct"), hook_url))
        .await
        .unwrap();

    h.runner.run_task("direct").await;

    let finished = h.runner.get("direct").await.unwrap();
    assert_eq!(finished.data.status, TaskStatus::Completed);
    assert_eq!(hooks.received.lock().await.len(), 1);

    h.runner.run_task("direct").await;

    assert_eq!(h.runner.get("direct").await.unwrap(), finished);
    assert_eq!(h.engine.calls.lock().await.len(), 1);
    assert_eq!(hooks.received.lock().await.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: a panicking turn fails the task and the worker survives
// ---------------------------------------------------------------------------

#[tokio::test]
async fn panic_fails_task_and_worker_keeps_running() {
    let (hook_url, hooks) = spawn_hooks().await;
    let h = harness(1, 8);

    let crashed = h.runner.submit(request("panic"), hook_url.clone()).await.unwrap();
    let next = h.runner.submit(request("hello"), hook_url).await.unwrap();

    let received = hooks.wait_for(2).await;
    let crashed_hook = received.iter().find(|v| v["task_id"] == crashed.id.as_str()).unwrap();
    assert_eq!(crashed_hook["status"], "failed");
    assert_eq!(crashed_hook["error"], "Internal error while processing task");

    let next_hook = received.iter().find(|v| v["task_id"] == next.id.as_str()).unwrap();
    assert_eq!(next_hook["status"], "completed");
}

// ---------------------------------------------------------------------------
// Test: a full queue rejects submissions without creating a task
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_queue_rejects_with_overloaded() {
    let (hook_url, hooks) = spawn_hooks().await;
    let h = harness(1, 1);

    // Occupy the only worker.
    h.runner.submit(request("block"), hook_url.clone()).await.unwrap();
    h.engine.wait_for_calls(1).await;

    // Fill the only queue slot.
    h.runner.submit(request("queued"), hook_url.clone()).await.unwrap();

    let rejected = h.runner.submit(request("rejected"), hook_url).await;
    assert_matches!(rejected, Err(CoreError::Overloaded(_)));
    assert_eq!(h.tasks.len().await, 2);

    h.engine.gate.add_permits(1);
    let received = hooks.wait_for(2).await;
    assert!(received.iter().all(|v| v["status"] == "completed"));
}

// ---------------------------------------------------------------------------
// Test: malformed submissions are rejected up front
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_submissions_create_no_task() {
    let h = harness(1, 8);

    let bad_hook = h.runner.submit(request("hi"), "ftp://x".into()).await;
    assert_matches!(bad_hook, Err(CoreError::InvalidInput(msg)) if msg.contains("webhook_url"));

    let blank = h
        .runner
        .submit(request("  "), "http://127.0.0.1:1/hook".into())
        .await;
    assert_matches!(blank, Err(CoreError::InvalidInput(_)));

    assert!(h.tasks.is_empty().await);
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let h = harness(1, 8);
    assert_matches!(
        h.runner.get("missing").await,
        Err(CoreError::NotFound { entity: "Task", .. })
    );
}

// ---------------------------------------------------------------------------
// Test: dropping the runner drains the queue and stops the workers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dropping_runner_drains_queue_then_stops_workers() {
    let (hook_url, hooks) = spawn_hooks().await;
    let h = harness(2, 8);

    for i in 0..4 {
        h.runner
            .submit(request(&format!("job {i}")), hook_url.clone())
            .await
            .unwrap();
    }
    drop(h.runner);

    for handle in h.handles {
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap();
    }
    assert_eq!(hooks.received.lock().await.len(), 4);
}
