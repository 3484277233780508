// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tub_adapters::FakeCrontab;
use tub_storage::MemoryStore;

const JOB: &str = "heat-target-0123456789ab";

#[derive(Clone)]
struct FakeCallback {
    response: Result<HttpResponse, String>,
    calls: Arc<Mutex<Vec<JobDescriptor>>>,
}

impl FakeCallback {
    fn responding(status: u16, body: &str) -> Self {
        Self {
            response: Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
            calls: Arc::default(),
        }
    }

    fn unreachable() -> Self {
        Self {
            response: Err("connection refused".to_string()),
            calls: Arc::default(),
        }
    }

    fn calls(&self) -> Vec<JobDescriptor> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Callback for FakeCallback {
    async fn call(&self, descriptor: &JobDescriptor) -> Result<HttpResponse, ClientError> {
        self.calls.lock().unwrap().push(descriptor.clone());
        self.response.clone().map_err(|message| ClientError::Unreachable {
            url: descriptor.url(),
            message,
        })
    }
}

fn descriptor(token: &str) -> JobDescriptor {
    let now = Utc::now();
    JobDescriptor {
        job_id: JobId::parse(JOB).unwrap(),
        method: "POST".to_string(),
        base_url: "http://127.0.0.1:8080".to_string(),
        endpoint: "/api/heat-to-target/check".to_string(),
        params: BTreeMap::new(),
        auth_token: token.to_string(),
        created_at: now,
        fires_at: now,
    }
}

fn scheduled(token: &str) -> (FakeCrontab, MemoryStore) {
    let crontab = FakeCrontab::new()
        .with_line("0 * * * * backup.sh")
        .with_line(&format!("19 14 25 1 * tub job run {JOB} # {JOB}"));
    let store = MemoryStore::new();
    store.write_descriptor(&descriptor(token)).unwrap();
    (crontab, store)
}

#[tokio::test]
async fn successful_run_calls_back_and_cleans_up() {
    let (crontab, store) = scheduled("secret");
    let callback = FakeCallback::responding(200, r#"{"active":true}"#);

    let run = run_job(JOB, &crontab, &store, &callback).await.unwrap();

    assert_eq!(run.status, 200);
    assert_eq!(run.lines_removed, 1);
    let calls = callback.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].authorization(), "Bearer secret");
    assert!(store.descriptors().is_empty());
    assert_eq!(crontab.lines(), vec!["0 * * * * backup.sh".to_string()]);
}

#[tokio::test]
async fn rejected_callback_still_cleans_up() {
    let (crontab, store) = scheduled("stale");
    let callback = FakeCallback::responding(401, r#"{"error":"invalid or missing token"}"#);

    let err = run_job(JOB, &crontab, &store, &callback).await.unwrap_err();

    assert!(matches!(err, RunError::Rejected { status: 401, .. }));
    assert!(err.to_string().contains("invalid or missing token"));
    assert!(store.descriptors().is_empty());
    assert!(crontab.matching(JOB).is_empty());
}

#[tokio::test]
async fn unreachable_daemon_still_cleans_up() {
    let (crontab, store) = scheduled("secret");
    let callback = FakeCallback::unreachable();

    let err = run_job(JOB, &crontab, &store, &callback).await.unwrap_err();

    assert!(matches!(err, RunError::Callback(_)));
    assert!(store.descriptors().is_empty());
    assert!(crontab.matching(JOB).is_empty());
}

#[tokio::test]
async fn descriptor_without_credential_is_never_sent() {
    let (crontab, store) = scheduled("  ");
    let callback = FakeCallback::responding(200, "{}");

    let err = run_job(JOB, &crontab, &store, &callback).await.unwrap_err();

    assert!(matches!(err, RunError::MissingCredential(_)));
    assert!(callback.calls().is_empty());
    assert!(store.descriptors().is_empty());
    assert!(crontab.matching(JOB).is_empty());
}

#[tokio::test]
async fn missing_descriptor_removes_orphan_line() {
    let crontab =
        FakeCrontab::new().with_line(&format!("19 14 25 1 * tub job run {JOB} # {JOB}"));
    let store = MemoryStore::new();
    let callback = FakeCallback::responding(200, "{}");

    let err = run_job(JOB, &crontab, &store, &callback).await.unwrap_err();

    assert!(matches!(err, RunError::DescriptorMissing(_)));
    assert!(callback.calls().is_empty());
    assert!(crontab.lines().is_empty());
}

#[tokio::test]
async fn untagged_job_id_touches_nothing() {
    let (crontab, store) = scheduled("secret");
    let callback = FakeCallback::responding(200, "{}");

    let err = run_job("backup", &crontab, &store, &callback)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::InvalidJobId(_)));
    assert_eq!(crontab.removals(), 0);
    assert_eq!(crontab.lines().len(), 2);
    assert_eq!(store.descriptors().len(), 1);
}

#[tokio::test]
async fn crontab_failure_does_not_mask_callback_result() {
    let (crontab, store) = scheduled("secret");
    crontab.set_fail_remove(true);
    let callback = FakeCallback::responding(200, "{}");

    let run = run_job(JOB, &crontab, &store, &callback).await.unwrap();

    assert_eq!(run.status, 200);
    assert_eq!(run.lines_removed, 0);
    assert!(store.descriptors().is_empty());
}

#[test]
fn listing_hides_credentials() {
    let store = MemoryStore::new();
    store.write_descriptor(&descriptor("secret")).unwrap();

    let summaries = list_descriptors(&store).unwrap();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].url, "http://127.0.0.1:8080/api/heat-to-target/check");
    assert!(summaries[0].has_credential);
    let json = serde_json::to_string(&summaries).unwrap();
    assert!(!json.contains("secret"));
}
