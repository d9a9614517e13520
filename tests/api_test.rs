//! HTTP API integration tests.
//!
//! Drives the full stack over a real socket: multipart submission, status
//! polling, artifact download, and the error-to-status mapping.

mod common;

use common::TestHarness;

use std::time::Duration;

fn multipart_form(filename: &str, content: &[u8], mode: Option<&str>) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(content.to_vec()).file_name(filename.to_string());
    let mut form = reqwest::multipart::Form::new().part("file", part);
    if let Some(mode) = mode {
        form = form.text("mode", mode.to_string());
    }
    form
}

async fn submit(
    client: &reqwest::Client,
    base: &str,
    filename: &str,
    content: &[u8],
    mode: Option<&str>,
) -> reqwest::Response {
    client
        .post(format!("{base}/jobs"))
        .multipart(multipart_form(filename, content, mode))
        .send()
        .await
        .unwrap()
}

async fn poll_until_status(
    client: &reqwest::Client,
    base: &str,
    job_id: &str,
    wanted: &str,
) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let resp = client
            .get(format!("{base}/jobs/{job_id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let job: serde_json::Value = resp.json().await.unwrap();
        if job["status"] == wanted {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {job_id} stuck at {}, wanted {wanted}",
            job["status"]
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_endpoint_responds() {
    let (_harness, addr) = TestHarness::with_server(1).await;
    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
}

// ---------------------------------------------------------------------------
// Submit -> poll -> download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_poll_download_round_trip() {
    let (_harness, addr) = TestHarness::with_server(2).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api");

    // Submit.
    let resp = submit(&client, &base, "CoA.md", b"# Certificate\n", Some("fast")).await;
    assert_eq!(resp.status(), 202);
    let body: serde_json::Value = resp.json().await.unwrap();
    let job_id = body["job_id"].as_str().unwrap().to_string();

    // Immediately queryable; queued or already past it, never 404.
    let resp = client
        .get(format!("{base}/jobs/{job_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let job: serde_json::Value = resp.json().await.unwrap();
    assert!(["queued", "processing", "completed"]
        .contains(&job["status"].as_str().unwrap()));
    assert_eq!(job["filename"], "CoA.md");
    assert_eq!(job["params"]["mode"], "fast");

    // Poll to completion.
    let done = poll_until_status(&client, &base, &job_id, "completed").await;
    assert!(done["error"].is_null());

    // Download the artifact.
    let resp = client
        .get(format!("{base}/jobs/{job_id}/result"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/markdown"));
    assert!(resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("CoA.md"));
    assert_eq!(resp.bytes().await.unwrap().to_vec(), b"# Certificate\n");
}

// ---------------------------------------------------------------------------
// Mode handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_mode_is_rejected_without_creating_a_job() {
    let (_harness, addr) = TestHarness::with_server(1).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api");

    let resp = submit(&client, &base, "doc.pdf", b"%PDF", Some("unsupported")).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("unsupported conversion mode"));

    // No job record was left behind.
    let resp = client.get(format!("{base}/jobs")).send().await.unwrap();
    let jobs: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(jobs.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unconfigured_cloud_mode_is_rejected() {
    // The test harness registers no cloud endpoint.
    let (_harness, addr) = TestHarness::with_server(1).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api");

    let resp = submit(&client, &base, "doc.pdf", b"%PDF", Some("cloud")).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn mode_defaults_to_fast() {
    let (_harness, addr) = TestHarness::with_server(1).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api");

    let resp = submit(&client, &base, "notes.md", b"hi", None).await;
    assert_eq!(resp.status(), 202);
    let body: serde_json::Value = resp.json().await.unwrap();
    let job_id = body["job_id"].as_str().unwrap();

    let job = poll_until_status(&client, &base, job_id, "completed").await;
    assert_eq!(job["params"]["mode"], "fast");
}

// ---------------------------------------------------------------------------
// Error-to-status mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_job_id_is_404_everywhere() {
    let (_harness, addr) = TestHarness::with_server(1).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api");
    let ghost = uuid::Uuid::new_v4();

    let resp = client
        .get(format!("{base}/jobs/{ghost}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .get(format!("{base}/jobs/{ghost}/result"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn result_for_queued_job_is_425() {
    // Zero workers: submissions stay queued.
    let (_harness, addr) = TestHarness::with_server(0).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api");

    let resp = submit(&client, &base, "doc.md", b"x", Some("fast")).await;
    let body: serde_json::Value = resp.json().await.unwrap();
    let job_id = body["job_id"].as_str().unwrap();

    let resp = client
        .get(format!("{base}/jobs/{job_id}/result"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 425);
}

#[tokio::test]
async fn result_for_failed_job_is_409_with_stored_error() {
    let (_harness, addr) = TestHarness::with_server(1).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api");

    // A binary upload in fast mode fails conversion.
    let resp = submit(&client, &base, "image.png", &[0x89, 0x50], Some("fast")).await;
    let body: serde_json::Value = resp.json().await.unwrap();
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let failed = poll_until_status(&client, &base, &job_id, "failed").await;
    assert!(failed["error"].as_str().unwrap().contains("fast mode"));

    let resp = client
        .get(format!("{base}/jobs/{job_id}/result"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("fast mode"));
}

#[tokio::test]
async fn missing_file_field_is_400() {
    let (_harness, addr) = TestHarness::with_server(1).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api");

    let form = reqwest::multipart::Form::new().text("mode", "fast");
    let resp = client
        .post(format!("{base}/jobs"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

// ---------------------------------------------------------------------------
// Listing and deletion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_jobs_paginates_newest_first() {
    let (_harness, addr) = TestHarness::with_server(1).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api");

    for i in 0..3 {
        submit(&client, &base, &format!("doc-{i}.md"), b"x", Some("fast")).await;
    }

    let resp = client
        .get(format!("{base}/jobs?limit=2"))
        .send()
        .await
        .unwrap();
    let jobs: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(jobs.as_array().unwrap().len(), 2);

    let resp = client
        .get(format!("{base}/jobs?page=1&limit=2"))
        .send()
        .await
        .unwrap();
    let jobs: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(jobs.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_job_is_idempotent() {
    let (_harness, addr) = TestHarness::with_server(1).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api");

    let resp = submit(&client, &base, "doc.md", b"x", Some("fast")).await;
    let body: serde_json::Value = resp.json().await.unwrap();
    let job_id = body["job_id"].as_str().unwrap().to_string();
    poll_until_status(&client, &base, &job_id, "completed").await;

    let resp = client
        .delete(format!("{base}/jobs/{job_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    // The record and its artifact are gone.
    let resp = client
        .get(format!("{base}/jobs/{job_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Deleting again is still a success.
    let resp = client
        .delete(format!("{base}/jobs/{job_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
}
