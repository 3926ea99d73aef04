//! End-to-end handler tests over in-memory fakes: real routing, real auth
//! gate, real attachment validation, no SQLite or SMTP.

use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::Duration;
use mb_api::handlers::AppState;
use mb_core::error::{AppError, Result};
use mb_core::models::{Admin, ModerationStatus, Submission, SubmissionBody};
use mb_core::traits::{AdminRepo, AuthProvider, Notifier, SubmissionRepo};
use mb_auth_jwt::JwtAuthProvider;
use mb_storage_local::MemoryAttachmentStore;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ── Fakes ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct InMemoryRepo {
    submissions: Mutex<Vec<Submission>>,
    admins: Mutex<Vec<Admin>>,
}

#[async_trait]
impl SubmissionRepo for InMemoryRepo {
    async fn create(&self, submission: &Submission) -> Result<()> {
        self.submissions.lock().unwrap().push(submission.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Submission>> {
        Ok(self
            .submissions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn list_by_status(&self, status: ModerationStatus) -> Result<Vec<Submission>> {
        let mut matches: Vec<Submission> = self
            .submissions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.status == status)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ModerationStatus,
    ) -> Result<Option<Submission>> {
        let mut submissions = self.submissions.lock().unwrap();
        match submissions.iter_mut().find(|s| s.id == id) {
            Some(submission) => {
                submission.status = status;
                Ok(Some(submission.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut submissions = self.submissions.lock().unwrap();
        let before = submissions.len();
        submissions.retain(|s| s.id != id);
        Ok(submissions.len() < before)
    }
}

#[async_trait]
impl AdminRepo for InMemoryRepo {
    async fn create(&self, admin: &Admin) -> Result<()> {
        let mut admins = self.admins.lock().unwrap();
        if admins
            .iter()
            .any(|a| a.username == admin.username || a.email == admin.email)
        {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }
        admins.push(admin.clone());
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>> {
        Ok(self
            .admins
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }
}

struct CapturingNotifier {
    events: Mutex<Vec<String>>,
    fail: bool,
}

impl CapturingNotifier {
    fn new(fail: bool) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail,
        }
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn submission_received(&self, submission: &Submission) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(format!("received:{}", submission.id));
        if self.fail {
            anyhow::bail!("smtp down");
        }
        Ok(())
    }

    async fn decision(&self, submission: &Submission) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(format!(
            "decision:{}:{}",
            submission.id,
            submission.status.as_str()
        ));
        if self.fail {
            anyhow::bail!("smtp down");
        }
        Ok(())
    }
}

// ── Harness ─────────────────────────────────────────────────────────────────

struct Harness {
    state: web::Data<AppState>,
    repo: Arc<InMemoryRepo>,
    notifier: Arc<CapturingNotifier>,
    auth: Arc<JwtAuthProvider>,
}

fn harness(fail_notify: bool) -> Harness {
    let repo = Arc::new(InMemoryRepo::default());
    let notifier = Arc::new(CapturingNotifier::new(fail_notify));
    let auth = Arc::new(JwtAuthProvider::new("test-secret"));
    let state = web::Data::new(AppState {
        repo: repo.clone(),
        admins: repo.clone(),
        auth: auth.clone(),
        store: Arc::new(MemoryAttachmentStore),
        notifier: notifier.clone(),
    });
    Harness {
        state,
        repo,
        notifier,
        auth,
    }
}

macro_rules! app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .app_data($harness.state.clone())
                .configure(mb_api::configure_routes),
        )
        .await
    };
}

fn bearer(harness: &Harness) -> String {
    format!("Bearer {}", harness.auth.issue_token(Uuid::now_v7()).unwrap())
}

const BOUNDARY: &str = "----modboard-test-boundary";

fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn submit_request(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/submissions")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body(fields, file))
}

fn post_fields<'a>() -> Vec<(&'a str, &'a str)> {
    vec![
        ("kind", "post"),
        ("author", "A"),
        ("email", "a@b.com"),
        ("title", "T"),
        ("content", "C"),
    ]
}

/// Booking intake fields, deliberately using the camelCase aliases for the
/// time and faculty slots and repeating the list fields.
fn booking_fields<'a>() -> Vec<(&'a str, &'a str)> {
    vec![
        ("kind", "booking"),
        ("name", "Ada"),
        ("email", "ada@example.com"),
        ("lab", "Chemistry"),
        ("date", "2025-03-01"),
        ("startTime", "09:00"),
        ("endTime", "11:00"),
        ("selectedFaculty", "Dr. Hall"),
        ("faculty", "Dr. Jones"),
        ("equipment", "Centrifuge"),
        ("equipment", "Bunsen burner"),
    ]
}

fn stored_booking(age_seconds: i64) -> Submission {
    let mut submission = Submission::new(
        "Ada".to_string(),
        "ada@example.com".to_string(),
        SubmissionBody::Booking {
            lab: "Chemistry".to_string(),
            date: "2025-03-01".to_string(),
            start_time: "09:00".to_string(),
            end_time: "11:00".to_string(),
            faculty: vec!["Dr. Hall".to_string()],
            equipment: vec!["Centrifuge".to_string()],
        },
        None,
    );
    submission.created_at -= Duration::seconds(age_seconds);
    submission
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[actix_web::test]
async fn submit_then_get_returns_pending_record() {
    let harness = harness(false);
    let app = app!(harness);

    let resp = test::call_service(&app, submit_request(&post_fields(), None).to_request()).await;
    assert_eq!(resp.status(), 201);
    let created: Value = test::read_body_json(resp).await;
    let id = created["submission"]["id"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/submissions/{id}"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let fetched: Value = test::read_body_json(resp).await;
    assert_eq!(fetched["status"], "pending");
    assert_eq!(fetched["title"], "T");
    assert_eq!(fetched["content"], "C");
    assert_eq!(fetched["name"], "A");
    assert_eq!(fetched["email"], "a@b.com");
    assert!(fetched["attachment"].is_null());
}

#[actix_web::test]
async fn booking_submission_accepts_aliases_and_repeated_list_fields() {
    let harness = harness(false);
    let app = app!(harness);

    let resp =
        test::call_service(&app, submit_request(&booking_fields(), None).to_request()).await;
    assert_eq!(resp.status(), 201);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["message"], "Booking request submitted successfully");
    let id: Uuid = created["submission"]["id"].as_str().unwrap().parse().unwrap();

    let stored = harness.repo.get(id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Ada");
    assert_eq!(stored.email, "ada@example.com");
    assert_eq!(stored.status, ModerationStatus::Pending);
    assert!(stored.attachment.is_none());
    match &stored.body {
        SubmissionBody::Booking {
            lab,
            date,
            start_time,
            end_time,
            faculty,
            equipment,
        } => {
            assert_eq!(lab, "Chemistry");
            assert_eq!(date, "2025-03-01");
            assert_eq!(start_time, "09:00");
            assert_eq!(end_time, "11:00");
            assert_eq!(faculty, &["Dr. Hall".to_string(), "Dr. Jones".to_string()]);
            assert_eq!(
                equipment,
                &["Centrifuge".to_string(), "Bunsen burner".to_string()]
            );
        }
        other => panic!("expected a booking body, got {other:?}"),
    }
}

#[actix_web::test]
async fn booking_with_attachment_rejected_and_nothing_persisted() {
    let harness = harness(false);
    let app = app!(harness);

    let resp = test::call_service(
        &app,
        submit_request(
            &booking_fields(),
            Some(("pic.png", "image/png", b"\x89PNG\r\n\x1a\n")),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Image uploads are only accepted on blog posts");
    assert!(harness.repo.submissions.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn malformed_id_and_json_get_the_error_envelope() {
    let harness = harness(false);
    let app = app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/submissions/not-a-uuid")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
    assert_eq!(
        resp.headers().get("content-type").unwrap().to_str().unwrap(),
        "application/json"
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Submission not found");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/login")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    let messages = body["message"].as_array().unwrap();
    assert!(messages[0]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON payload"));
}

#[actix_web::test]
async fn list_public_shows_only_approved_and_never_email() {
    let harness = harness(false);
    let approved = stored_booking(10);
    let pending = stored_booking(0);
    harness
        .repo
        .submissions
        .lock()
        .unwrap()
        .extend([approved.clone(), pending.clone()]);
    let app = app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/submissions/{}/approve", approved.id))
            .insert_header(("authorization", bearer(&harness)))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/submissions").to_request()).await;
    assert_eq!(resp.status(), 200);
    let listed: Value = test::read_body_json(resp).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], approved.id.to_string());
    assert!(listed[0].get("email").is_none());
}

#[actix_web::test]
async fn decide_transitions_and_later_decision_wins() {
    let harness = harness(false);
    let submission = stored_booking(0);
    harness
        .repo
        .submissions
        .lock()
        .unwrap()
        .push(submission.clone());
    let app = app!(harness);
    let token = bearer(&harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/submissions/{}/approve", submission.id))
            .insert_header(("authorization", token.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["submission"]["status"], "approved");

    // Re-deciding is permitted; the later call's outcome sticks.
    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/submissions/{}/reject", submission.id))
            .insert_header(("authorization", token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/submissions/{}", submission.id))
            .to_request(),
    )
    .await;
    let fetched: Value = test::read_body_json(resp).await;
    assert_eq!(fetched["status"], "rejected");
}

#[actix_web::test]
async fn gated_routes_reject_missing_and_invalid_tokens_without_mutating() {
    let harness = harness(false);
    let submission = stored_booking(0);
    harness
        .repo
        .submissions
        .lock()
        .unwrap()
        .push(submission.clone());
    let app = app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/submissions/pending").to_request(),
    )
    .await;
    assert_eq!(resp.status(), 401);

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/submissions/{}/approve", submission.id))
            .insert_header(("authorization", "Bearer garbage"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 401);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/submissions/{}", submission.id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 401);

    // Nothing moved or vanished.
    let unchanged = harness.repo.get(submission.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, ModerationStatus::Pending);
    assert!(harness.notifier.events().is_empty());
}

#[actix_web::test]
async fn pdf_attachment_rejected_and_nothing_persisted() {
    let harness = harness(false);
    let app = app!(harness);

    let resp = test::call_service(
        &app,
        submit_request(
            &post_fields(),
            Some(("doc.pdf", "application/pdf", b"%PDF-1.4")),
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);
    assert!(harness.repo.submissions.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn oversized_attachment_rejected() {
    let harness = harness(false);
    let app = app!(harness);

    let six_mib = vec![0u8; 6 * 1024 * 1024];
    let resp = test::call_service(
        &app,
        submit_request(&post_fields(), Some(("big.png", "image/png", &six_mib))).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);
    assert!(harness.repo.submissions.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn attachment_roundtrip_is_byte_identical() {
    let harness = harness(false);
    let app = app!(harness);

    let payload = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];
    let resp = test::call_service(
        &app,
        submit_request(&post_fields(), Some(("pic.png", "image/png", &payload))).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let created: Value = test::read_body_json(resp).await;
    let id = created["submission"]["id"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/submissions/{id}/attachment"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap().to_str().unwrap(),
        "image/png"
    );
    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), &payload[..]);
}

#[actix_web::test]
async fn attachment_of_missing_submission_is_404() {
    let harness = harness(false);
    let submission = stored_booking(0); // no attachment
    harness
        .repo
        .submissions
        .lock()
        .unwrap()
        .push(submission.clone());
    let app = app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/submissions/{}/attachment", submission.id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/submissions/{}/attachment", Uuid::now_v7()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn register_then_login_issues_working_token() {
    let harness = harness(false);
    let app = app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/register")
            .set_json(serde_json::json!({
                "username": "a", "email": "a@x.com", "password": "p"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);

    // Duplicate registration is a conflict.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/register")
            .set_json(serde_json::json!({
                "username": "a", "email": "other@x.com", "password": "p"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/login")
            .set_json(serde_json::json!({ "username": "a", "password": "wrong" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 401);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/login")
            .set_json(serde_json::json!({ "username": "a", "password": "p" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/submissions/pending")
            .insert_header(("authorization", format!("Bearer {token}")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn list_pending_orders_newest_first() {
    let harness = harness(false);
    let older = stored_booking(60);
    let newer = stored_booking(0);
    harness
        .repo
        .submissions
        .lock()
        .unwrap()
        .extend([older.clone(), newer.clone()]);
    let app = app!(harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/submissions/pending")
            .insert_header(("authorization", bearer(&harness)))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let listed: Value = test::read_body_json(resp).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], newer.id.to_string());
    assert_eq!(listed[1]["id"], older.id.to_string());
    // Pending view is the admin projection, email included.
    assert_eq!(listed[0]["email"], "ada@example.com");
}

#[actix_web::test]
async fn notifier_failure_never_fails_the_request() {
    let harness = harness(true);
    let submission = stored_booking(0);
    harness
        .repo
        .submissions
        .lock()
        .unwrap()
        .push(submission.clone());
    let app = app!(harness);

    let resp = test::call_service(&app, submit_request(&post_fields(), None).to_request()).await;
    assert_eq!(resp.status(), 201);

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/submissions/{}/approve", submission.id))
            .insert_header(("authorization", bearer(&harness)))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn notifications_fire_after_submit_and_decision() {
    let harness = harness(false);
    let app = app!(harness);

    let resp = test::call_service(&app, submit_request(&post_fields(), None).to_request()).await;
    assert_eq!(resp.status(), 201);
    let created: Value = test::read_body_json(resp).await;
    let id = created["submission"]["id"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/submissions/{id}/approve"))
            .insert_header(("authorization", bearer(&harness)))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);

    // Dispatch is spawned; give the local executor a beat.
    actix_web::rt::time::sleep(std::time::Duration::from_millis(50)).await;
    let events = harness.notifier.events();
    assert!(events.contains(&format!("received:{id}")));
    assert!(events.contains(&format!("decision:{id}:approved")));
}

#[actix_web::test]
async fn remove_deletes_and_404s_on_absent() {
    let harness = harness(false);
    let submission = stored_booking(0);
    harness
        .repo
        .submissions
        .lock()
        .unwrap()
        .push(submission.clone());
    let app = app!(harness);
    let token = bearer(&harness);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/submissions/{}", submission.id))
            .insert_header(("authorization", token.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/submissions/{}", submission.id))
            .insert_header(("authorization", token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn validation_reports_one_message_per_field() {
    let harness = harness(false);
    let app = app!(harness);

    let resp = test::call_service(
        &app,
        submit_request(&[("kind", "post")], None).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    let messages = body["message"].as_array().unwrap();
    assert_eq!(messages.len(), 4); // name, email, title, content
}
