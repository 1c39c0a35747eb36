//! API router.
//!
//! Layers, innermost first: body limit, CORS, request tracing.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::uploads::PUBLIC_PREFIX;

/// Upper bound for request bodies, multipart uploads included.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the API router.
///
/// Stored file references (`/uploads/<applicationId>/<file>`) resolve
/// against the same router, so clients can use them as download URLs.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let uploads = ServeDir::new(ctx.files.root());

    Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/applications",
            get(endpoints::applications::list).post(endpoints::applications::create),
        )
        .route(
            "/applications/:id",
            get(endpoints::applications::detail)
                .put(endpoints::applications::update)
                .delete(endpoints::applications::remove),
        )
        .route(
            "/applications/:id/timeline",
            get(endpoints::applications::timeline),
        )
        .route(
            "/contacts",
            get(endpoints::contacts::list).post(endpoints::contacts::create),
        )
        .route(
            "/contacts/:id",
            get(endpoints::contacts::detail)
                .put(endpoints::contacts::update)
                .delete(endpoints::contacts::remove),
        )
        .route(
            "/timeline-events",
            get(endpoints::timeline_events::list).post(endpoints::timeline_events::create),
        )
        .route(
            "/timeline-events/:id",
            get(endpoints::timeline_events::detail).delete(endpoints::timeline_events::remove),
        )
        .nest_service(PUBLIC_PREFIX, uploads)
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::db::Database;
    use crate::uploads::FileStore;

    const BOUNDARY: &str = "applytrack-test-boundary";

    struct TestApp {
        router: Router,
        dir: tempfile::TempDir,
    }

    impl TestApp {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let ctx = ApiContext::new(
                Database::open_in_memory().unwrap(),
                FileStore::new(dir.path()),
            );
            Self {
                router: api_router(ctx),
                dir,
            }
        }

        async fn send(&self, request: Request<Body>) -> Response<Body> {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let response = self.send(request).await;
            let status = response.status();
            (status, body_json(response).await)
        }

        async fn create_application(&self) -> String {
            let (status, app) = self
                .json(
                    "POST",
                    "/applications",
                    Some(json!({"company": "Acme", "position": "Engineer", "status": "APPLIED"})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            app["id"].as_str().unwrap().to_string()
        }
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        if bytes.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&bytes).unwrap()
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart(method: &str, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, file_name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = TestApp::new();
        let (status, body) = app.json("GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn create_requires_company_and_position() {
        let app = TestApp::new();
        let (status, body) = app
            .json("POST", "/applications", Some(json!({"company": "Acme"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Company and position are required");
    }

    #[tokio::test]
    async fn create_defaults_status() {
        let app = TestApp::new();
        let (status, body) = app
            .json(
                "POST",
                "/applications",
                Some(json!({"company": "Acme", "position": "Engineer"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "NOT_APPLIED");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = TestApp::new();
        let request = Request::builder()
            .method("POST")
            .uri("/contacts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unknown_application_is_404() {
        let app = TestApp::new();
        let (status, body) = app.json("GET", "/applications/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _) = app
            .json("PUT", "/applications/missing", Some(json!({"pay": "100k"})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn scheduling_and_completing_an_interview() {
        let app = TestApp::new();
        let id = app.create_application().await;

        let (status, detail) = app
            .json(
                "PUT",
                &format!("/applications/{id}"),
                Some(json!({"firstInterviewDate": "2024-04-01"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let events = detail["timelineEvents"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "FIRST_INTERVIEW_SCHEDULED");
        assert_eq!(events[0]["isCompleted"], false);
        assert!(events[0]["eventDate"].as_str().unwrap().starts_with("2024-04-01"));

        let (_, detail) = app
            .json(
                "PUT",
                &format!("/applications/{id}"),
                Some(json!({"firstInterviewCompleted": true, "firstInterviewNotes": "Went well"})),
            )
            .await;
        let completed = detail["timelineEvents"]
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["type"] == "FIRST_INTERVIEW_COMPLETED")
            .unwrap();
        assert!(completed["description"].as_str().unwrap().contains("Went well"));
    }

    #[tokio::test]
    async fn status_change_uses_labels() {
        let app = TestApp::new();
        let id = app.create_application().await;

        let (_, detail) = app
            .json(
                "PUT",
                &format!("/applications/{id}"),
                Some(json!({"status": "INITIAL_CALL"})),
            )
            .await;
        let event = &detail["timelineEvents"][0];
        assert_eq!(event["type"], "STATUS_CHANGED");
        assert_eq!(
            event["description"],
            "Application status changed from Applied to Initial Call"
        );
    }

    #[tokio::test]
    async fn projected_timeline_has_no_duplicates() {
        let app = TestApp::new();
        let id = app.create_application().await;
        app.json(
            "PUT",
            &format!("/applications/{id}"),
            Some(json!({"appliedDate": "2024-03-15", "initialCallDate": "2024-03-20"})),
        )
        .await;

        let (status, first) = app
            .json("GET", &format!("/applications/{id}/timeline"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let (_, second) = app
            .json("GET", &format!("/applications/{id}/timeline"), None)
            .await;
        assert_eq!(first, second);

        let ids: Vec<&str> = first
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap())
            .collect();
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.contains(&format!("{id}-system-applied-completed").as_str()));
    }

    #[tokio::test]
    async fn contacts_keep_one_primary() {
        let app = TestApp::new();
        let id = app.create_application().await;

        let (status, first) = app
            .json(
                "POST",
                "/contacts",
                Some(json!({"applicationId": id, "name": "Ada", "isPrimary": true})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, second) = app
            .json(
                "POST",
                "/contacts",
                Some(json!({"applicationId": id, "name": "Grace"})),
            )
            .await;

        let (status, _) = app
            .json(
                "PUT",
                &format!("/contacts/{}", second["id"].as_str().unwrap()),
                Some(json!({"name": "Grace", "isPrimary": true})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, first) = app
            .json("GET", &format!("/contacts/{}", first["id"].as_str().unwrap()), None)
            .await;
        assert_eq!(first["isPrimary"], false);
    }

    #[tokio::test]
    async fn child_lists_require_application_id() {
        let app = TestApp::new();
        let (status, body) = app.json("GET", "/contacts", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Application ID is required");

        let (status, _) = app.json("GET", "/timeline-events", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn timeline_events_crud() {
        let app = TestApp::new();
        let id = app.create_application().await;

        let (status, body) = app
            .json("POST", "/timeline-events", Some(json!({"applicationId": id})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Application ID, type, and title are required");

        let (status, event) = app
            .json(
                "POST",
                "/timeline-events",
                Some(json!({
                    "applicationId": id,
                    "type": "FOLLOW_UP_SENT",
                    "title": "Follow-up sent",
                    "eventDate": "2024-05-02"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, events) = app
            .json("GET", &format!("/timeline-events?applicationId={id}"), None)
            .await;
        assert_eq!(events.as_array().unwrap().len(), 1);

        let event_uri = format!("/timeline-events/{}", event["id"].as_str().unwrap());
        let (status, fetched) = app.json("GET", &event_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(fetched["eventDate"].as_str().unwrap().starts_with("2024-05-02"));

        let (status, body) = app
            .json(
                "DELETE",
                &event_uri,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Timeline event deleted successfully");

        let (status, _) = app.json("GET", &event_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn png_resume_is_rejected_and_row_unchanged() {
        let app = TestApp::new();
        let id = app.create_application().await;

        let response = app
            .send(multipart(
                "PUT",
                &format!("/applications/{id}"),
                &[
                    Part::Text("action", "uploadResume"),
                    Part::File("file", "photo.png", b"\x89PNG"),
                ],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "UNSUPPORTED_FILE_TYPE");

        let (_, detail) = app.json("GET", &format!("/applications/{id}"), None).await;
        assert_eq!(detail["resumeFile"], Value::Null);
    }

    #[tokio::test]
    async fn uploaded_resume_is_served_and_deleted_with_application() {
        let app = TestApp::new();
        let id = app.create_application().await;

        let response = app
            .send(multipart(
                "PUT",
                &format!("/applications/{id}"),
                &[
                    Part::Text("action", "uploadResume"),
                    Part::File("file", "cv.pdf", b"%PDF-1.7 resume"),
                ],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let detail = body_json(response).await;
        let reference = detail["resumeFile"].as_str().unwrap().to_string();
        assert!(reference.starts_with(&format!("/uploads/{id}/resume-")));

        let download = app
            .send(Request::builder().uri(&reference).body(Body::empty()).unwrap())
            .await;
        assert_eq!(download.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(download.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7 resume");

        let (status, body) = app
            .json("DELETE", &format!("/applications/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Application deleted successfully");

        let gone = app
            .send(Request::builder().uri(&reference).body(Body::empty()).unwrap())
            .await;
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn multipart_create_attaches_documents() {
        let app = TestApp::new();
        let response = app
            .send(multipart(
                "POST",
                "/applications",
                &[
                    Part::Text("company", "Globex"),
                    Part::Text("position", "Analyst"),
                    Part::Text("appliedDate", "2024-03-15"),
                    Part::File("coverLetterFile", "letter.docx", b"PK"),
                    Part::File("documentFiles", "portfolio.pdf", b"%PDF"),
                    Part::Text("documentLabels", "Portfolio"),
                ],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert!(created["coverLetterFile"].as_str().unwrap().ends_with(".docx"));

        let (_, list) = app.json("GET", "/applications", None).await;
        let documents = list[0]["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["label"], "Portfolio");
    }

    #[tokio::test]
    async fn document_labels_follow_blank_file_inputs() {
        let app = TestApp::new();
        let response = app
            .send(multipart(
                "POST",
                "/applications",
                &[
                    Part::Text("company", "Globex"),
                    Part::Text("position", "Analyst"),
                    Part::File("documentFiles", "", b""),
                    Part::File("documentFiles", "portfolio.pdf", b"%PDF"),
                    Part::Text("documentLabels", "Nothing here"),
                    Part::Text("documentLabels", "Portfolio"),
                ],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let (_, list) = app.json("GET", "/applications", None).await;
        let documents = list[0]["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["label"], "Portfolio");
    }

    #[tokio::test]
    async fn undeletable_upload_fails_application_delete() {
        let app = TestApp::new();
        let id = app.create_application().await;
        let response = app
            .send(multipart(
                "PUT",
                &format!("/applications/{id}"),
                &[
                    Part::Text("action", "uploadResume"),
                    Part::File("file", "cv.pdf", b"%PDF-1.7"),
                ],
            ))
            .await;
        let reference = body_json(response).await["resumeFile"]
            .as_str()
            .unwrap()
            .to_string();
        let file_name = reference.rsplit('/').next().unwrap();
        let path = app.dir.path().join(&id).join(file_name);
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let (status, body) = app
            .json("DELETE", &format!("/applications/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL");
        assert_eq!(body["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn multipart_create_rejects_bad_file_before_insert() {
        let app = TestApp::new();
        let response = app
            .send(multipart(
                "POST",
                "/applications",
                &[
                    Part::Text("company", "Globex"),
                    Part::Text("position", "Analyst"),
                    Part::File("resumeFile", "cv.txt", b"plain"),
                ],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (_, list) = app.json("GET", "/applications", None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_action_is_bad_request() {
        let app = TestApp::new();
        let id = app.create_application().await;
        let response = app
            .send(multipart(
                "PUT",
                &format!("/applications/{id}"),
                &[Part::Text("action", "shred")],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
