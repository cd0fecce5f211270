//! Integration tests for the SignDesk Gateway
//!
//! These tests run the full router against a wiremock upstream.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_is, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use signdesk::{app, AppConfig, AppState};

const BOUNDARY: &str = "signdesk-test-boundary";

fn test_app(upstream: &MockServer) -> Router {
    let mut config = AppConfig::default();
    config.upstream.base_url = upstream.uri();
    config.upstream.public_pdf_api_key = Some("public-key".to_string());
    config.upstream.super_user_name = Some("su".to_string());
    config.upstream.super_user_password = Some("s3cret".to_string());
    config.server.static_dir = "tests/fixtures/public".to_string();

    let state = AppState::new(config).expect("state");
    app(Arc::new(state))
}

/// `Cookie` header for a logged-in user
fn session_cookie(roles: Value) -> String {
    let payload = json!({ "user": { "id": 7, "name": "Ayşe" }, "userRoles": roles });
    format!("token=T; user={}", urlencoding::encode(&payload.to_string()))
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn multipart_body(texts: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in texts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, cookie: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_liveness_check() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(Request::get("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_sets_both_cookies() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/UserAuth/User/Login"))
            .and(body_partial_json(json!({ "email": "ayse@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "token": "abc",
                    "user": { "id": 7, "name": "Ayşe", "password": "secret" },
                    "userRoles": ["Admin"]
                }
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let server = TestServer::new(test_app(&upstream)).unwrap();
        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": "ayse@example.com", "password": "pw" }))
            .await;

        response.assert_status_ok();
        let cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        let token = cookies.iter().find(|c| c.starts_with("token=")).expect("token cookie");
        assert!(token.starts_with("token=abc;"));
        assert!(token.contains("HttpOnly"));

        let user = cookies.iter().find(|c| c.starts_with("user=")).expect("user cookie");
        assert!(!user.contains("HttpOnly"));
        let decoded = urlencoding::decode(user).unwrap();
        assert!(!decoded.contains("secret"));

        let body: Value = response.json();
        assert_eq!(body, json!({ "user": { "id": 7, "name": "Ayşe" } }));
    }

    #[tokio::test]
    async fn test_login_rejected_keeps_upstream_status() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/UserAuth/User/Login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "E-posta veya şifre hatalı" })),
            )
            .mount(&upstream)
            .await;

        let request = Request::post("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "email": "a@b.com", "password": "x" }).to_string()))
            .unwrap();
        let response = test_app(&upstream).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&response).is_empty());
        assert_eq!(json_body(response).await["error"], json!("E-posta veya şifre hatalı"));
    }

    #[tokio::test]
    async fn test_logout_clears_cookies_and_redirects() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(
                Request::get("/api/auth/logout?locale=en")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/en/login");
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn test_session_without_cookies_is_unauthenticated() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(Request::get("/api/auth/session").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_projection() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(
                Request::get("/api/auth/session")
                    .header(header::COOKIE, session_cookie(json!(["Admin"])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["isAdmin"], json!(true));
        assert_eq!(body["user"]["id"], json!(7));
    }

    #[tokio::test]
    async fn test_missing_group_id_is_rejected_before_upstream() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Document/Tracking/GetPages"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let response = test_app(&upstream)
            .oneshot(
                Request::get("/api/documents/tracking/pages")
                    .header(header::COOKIE, session_cookie(json!([])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "docGId parametresi eksik" }));
    }

    #[tokio::test]
    async fn test_password_mismatch_never_reaches_upstream() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/UserAuth/User/ChangePassword"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let request = Request::post("/api/auth/change-password")
            .header(header::COOKIE, session_cookie(json!([])))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "oldPas": "a", "newPas": "b", "newPasAgain": "c" }).to_string(),
            ))
            .unwrap();
        let response = test_app(&upstream).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], json!("Şifreler eşleşmiyor"));
    }

    #[tokio::test]
    async fn test_upstream_401_clears_session() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Document/Template/List"))
            .and(header_is("authorization", "Bearer T"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&upstream)
            .await;

        let response = test_app(&upstream)
            .oneshot(
                Request::get("/api/templates")
                    .header(header::COOKIE, session_cookie(json!([])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("token=;") && c.contains("Max-Age=0")));
        assert!(cookies.iter().any(|c| c.starts_with("user=;") && c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn test_signed_pdf_is_passed_through_as_download() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Document/DocumentGroup/GetSignedPdf"))
            .and(query_param("docGId", "42"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(b"%PDF-1.7 test".to_vec(), "application/pdf"),
            )
            .expect(1)
            .mount(&upstream)
            .await;

        let response = test_app(&upstream)
            .oneshot(
                Request::get("/api/documents/signed-pdf?groupId=42")
                    .header(header::COOKIE, session_cookie(json!([])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"imzali-belge-42.pdf\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7 test");
    }

    #[tokio::test]
    async fn test_public_pdf_uses_api_key() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Document/Public/GetSignedPdf"))
            .and(header_is("x-api-key", "public-key"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF".to_vec(), "application/pdf"))
            .expect(1)
            .mount(&upstream)
            .await;

        let response = test_app(&upstream)
            .oneshot(
                Request::get("/api/public/signed-pdf?docGId=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_company_creation_requires_admin() {
        let upstream = MockServer::start().await;
        let request = Request::post("/api/companies/create")
            .header(header::COOKIE, session_cookie(json!(["User"])))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": "Acme" }).to_string()))
            .unwrap();
        let response = test_app(&upstream).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_forged_admin_cookie_never_carries_super_user_secret() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/UserAuth/User/GetCurrentUser"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&upstream)
            .await;
        Mock::given(method("POST"))
            .and(path("/Company/Company/Create"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let payload = json!({ "userRoles": ["Admin"] });
        let cookie = format!(
            "token=anything; user={}",
            urlencoding::encode(&payload.to_string())
        );
        let request = Request::post("/api/companies/create")
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "companyName": "Acme", "email": "info@acme.com" }).to_string(),
            ))
            .unwrap();
        let response = test_app(&upstream).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&response).iter().any(|c| c.starts_with("token=;")));
    }

    #[tokio::test]
    async fn test_admin_cookie_without_upstream_admin_role_is_forbidden() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/UserAuth/User/GetCurrentUser"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": { "id": 7, "roles": ["User"] } })),
            )
            .expect(1)
            .mount(&upstream)
            .await;
        Mock::given(method("POST"))
            .and(path("/Company/Company/Create"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let request = Request::post("/api/companies/create")
            .header(header::COOKIE, session_cookie(json!(["Admin"])))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "companyName": "Acme", "email": "info@acme.com" }).to_string(),
            ))
            .unwrap();
        let response = test_app(&upstream).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_verified_admin_creates_company_with_token_and_secret() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/UserAuth/User/GetCurrentUser"))
            .and(header_is("authorization", "Bearer T"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": { "id": 7, "roles": [{ "name": "Admin" }] } })),
            )
            .expect(1)
            .mount(&upstream)
            .await;
        Mock::given(method("POST"))
            .and(path("/Company/Company/Create"))
            .and(header_is("authorization", "Bearer T"))
            .and(query_param("suUserName", "su"))
            .and(query_param("suPassword", "s3cret"))
            .and(body_partial_json(json!({ "companyName": "Acme" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 3 })))
            .expect(1)
            .mount(&upstream)
            .await;

        let request = Request::post("/api/companies/create")
            .header(header::COOKIE, session_cookie(json!(["Admin"])))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "companyName": "Acme", "email": "info@acme.com" }).to_string(),
            ))
            .unwrap();
        let response = test_app(&upstream).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "id": 3 }));
    }

    #[tokio::test]
    async fn test_new_password_is_forwarded_untrimmed() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/UserAuth/User/ChangePassword"))
            .and(body_partial_json(json!({ "oldPassword": "old", "newPassword": " pw " })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isSuccess": true })))
            .expect(1)
            .mount(&upstream)
            .await;

        let request = Request::post("/api/auth/change-password")
            .header(header::COOKIE, session_cookie(json!([])))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "oldPas": "old", "newPas": " pw ", "newPasAgain": " pw " }).to_string(),
            ))
            .unwrap();
        let response = test_app(&upstream).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_send_requires_a_session_user() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Document/DocumentGroup/Upload"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let body = multipart_body(
            &[("signers", r#"[{"email":"b@example.com"}]"#), ("userId", "99")],
            Some(("files", "sozlesme.pdf", b"%PDF")),
        );
        let request = Request::post("/api/documents/send")
            .header(header::AUTHORIZATION, "Bearer T")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = test_app(&upstream).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_send_rejects_someone_elses_user_id() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Document/DocumentGroup/Upload"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let body = multipart_body(
            &[("signers", r#"[{"email":"b@example.com"}]"#), ("userId", "99")],
            Some(("files", "sozlesme.pdf", b"%PDF")),
        );
        let response = test_app(&upstream)
            .oneshot(multipart_request("/api/documents/send", &session_cookie(json!([])), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_upload_failure_stops_before_send() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Document/DocumentGroup/Upload"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Dosya yüklenemedi"))
            .expect(1)
            .mount(&upstream)
            .await;
        Mock::given(method("POST"))
            .and(path("/Document/DocumentGroup/SendForSignature"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let body = multipart_body(
            &[("signers", r#"[{"email":"b@example.com"}]"#)],
            Some(("files", "sozlesme.pdf", b"%PDF")),
        );
        let response = test_app(&upstream)
            .oneshot(multipart_request("/api/documents/send", &session_cookie(json!([])), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], json!("Dosya yüklenemedi"));
    }

    #[tokio::test]
    async fn test_upload_then_send() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Document/DocumentGroup/Upload"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"123".to_vec(), "text/plain"))
            .expect(1)
            .mount(&upstream)
            .await;
        Mock::given(method("POST"))
            .and(path("/Document/DocumentGroup/SendForSignature"))
            .and(body_partial_json(json!({
                "docGId": "123",
                "userId": "7",
                "signers": [{ "email": "b@example.com" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": { "sent": 1 } })))
            .expect(1)
            .mount(&upstream)
            .await;

        let body = multipart_body(
            &[("signers", r#"[{"email":"b@example.com"}]"#), ("title", "Sözleşme")],
            Some(("files", "sozlesme.pdf", b"%PDF")),
        );
        let response = test_app(&upstream)
            .oneshot(multipart_request("/api/documents/send", &session_cookie(json!([])), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "success": true, "docGId": "123", "data": { "sent": 1 } })
        );
    }

    #[tokio::test]
    async fn test_send_without_signers_is_rejected_before_upload() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Document/DocumentGroup/Upload"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let body = multipart_body(&[], Some(("files", "sozlesme.pdf", b"%PDF")));
        let response = test_app(&upstream)
            .oneshot(multipart_request("/api/documents/send", &session_cookie(json!([])), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], json!("signers parametresi eksik"));
    }

    #[tokio::test]
    async fn test_tracking_list_one_lookup_per_group() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Document/DocumentGroup/TrackingList"))
            .and(query_param("period", "month"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [
                    { "id": 1, "docGId": 1 },
                    { "id": 2, "docGId": 2 },
                    { "id": 3, "docGId": 1 },
                    { "id": 4, "docGId": 3 }
                ]
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        for (id, status) in [("1", 200), ("2", 500), ("3", 200)] {
            Mock::given(method("GET"))
                .and(path("/Document/DocumentGroup/GetInfo"))
                .and(query_param("docGId", id))
                .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                    "result": { "name": format!("Grup {id}"), "description": "Açıklama" }
                })))
                .expect(1)
                .mount(&upstream)
                .await;
        }

        let response = test_app(&upstream)
            .oneshot(
                Request::get("/api/documents/tracking?period=month")
                    .header(header::COOKIE, session_cookie(json!([])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let items = json_body(response).await;
        assert_eq!(items[0]["groupName"], json!("Grup 1"));
        assert_eq!(items[2]["groupName"], json!("Grup 1"));
        assert_eq!(items[1]["groupName"], Value::Null);
        assert_eq!(items[1]["groupDescription"], Value::Null);
        assert_eq!(items[3]["groupName"], json!("Grup 3"));
        assert_eq!(items[3]["groupDescription"], json!("Açıklama"));
    }

    #[tokio::test]
    async fn test_tracking_lookup_401_clears_session() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Document/DocumentGroup/TrackingList"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "docGId": 1 }])),
            )
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/Document/DocumentGroup/GetInfo"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&upstream)
            .await;

        let response = test_app(&upstream)
            .oneshot(
                Request::get("/api/documents/tracking")
                    .header(header::COOKIE, session_cookie(json!([])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("token=;") && c.contains("Max-Age=0")));
        assert!(cookies.iter().any(|c| c.starts_with("user=;") && c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn test_tracking_list_rejects_unknown_period() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(
                Request::get("/api/documents/tracking?period=decade")
                    .header(header::COOKIE, session_cookie(json!([])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_guard_redirects_anonymous_to_login() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(Request::get("/en/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/en/login");
        assert_eq!(set_cookies(&response).len(), 2);
    }

    #[tokio::test]
    async fn test_guard_keeps_non_admin_out_of_admin_pages() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(
                Request::get("/tr/admin/companies")
                    .header(header::COOKIE, session_cookie(json!(["User"])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/tr/dashboard");
    }

    #[tokio::test]
    async fn test_guard_serves_page_shell_for_admin() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(
                Request::get("/tr/admin/companies")
                    .header(header::COOKIE, session_cookie(json!([{ "name": "Admin" }])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dotted_admin_path_without_session_goes_to_login() {
        let upstream = MockServer::start().await;
        for uri in ["/tr/admin/x.html", "/tr/admin/registrations.x", "/tr/dashboard.x"] {
            let response = test_app(&upstream)
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{uri}");
            assert_eq!(response.headers()[header::LOCATION], "/tr/login", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_dotted_admin_path_for_non_admin_goes_to_dashboard() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(
                Request::get("/tr/admin/x.html")
                    .header(header::COOKIE, session_cookie(json!(["User"])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/tr/dashboard");
    }

    #[tokio::test]
    async fn test_missing_file_is_404_not_page_shell() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(
                Request::get("/tr/dashboard.x")
                    .header(header::COOKIE, session_cookie(json!(["User"])))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_operations_lookalike_paths_are_guarded() {
        let upstream = MockServer::start().await;
        for uri in ["/healthz", "/livestream", "/ready-anything", "/apix"] {
            let response = test_app(&upstream)
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{uri}");
            assert_eq!(response.headers()[header::LOCATION], "/tr/login", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_existing_static_file_needs_no_session() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(Request::get("/robots.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_public_sign_page_needs_no_session() {
        let upstream = MockServer::start().await;
        let response = test_app(&upstream)
            .oneshot(Request::get("/tr/sign/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
