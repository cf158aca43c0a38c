//! HTTP-level tests driving the router in-process
//!
//! Run with: cargo test -p rentshield-api --test api_tests

mod common;

use axum::http::{header, Method, StatusCode};
use common::{
    session_cookie_pair, TestContext, ADMIN_EMAIL, LANDLORD_EMAIL, OTHER_LANDLORD_EMAIL,
    OTHER_TENANT_EMAIL, PASSWORD, TENANT_EMAIL,
};
use serde_json::json;

#[tokio::test]
async fn test_health_reports_memory_store() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["store"], "memory");
    assert_eq!(
        response.headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn test_login_sets_http_only_cookie() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": " LENA@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["role"], "landlord");
    assert_eq!(response.body["user"]["name"], "Lena Landlord");
    assert!(response.body["user"].get("passwordHash").is_none());

    let set_cookie = response
        .headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("rentshield_token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=86400"));
}

#[tokio::test]
async fn test_login_failures_are_distinct() {
    let ctx = TestContext::new().await.unwrap();

    let missing = ctx
        .send(Method::POST, "/v1/auth/login", None, Some(json!({ "email": "" })))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let wrong = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": LANDLORD_EMAIL, "password": "nope-nope" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["message"], "Invalid email or password");

    let admin = ctx.login(ADMIN_EMAIL).await;
    let suspend = ctx
        .patch(
            &format!("/v1/users/{}/status", ctx.landlord_id),
            &admin,
            json!({ "status": "suspended" }),
        )
        .await;
    assert_eq!(suspend.status, StatusCode::OK);

    let suspended = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": LANDLORD_EMAIL, "password": PASSWORD })),
        )
        .await;
    assert_eq!(suspended.status, StatusCode::FORBIDDEN);
    assert_eq!(suspended.body["message"], "Account suspended");
}

#[tokio::test]
async fn test_me_and_logout() {
    let ctx = TestContext::new().await.unwrap();
    let tenant = ctx.login(TENANT_EMAIL).await;

    let me = ctx.get("/v1/auth/me", &tenant).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["role"], "tenant");
    assert_eq!(me.body["user"]["landlordId"], ctx.landlord_id.to_string());

    let logout = ctx.send(Method::POST, "/v1/auth/logout", Some(&tenant), None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["ok"], true);
    let cleared = session_cookie_pair(&logout.headers).unwrap();
    assert_eq!(cleared, "rentshield_token=");

    let me = ctx.get("/v1/auth/me", &tenant).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert!(me.body["user"].is_null());

    // Logging out again is harmless
    let again = ctx.send(Method::POST, "/v1/auth/logout", None, None).await;
    assert_eq!(again.status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_need_a_session() {
    let ctx = TestContext::new().await.unwrap();

    for uri in ["/v1/tasks", "/v1/vouchers", "/v1/property-reviews", "/v1/users"] {
        let response = ctx.send(Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.body["error"], "unauthorized");
    }

    let forged = ctx
        .get("/v1/tasks", &format!("rentshield_token={}", "f".repeat(64)))
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    let ctx = TestContext::new().await.unwrap();
    let cookie = ctx.login(LANDLORD_EMAIL).await;
    let token = cookie.trim_start_matches("rentshield_token=");

    let request = axum::http::Request::builder()
        .uri("/v1/tasks")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_user_administration() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.login(ADMIN_EMAIL).await;

    let created = ctx
        .post(
            "/v1/users",
            &admin,
            json!({
                "name": "Nina Tenant",
                "email": "nina@example.com",
                "password": "tenant-pass",
                "role": "tenant",
                "landlordId": ctx.landlord_id,
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert!(created.body["id"].is_string());

    let duplicate = ctx
        .post(
            "/v1/users",
            &admin,
            json!({
                "name": "Lena Again",
                "email": LANDLORD_EMAIL,
                "password": "landlord-pass",
            }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["message"], "User with this email already exists");

    let invalid = ctx
        .post(
            "/v1/users",
            &admin,
            json!({ "name": "", "email": "not-an-email", "password": "short" }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["error"], "validation_error");
    assert_eq!(invalid.body["details"].as_array().unwrap().len(), 3);

    let landlords = ctx.get("/v1/users", &admin).await;
    assert_eq!(landlords.body["users"].as_array().unwrap().len(), 2);
    assert!(landlords.body["users"][0].get("passwordHash").is_none());

    let tenants = ctx.get("/v1/users?role=tenant", &admin).await;
    assert_eq!(tenants.body["users"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_landlord_sees_only_own_tenants_and_no_admin_routes() {
    let ctx = TestContext::new().await.unwrap();
    let landlord = ctx.login(LANDLORD_EMAIL).await;

    let roster = ctx.get("/v1/users?role=tenant", &landlord).await;
    assert_eq!(roster.status, StatusCode::OK);
    let users = roster.body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], TENANT_EMAIL);

    let landlords = ctx.get("/v1/users?role=landlord", &landlord).await;
    assert_eq!(landlords.status, StatusCode::FORBIDDEN);

    let stats = ctx.get("/v1/stats", &landlord).await;
    assert_eq!(stats.status, StatusCode::FORBIDDEN);

    let create = ctx
        .post(
            "/v1/users",
            &landlord,
            json!({ "name": "X", "email": "x@example.com", "password": "password-1" }),
        )
        .await;
    assert_eq!(create.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_meter_reading_flow() {
    let ctx = TestContext::new().await.unwrap();
    let landlord = ctx.login(LANDLORD_EMAIL).await;
    let tenant = ctx.login(TENANT_EMAIL).await;
    let admin = ctx.login(ADMIN_EMAIL).await;

    let created = ctx
        .post(
            "/v1/tasks",
            &landlord,
            json!({
                "tenantId": ctx.tenant_id,
                "title": "Submit meter reading",
                "rewardAmount": 10,
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let task_id = created.body["id"].as_str().unwrap().to_string();

    let stats = ctx.get("/v1/stats", &admin).await;
    assert_eq!(stats.body, json!({ "landlords": 2, "tenants": 2, "openTasks": 1 }));

    let task = ctx.get(&format!("/v1/tasks/{task_id}"), &tenant).await;
    assert_eq!(task.body["task"]["status"], "open");
    assert_eq!(task.body["task"]["landlordName"], "Lena Landlord");
    assert_eq!(task.body["task"]["tenantName"], "Tom Tenant");

    let submitted = ctx
        .post(
            "/v1/submissions",
            &tenant,
            json!({ "taskId": task_id, "comment": "done" }),
        )
        .await;
    assert_eq!(submitted.status, StatusCode::CREATED);
    assert_eq!(submitted.body["ok"], true);
    let submission_id = submitted.body["id"].as_str().unwrap().to_string();

    let listed = ctx
        .get(&format!("/v1/submissions?taskId={task_id}"), &landlord)
        .await;
    let submissions = listed.body["submissions"].as_array().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["status"], "pending");
    assert_eq!(submissions[0]["tenantName"], "Tom Tenant");

    let tasks = ctx.get("/v1/tasks", &landlord).await;
    assert_eq!(tasks.body["tasks"][0]["status"], "submitted");

    let decided = ctx
        .patch(
            &format!("/v1/submissions/{submission_id}"),
            &landlord,
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(decided.status, StatusCode::OK);
    assert_eq!(decided.body["ok"], true);

    let task = ctx.get(&format!("/v1/tasks/{task_id}"), &landlord).await;
    assert_eq!(task.body["task"]["status"], "approved");

    let listed = ctx.get("/v1/submissions", &tenant).await;
    let submission = &listed.body["submissions"][0];
    assert_eq!(submission["status"], "approved");
    assert_eq!(submission["reviewedBy"], ctx.landlord_id.to_string());
    assert!(submission["reviewedAt"].is_string());
}

#[tokio::test]
async fn test_task_errors() {
    let ctx = TestContext::new().await.unwrap();
    let landlord = ctx.login(LANDLORD_EMAIL).await;
    let other_landlord = ctx.login(OTHER_LANDLORD_EMAIL).await;
    let tenant = ctx.login(TENANT_EMAIL).await;

    let no_title = ctx
        .post("/v1/tasks", &landlord, json!({ "tenantId": ctx.tenant_id }))
        .await;
    assert_eq!(no_title.status, StatusCode::BAD_REQUEST);

    let negative = ctx
        .post(
            "/v1/tasks",
            &landlord,
            json!({ "tenantId": ctx.tenant_id, "title": "x", "rewardAmount": -5 }),
        )
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let foreign = ctx
        .post(
            "/v1/tasks",
            &other_landlord,
            json!({ "tenantId": ctx.tenant_id, "title": "Not yours" }),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let by_tenant = ctx
        .post(
            "/v1/tasks",
            &tenant,
            json!({ "tenantId": ctx.tenant_id, "title": "Self-assigned" }),
        )
        .await;
    assert_eq!(by_tenant.status, StatusCode::FORBIDDEN);

    let missing = ctx
        .get(&format!("/v1/tasks/{}", uuid::Uuid::new_v4()), &landlord)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let missing_submission = ctx
        .post(
            "/v1/submissions",
            &tenant,
            json!({ "taskId": uuid::Uuid::new_v4() }),
        )
        .await;
    assert_eq!(missing_submission.status, StatusCode::NOT_FOUND);

    let bad_decision = ctx
        .patch(
            &format!("/v1/submissions/{}", uuid::Uuid::new_v4()),
            &landlord,
            json!({ "status": "maybe" }),
        )
        .await;
    assert_eq!(bad_decision.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_property_review_flow() {
    let ctx = TestContext::new().await.unwrap();
    let landlord = ctx.login(LANDLORD_EMAIL).await;
    let tenant = ctx.login(TENANT_EMAIL).await;
    let admin = ctx.login(ADMIN_EMAIL).await;

    let created = ctx
        .post(
            "/v1/property-reviews",
            &landlord,
            json!({ "tenantId": ctx.tenant_id }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let review_id = created.body["propertyReviewId"].as_str().unwrap().to_string();

    let uploaded = ctx
        .upload(
            &format!("/v1/property-reviews/{review_id}/tenant-photos"),
            &tenant,
            2,
        )
        .await;
    assert_eq!(uploaded.status, StatusCode::OK);
    assert_eq!(uploaded.body["uploaded"], 2);

    let wrong_side = ctx
        .upload(&format!("/v1/property-reviews/{review_id}/photos"), &tenant, 1)
        .await;
    assert_eq!(wrong_side.status, StatusCode::FORBIDDEN);

    let review = ctx
        .get(&format!("/v1/property-reviews/{review_id}"), &landlord)
        .await;
    assert_eq!(review.body["status"], "pending_admin_review");
    assert_eq!(review.body["tenantPhotos"].as_array().unwrap().len(), 2);
    assert!(review.body["landlordPhotos"].as_array().unwrap().is_empty());
    assert_eq!(review.body["tenantName"], "Tom Tenant");

    let by_landlord = ctx
        .post(
            &format!("/v1/property-reviews/{review_id}/verdict"),
            &landlord,
            json!({ "verdict": "thumbs_up", "voucherType": "coffee_5" }),
        )
        .await;
    assert_eq!(by_landlord.status, StatusCode::FORBIDDEN);

    let verdict = ctx
        .post(
            &format!("/v1/property-reviews/{review_id}/verdict"),
            &admin,
            json!({ "verdict": "thumbs_up", "voucherType": "coffee_5" }),
        )
        .await;
    assert_eq!(verdict.status, StatusCode::OK);
    assert_eq!(verdict.body["status"], "approved");
    assert_eq!(verdict.body["adminVerdict"], "thumbs_up");
    let voucher_id = verdict.body["voucherId"].as_str().unwrap().to_string();

    let vouchers = ctx.get("/v1/vouchers", &tenant).await;
    let vouchers = vouchers.body.as_array().unwrap().clone();
    assert_eq!(vouchers.len(), 1);
    assert_eq!(vouchers[0]["id"], voucher_id);
    assert_eq!(vouchers[0]["voucherType"], "coffee_5");
    assert_eq!(vouchers[0]["voucherTypeLabel"], "Coffee £5");
    assert_eq!(vouchers[0]["voucherCode"].as_str().unwrap().len(), 16);

    let landlord_vouchers = ctx.get("/v1/vouchers", &landlord).await;
    assert_eq!(landlord_vouchers.status, StatusCode::OK);
    assert_eq!(landlord_vouchers.body, json!([]));

    let again = ctx
        .post(
            &format!("/v1/property-reviews/{review_id}/verdict"),
            &admin,
            json!({ "verdict": "thumbs_up", "voucherType": "coffee_5" }),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let late_upload = ctx
        .upload(&format!("/v1/property-reviews/{review_id}/photos"), &landlord, 1)
        .await;
    assert_eq!(late_upload.status, StatusCode::CONFLICT);

    let all = ctx.get("/v1/vouchers", &admin).await;
    assert_eq!(all.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_thumbs_down_and_verdict_validation() {
    let ctx = TestContext::new().await.unwrap();
    let landlord = ctx.login(LANDLORD_EMAIL).await;
    let admin = ctx.login(ADMIN_EMAIL).await;

    let created = ctx
        .post(
            "/v1/property-reviews",
            &landlord,
            json!({ "tenantId": ctx.tenant_id, "landlordNote": "Kitchen damp" }),
        )
        .await;
    let review_id = created.body["propertyReviewId"].as_str().unwrap().to_string();
    let uri = format!("/v1/property-reviews/{review_id}/verdict");

    let unknown = ctx.post(&uri, &admin, json!({ "verdict": "meh" })).await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let missing = ctx.post(&uri, &admin, json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let rejected = ctx
        .post(
            &uri,
            &admin,
            json!({ "verdict": "thumbs_down", "voucherType": "amazon_10" }),
        )
        .await;
    assert_eq!(rejected.status, StatusCode::OK);
    assert_eq!(rejected.body["status"], "rejected");
    assert!(rejected.body["voucherId"].is_null());

    let vouchers = ctx.get("/v1/vouchers", &admin).await;
    assert_eq!(vouchers.body, json!([]));

    let not_found = ctx
        .post(
            &format!("/v1/property-reviews/{}/verdict", uuid::Uuid::new_v4()),
            &admin,
            json!({ "verdict": "thumbs_up" }),
        )
        .await;
    assert_eq!(not_found.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_listing_is_scoped() {
    let ctx = TestContext::new().await.unwrap();
    let landlord = ctx.login(LANDLORD_EMAIL).await;
    let other_tenant = ctx.login(OTHER_TENANT_EMAIL).await;

    let missing_tenant = ctx.post("/v1/property-reviews", &landlord, json!({})).await;
    assert_eq!(missing_tenant.status, StatusCode::BAD_REQUEST);

    ctx.post(
        "/v1/property-reviews",
        &landlord,
        json!({ "tenantId": ctx.tenant_id }),
    )
    .await;

    let own = ctx.get("/v1/property-reviews", &landlord).await;
    assert_eq!(own.body.as_array().unwrap().len(), 1);

    let theirs = ctx.get("/v1/property-reviews", &other_tenant).await;
    assert_eq!(theirs.body, json!([]));
}

#[tokio::test]
async fn test_only_admins_render_verdicts_whatever_the_body() {
    let ctx = TestContext::new().await.unwrap();
    let landlord = ctx.login(LANDLORD_EMAIL).await;
    let tenant = ctx.login(TENANT_EMAIL).await;
    let admin = ctx.login(ADMIN_EMAIL).await;

    let created = ctx
        .post(
            "/v1/property-reviews",
            &landlord,
            json!({ "tenantId": ctx.tenant_id }),
        )
        .await;
    let review_id = created.body["propertyReviewId"].as_str().unwrap().to_string();
    let uri = format!("/v1/property-reviews/{review_id}/verdict");

    for (caller, body) in [
        (&landlord, json!({})),
        (&landlord, json!({ "verdict": "thumbs_up", "voucherType": "amazon_10" })),
        (&landlord, json!({ "verdict": "meh" })),
        (&tenant, json!({})),
        (&tenant, json!({ "verdict": "thumbs_up" })),
    ] {
        let response = ctx.post(&uri, caller, body.clone()).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{body}");
        assert_eq!(response.body["error"], "forbidden");
    }

    let review = ctx.get(&format!("/v1/property-reviews/{review_id}"), &admin).await;
    assert_eq!(review.body["status"], "pending_admin_review");
    assert!(review.body["adminVerdict"].is_null());
}

#[tokio::test]
async fn test_role_gate_runs_before_body_validation() {
    let ctx = TestContext::new().await.unwrap();
    let landlord = ctx.login(LANDLORD_EMAIL).await;
    let tenant = ctx.login(TENANT_EMAIL).await;

    let task = ctx.post("/v1/tasks", &tenant, json!({})).await;
    assert_eq!(task.status, StatusCode::FORBIDDEN);

    let review = ctx.post("/v1/property-reviews", &tenant, json!({})).await;
    assert_eq!(review.status, StatusCode::FORBIDDEN);

    let submission = ctx.post("/v1/submissions", &landlord, json!({})).await;
    assert_eq!(submission.status, StatusCode::FORBIDDEN);

    let decision = ctx
        .patch(
            &format!("/v1/submissions/{}", uuid::Uuid::new_v4()),
            &tenant,
            json!({}),
        )
        .await;
    assert_eq!(decision.status, StatusCode::FORBIDDEN);

    let user = ctx
        .post(
            "/v1/users",
            &landlord,
            json!({ "name": "", "email": "not-an-email", "password": "x" }),
        )
        .await;
    assert_eq!(user.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let ctx = TestContext::new().await.unwrap();
    let landlord = ctx.login(LANDLORD_EMAIL).await;

    let bad_id = ctx.get("/v1/tasks/not-a-uuid", &landlord).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["error"], "bad_request");
    assert!(bad_id.body["message"].is_string());

    let bad_json = ctx
        .send_raw(Method::POST, "/v1/tasks", &landlord, "{\"title\": ")
        .await;
    assert_eq!(bad_json.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_json.body["error"], "bad_request");

    let bad_query = ctx.get("/v1/users?role=superuser", &landlord).await;
    assert_eq!(bad_query.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_query.body["error"], "bad_request");
}

#[tokio::test]
async fn test_blank_voucher_type_is_a_bad_request() {
    let ctx = TestContext::new().await.unwrap();
    let landlord = ctx.login(LANDLORD_EMAIL).await;
    let admin = ctx.login(ADMIN_EMAIL).await;

    let created = ctx
        .post(
            "/v1/property-reviews",
            &landlord,
            json!({ "tenantId": ctx.tenant_id }),
        )
        .await;
    let review_id = created.body["propertyReviewId"].as_str().unwrap().to_string();
    let uri = format!("/v1/property-reviews/{review_id}/verdict");

    let blank = ctx
        .post(&uri, &admin, json!({ "verdict": "thumbs_up", "voucherType": "   " }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let approved = ctx.post(&uri, &admin, json!({ "verdict": "thumbs_up" })).await;
    assert_eq!(approved.status, StatusCode::OK);
    assert!(approved.body["voucherId"].is_null());
}
