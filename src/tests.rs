#[cfg(test)]
mod integration_tests {
    use crate::auth::{Claims, TokenService};
    use crate::router::create_router;
    use crate::test_utils::test_utils::{
        create_project, create_requirement, create_use_case, register_and_login,
        setup_test_app_state, setup_test_server, TEST_PASSWORD, TEST_SECRET,
    };
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use chrono::{NaiveDateTime, Utc};
    use model::entities::{requirement, requirement_use_case, scenario, use_case};
    use sea_orm::{EntityTrait, PaginatorTrait};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn auth(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }

    fn id_of(body: &Value) -> i64 {
        body["id"].as_i64().expect("body has no id")
    }

    fn requirement_body(name: &str) -> Value {
        json!({
            "name": name,
            "description": format!("{} description", name),
            "type": "Functional",
        })
    }

    fn use_case_body(title: &str, requirement_id: Option<i64>) -> Value {
        json!({
            "title": title,
            "category": "Principal",
            "requirement_id": requirement_id,
        })
    }

    async fn create_scenario(server: &TestServer, token: &str, use_case_id: i64) -> Value {
        let response = server
            .post("/escenarios")
            .add_header(header::AUTHORIZATION, auth(token))
            .json(&json!({
                "use_case_id": use_case_id,
                "name": "Happy path",
                "type": "Normal",
                "expected_result": "Works",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = setup_test_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_register_returns_public_profile() {
        let server = setup_test_server().await;

        let response = server
            .post("/auth/register")
            .json(&json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["email"], "alice@example.com");
        assert!(id_of(&body) > 0);
        assert!(body.get("password").is_none());
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username_and_email() {
        let server = setup_test_server().await;
        register_and_login(&server, "alice").await;

        let same_username = server
            .post("/auth/register")
            .json(&json!({
                "username": "alice",
                "email": "other@example.com",
                "password": "pw",
            }))
            .await;
        same_username.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = same_username.json();
        assert_eq!(body["detail"], "Username already registered");

        let same_email = server
            .post("/auth/register")
            .json(&json!({
                "username": "alice2",
                "email": "alice@example.com",
                "password": "pw",
            }))
            .await;
        same_email.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = same_email.json();
        assert_eq!(body["detail"], "Email already registered");
    }

    #[tokio::test]
    async fn test_register_validates_email() {
        let server = setup_test_server().await;

        let response = server
            .post("/auth/register")
            .json(&json!({
                "username": "alice",
                "email": "not-an-email",
                "password": "pw",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_token_names_the_user() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;

        let claims = TokenService::new(TEST_SECRET, chrono::Duration::minutes(30))
            .verify(&token)
            .unwrap();
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let server = setup_test_server().await;
        register_and_login(&server, "alice").await;

        let wrong_password = server
            .post("/auth/login")
            .form(&[("username", "alice"), ("password", "nope")])
            .await;
        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = wrong_password.json();
        assert_eq!(body["detail"], "Incorrect username or password");

        let unknown_user = server
            .post("/auth/login")
            .form(&[("username", "mallory"), ("password", TEST_PASSWORD)])
            .await;
        unknown_user.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = unknown_user.json();
        assert_eq!(body["detail"], "Incorrect username or password");
    }

    #[tokio::test]
    async fn test_missing_token_is_not_authenticated() {
        let server = setup_test_server().await;

        let response = server.get("/projects").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.header(header::WWW_AUTHENTICATE), "Bearer");
        let body: Value = response.json();
        assert_eq!(body["detail"], "Not authenticated");
    }

    #[tokio::test]
    async fn test_malformed_and_forged_tokens_are_rejected() {
        let server = setup_test_server().await;
        register_and_login(&server, "alice").await;

        let malformed = server
            .get("/projects")
            .add_header(header::AUTHORIZATION, auth("not-a-jwt"))
            .await;
        malformed.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = malformed.json();
        assert_eq!(body["detail"], "Could not validate credentials");

        let forged = TokenService::new(b"someone-elses-secret", chrono::Duration::minutes(30))
            .issue("alice")
            .unwrap();
        let response = server
            .get("/projects")
            .add_header(header::AUTHORIZATION, auth(&forged))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let server = setup_test_server().await;
        register_and_login(&server, "alice").await;

        let now = Utc::now().timestamp();
        let expired = TokenService::new(TEST_SECRET, chrono::Duration::minutes(30))
            .sign(&Claims {
                sub: "alice".to_string(),
                iat: now - 3600,
                exp: now - 60,
            })
            .unwrap();

        let response = server
            .get("/projects")
            .add_header(header::AUTHORIZATION, auth(&expired))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["detail"], "Could not validate credentials");
    }

    #[tokio::test]
    async fn test_me_and_account_deletion() {
        let state = setup_test_app_state().await;
        let server = TestServer::new(create_router(state.clone())).unwrap();
        let token = register_and_login(&server, "alice").await;
        let project = create_project(&server, &token, "Alpha").await;
        create_requirement(&server, &token, id_of(&project), requirement_body("R1")).await;

        let me = server
            .get("/auth/me")
            .add_header(header::AUTHORIZATION, auth(&token))
            .await;
        me.assert_status_ok();
        let body: Value = me.json();
        assert_eq!(body["username"], "alice");

        server
            .delete("/auth/me")
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        // The token still verifies but its subject is gone.
        let after = server
            .get("/auth/me")
            .add_header(header::AUTHORIZATION, auth(&token))
            .await;
        after.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = after.json();
        assert_eq!(body["detail"], "User not found");

        assert_eq!(requirement::Entity::find().count(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_project_round_trip() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;

        let created = create_project(&server, &token, "Alpha").await;
        assert_eq!(created["status"], "Active");
        assert_eq!(created["description"], "test project");

        let fetched = server
            .get(&format!("/projects/{}", id_of(&created)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .await;
        fetched.assert_status_ok();
        let fetched: Value = fetched.json();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_project_duplicate_name_is_rejected() {
        let server = setup_test_server().await;
        let alice = register_and_login(&server, "alice").await;
        let bob = register_and_login(&server, "bob").await;
        create_project(&server, &alice, "Alpha").await;

        let response = server
            .post("/projects")
            .add_header(header::AUTHORIZATION, auth(&bob))
            .json(&json!({ "name": "Alpha" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["detail"], "Project name already exists");
    }

    #[tokio::test]
    async fn test_project_partial_update() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        let created = create_project(&server, &token, "Alpha").await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let response = server
            .put(&format!("/projects/{}", id_of(&created)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "status": "Completed" }))
            .await;
        response.assert_status_ok();
        let updated: Value = response.json();

        assert_eq!(updated["status"], "Completed");
        assert_eq!(updated["name"], "Alpha");
        assert_eq!(updated["description"], "test project");
        assert_eq!(updated["created_at"], created["created_at"]);
        let before: NaiveDateTime = serde_json::from_value(created["updated_at"].clone()).unwrap();
        let after: NaiveDateTime = serde_json::from_value(updated["updated_at"].clone()).unwrap();
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_projects_are_invisible_to_other_users() {
        let server = setup_test_server().await;
        let alice = register_and_login(&server, "alice").await;
        let bob = register_and_login(&server, "bob").await;
        let project = create_project(&server, &alice, "Alpha").await;
        let url = format!("/projects/{}", id_of(&project));

        server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&bob))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .put(&url)
            .add_header(header::AUTHORIZATION, auth(&bob))
            .json(&json!({ "name": "Stolen" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&url)
            .add_header(header::AUTHORIZATION, auth(&bob))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let listed: Vec<Value> = server
            .get("/projects")
            .add_header(header::AUTHORIZATION, auth(&bob))
            .await
            .json();
        assert!(listed.is_empty());

        // Still intact for the owner.
        let fetched: Value = server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .json();
        assert_eq!(fetched["name"], "Alpha");
    }

    #[tokio::test]
    async fn test_project_list_is_paginated() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        for name in ["A", "B", "C"] {
            create_project(&server, &token, name).await;
        }

        let first: Vec<Value> = server
            .get("/projects?page=0&page_size=2")
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        let second: Vec<Value> = server
            .get("/projects?page=1&page_size=2")
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0]["name"], "C");

        server
            .get("/projects?page_size=0")
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_without_paging_returns_every_row() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        for i in 0..60 {
            create_project(&server, &token, &format!("Project {:02}", i)).await;
        }

        let all: Vec<Value> = server
            .get("/projects")
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        assert_eq!(all.len(), 60);
        assert_eq!(all[59]["name"], "Project 59");

        let first_page: Vec<Value> = server
            .get("/projects?page=0")
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        assert_eq!(first_page.len(), 50);
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_page() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        create_project(&server, &token, "Alpha").await;

        for url in [
            format!("/projects?page={}", u64::MAX),
            format!("/projects?page={}&page_size=500", u64::MAX / 2),
            format!("/actores?page={}", u64::MAX),
            format!("/escenarios?page={}", u64::MAX),
        ] {
            server
                .get(&url)
                .add_header(header::AUTHORIZATION, auth(&token))
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }

        let far: Vec<Value> = server
            .get("/projects?page=1000000&page_size=500")
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        assert!(far.is_empty());
    }

    #[tokio::test]
    async fn test_project_update_null_clears_description() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        let created = create_project(&server, &token, "Alpha").await;
        let url = format!("/projects/{}", id_of(&created));

        let untouched: Value = server
            .put(&url)
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "name": "Alpha 2" }))
            .await
            .json();
        assert_eq!(untouched["description"], "test project");

        let response = server
            .put(&url)
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "description": null }))
            .await;
        response.assert_status_ok();
        let cleared: Value = response.json();
        assert!(cleared["description"].is_null());
        assert_eq!(cleared["name"], "Alpha 2");

        let fetched: Value = server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        assert!(fetched["description"].is_null());
    }

    #[tokio::test]
    async fn test_nullable_text_fields_can_be_cleared() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        let pid = id_of(&create_project(&server, &token, "Alpha").await);

        let mut body = requirement_body("R1");
        body["source"] = json!("Interview");
        body["notes"] = json!("Check with legal");
        let req = create_requirement(&server, &token, pid, body).await;
        let cleared: Value = server
            .put(&format!("/projects/{}/requisitos/{}", pid, id_of(&req)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "notes": null }))
            .await
            .json();
        assert!(cleared["notes"].is_null());
        assert_eq!(cleared["source"], "Interview");

        let mut body = use_case_body("U1", None);
        body["actors"] = json!("User");
        body["normal_flow"] = json!("1. Log in");
        let uc = create_use_case(&server, &token, pid, body).await;
        let cleared: Value = server
            .put(&format!("/projects/{}/casos_uso/{}", pid, id_of(&uc)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "actors": null }))
            .await
            .json();
        assert!(cleared["actors"].is_null());
        assert_eq!(cleared["normal_flow"], "1. Log in");

        let sc = create_scenario(&server, &token, id_of(&uc)).await;
        let cleared: Value = server
            .put(&format!("/escenarios/{}", id_of(&sc)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "expected_result": null }))
            .await
            .json();
        assert!(cleared["expected_result"].is_null());
        assert_eq!(cleared["name"], "Happy path");

        let response = server
            .post("/actores")
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "name": "Customer", "type": "Human", "description": "Buys things" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let actor: Value = response.json();
        let cleared: Value = server
            .put(&format!("/actores/{}", id_of(&actor)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "description": null }))
            .await
            .json();
        assert!(cleared["description"].is_null());
        assert_eq!(cleared["type"], "Human");
    }

    #[tokio::test]
    async fn test_project_delete_cascades() {
        let state = setup_test_app_state().await;
        let server = TestServer::new(create_router(state.clone())).unwrap();
        let token = register_and_login(&server, "alice").await;

        let project = create_project(&server, &token, "Alpha").await;
        let pid = id_of(&project);
        let req = create_requirement(&server, &token, pid, requirement_body("R1")).await;
        let uc = create_use_case(&server, &token, pid, use_case_body("U1", Some(id_of(&req)))).await;
        let sc = create_scenario(&server, &token, id_of(&uc)).await;
        server
            .post("/relaciones")
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "requirement_id": id_of(&req), "use_case_id": id_of(&uc) }))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .delete(&format!("/projects/{}", pid))
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        for url in [
            format!("/projects/{}", pid),
            format!("/projects/{}/requisitos/{}", pid, id_of(&req)),
            format!("/projects/{}/casos_uso/{}", pid, id_of(&uc)),
            format!("/escenarios/{}", id_of(&sc)),
        ] {
            server
                .get(&url)
                .add_header(header::AUTHORIZATION, auth(&token))
                .await
                .assert_status(StatusCode::NOT_FOUND);
        }

        assert_eq!(requirement::Entity::find().count(&state.db).await.unwrap(), 0);
        assert_eq!(use_case::Entity::find().count(&state.db).await.unwrap(), 0);
        assert_eq!(scenario::Entity::find().count(&state.db).await.unwrap(), 0);
        assert_eq!(requirement_use_case::Entity::find().count(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_requirement_round_trip() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        let pid = id_of(&create_project(&server, &token, "Alpha").await);

        let created = create_requirement(
            &server,
            &token,
            pid,
            json!({
                "name": "Response time",
                "description": "Pages load in under a second",
                "type": "Non-Functional",
                "priority": 3,
                "source": "Stakeholder workshop",
                "notes": "Measured at p95",
                "status": "Approved",
                "version": 2,
            }),
        )
        .await;

        assert_eq!(created["type"], "Non-Functional");
        assert_eq!(created["priority"], 3);
        assert_eq!(created["status"], "Approved");
        assert_eq!(created["version"], 2);
        assert_eq!(created["project_id"], pid);
        assert!(created["parent_id"].is_null());

        let fetched: Value = server
            .get(&format!("/projects/{}/requisitos/{}", pid, id_of(&created)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_requirement_defaults() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        let pid = id_of(&create_project(&server, &token, "Alpha").await);

        let created = create_requirement(&server, &token, pid, requirement_body("R1")).await;

        assert_eq!(created["priority"], 1);
        assert_eq!(created["version"], 1);
        assert_eq!(created["status"], "Proposed");
    }

    #[tokio::test]
    async fn test_requirement_under_foreign_project_is_not_found() {
        let server = setup_test_server().await;
        let alice = register_and_login(&server, "alice").await;
        let bob = register_and_login(&server, "bob").await;
        let pid = id_of(&create_project(&server, &alice, "Alpha").await);
        let req = create_requirement(&server, &alice, pid, requirement_body("R1")).await;

        server
            .post(&format!("/projects/{}/requisitos", pid))
            .add_header(header::AUTHORIZATION, auth(&bob))
            .json(&requirement_body("Intruder"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get(&format!("/projects/{}/requisitos", pid))
            .add_header(header::AUTHORIZATION, auth(&bob))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get(&format!("/projects/{}/requisitos/{}", pid, id_of(&req)))
            .add_header(header::AUTHORIZATION, auth(&bob))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_requirement_path_must_match_its_project() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        let alpha = id_of(&create_project(&server, &token, "Alpha").await);
        let beta = id_of(&create_project(&server, &token, "Beta").await);
        let req = create_requirement(&server, &token, alpha, requirement_body("R1")).await;

        let response = server
            .get(&format!("/projects/{}/requisitos/{}", beta, id_of(&req)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["detail"], "Requirement not found");
    }

    #[tokio::test]
    async fn test_requirement_tree() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        let alpha = id_of(&create_project(&server, &token, "Alpha").await);
        let beta = id_of(&create_project(&server, &token, "Beta").await);

        let root = create_requirement(&server, &token, alpha, requirement_body("Root")).await;
        let mut child_body = requirement_body("Child");
        child_body["parent_id"] = json!(id_of(&root));
        let child = create_requirement(&server, &token, alpha, child_body).await;
        assert_eq!(child["parent_id"], id_of(&root));

        let children: Vec<Value> = server
            .get(&format!("/projects/{}/requisitos/{}/children", alpha, id_of(&root)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["id"], id_of(&child));

        // Parent from another project.
        let foreign = create_requirement(&server, &token, beta, requirement_body("Foreign")).await;
        let mut bad_parent = requirement_body("Orphan");
        bad_parent["parent_id"] = json!(id_of(&foreign));
        server
            .post(&format!("/projects/{}/requisitos", alpha))
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&bad_parent)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Root under its own child.
        let cycle = server
            .put(&format!("/projects/{}/requisitos/{}", alpha, id_of(&root)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "parent_id": id_of(&child) }))
            .await;
        cycle.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = cycle.json();
        assert_eq!(body["detail"], "Requirement cannot be its own ancestor");

        server
            .put(&format!("/projects/{}/requisitos/{}", alpha, id_of(&root)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "parent_id": id_of(&root) }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Explicit null detaches, absent leaves the parent alone.
        let renamed: Value = server
            .put(&format!("/projects/{}/requisitos/{}", alpha, id_of(&child)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "name": "Renamed" }))
            .await
            .json();
        assert_eq!(renamed["parent_id"], id_of(&root));

        let detached: Value = server
            .put(&format!("/projects/{}/requisitos/{}", alpha, id_of(&child)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "parent_id": null }))
            .await
            .json();
        assert!(detached["parent_id"].is_null());
        assert_eq!(detached["name"], "Renamed");
    }

    #[tokio::test]
    async fn test_requirement_delete_cascades_to_dependents() {
        let state = setup_test_app_state().await;
        let server = TestServer::new(create_router(state.clone())).unwrap();
        let token = register_and_login(&server, "alice").await;
        let pid = id_of(&create_project(&server, &token, "Alpha").await);

        let root = create_requirement(&server, &token, pid, requirement_body("Root")).await;
        let mut child_body = requirement_body("Child");
        child_body["parent_id"] = json!(id_of(&root));
        let child = create_requirement(&server, &token, pid, child_body).await;
        let keep = create_requirement(&server, &token, pid, requirement_body("Keep")).await;
        let uc = create_use_case(&server, &token, pid, use_case_body("U1", Some(id_of(&child)))).await;
        create_scenario(&server, &token, id_of(&uc)).await;

        server
            .delete(&format!("/projects/{}/requisitos/{}", pid, id_of(&root)))
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let remaining: Vec<Value> = server
            .get(&format!("/projects/{}/requisitos", pid))
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["id"], id_of(&keep));
        assert_eq!(use_case::Entity::find().count(&state.db).await.unwrap(), 0);
        assert_eq!(scenario::Entity::find().count(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_use_case_round_trip_and_scoping() {
        let server = setup_test_server().await;
        let alice = register_and_login(&server, "alice").await;
        let bob = register_and_login(&server, "bob").await;
        let alpha = id_of(&create_project(&server, &alice, "Alpha").await);
        let beta = id_of(&create_project(&server, &alice, "Beta").await);
        let req = create_requirement(&server, &alice, alpha, requirement_body("R1")).await;

        let created = create_use_case(
            &server,
            &alice,
            alpha,
            json!({
                "title": "Sign in",
                "description": "User signs in",
                "actors": "User, Identity provider",
                "preconditions": "Account exists",
                "postconditions": "Session open",
                "normal_flow": "1. Enter credentials",
                "alternate_flow": "1a. Wrong password",
                "category": "Secondary",
                "status": "In-Development",
                "requirement_id": id_of(&req),
            }),
        )
        .await;
        assert_eq!(created["status"], "In-Development");
        assert_eq!(created["requirement_id"], id_of(&req));

        let url = format!("/projects/{}/casos_uso/{}", alpha, id_of(&created));
        let fetched: Value = server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .json();
        assert_eq!(fetched, created);

        server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&bob))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get(&format!("/projects/{}/casos_uso/{}", beta, id_of(&created)))
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Requirement of another project.
        server
            .post(&format!("/projects/{}/casos_uso", beta))
            .add_header(header::AUTHORIZATION, auth(&alice))
            .json(&use_case_body("Wrong", Some(id_of(&req))))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let updated: Value = server
            .put(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .json(&json!({ "status": "Validated", "requirement_id": null }))
            .await
            .json();
        assert_eq!(updated["status"], "Validated");
        assert!(updated["requirement_id"].is_null());
        assert_eq!(updated["title"], "Sign in");

        server
            .delete(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scenarios_are_scoped_through_their_use_case() {
        let server = setup_test_server().await;
        let alice = register_and_login(&server, "alice").await;
        let bob = register_and_login(&server, "bob").await;
        let alpha = id_of(&create_project(&server, &alice, "Alpha").await);
        let bobs = id_of(&create_project(&server, &bob, "Bobs").await);
        let uc1 = id_of(&create_use_case(&server, &alice, alpha, use_case_body("U1", None)).await);
        let uc2 = id_of(&create_use_case(&server, &alice, alpha, use_case_body("U2", None)).await);
        let bob_uc = id_of(&create_use_case(&server, &bob, bobs, use_case_body("B1", None)).await);

        let sc = create_scenario(&server, &alice, uc1).await;
        create_scenario(&server, &alice, uc2).await;
        create_scenario(&server, &bob, bob_uc).await;
        assert_eq!(sc["type"], "Normal");

        let mine: Vec<Value> = server
            .get("/escenarios")
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .json();
        assert_eq!(mine.len(), 2);

        let filtered: Vec<Value> = server
            .get(&format!("/escenarios?use_case_id={}", uc1))
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .json();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["id"], id_of(&sc));

        let url = format!("/escenarios/{}", id_of(&sc));
        let fetched: Value = server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .json();
        assert_eq!(fetched, sc);

        server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&bob))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .put(&url)
            .add_header(header::AUTHORIZATION, auth(&bob))
            .json(&json!({ "name": "Hijacked" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&url)
            .add_header(header::AUTHORIZATION, auth(&bob))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Neither creating under nor moving to a foreign use case is allowed.
        server
            .post("/escenarios")
            .add_header(header::AUTHORIZATION, auth(&bob))
            .json(&json!({ "use_case_id": uc1, "name": "X", "type": "Exception" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .put(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .json(&json!({ "use_case_id": bob_uc }))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let moved: Value = server
            .put(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .json(&json!({ "use_case_id": uc2, "type": "Alternative" }))
            .await
            .json();
        assert_eq!(moved["use_case_id"], uc2);
        assert_eq!(moved["type"], "Alternative");

        server
            .delete(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_actor_catalog_is_shared() {
        let server = setup_test_server().await;
        let alice = register_and_login(&server, "alice").await;
        let bob = register_and_login(&server, "bob").await;

        let response = server
            .post("/actores")
            .add_header(header::AUTHORIZATION, auth(&alice))
            .json(&json!({ "name": "Customer", "type": "Human" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let actor: Value = response.json();
        assert_eq!(actor["type"], "Human");
        let url = format!("/actores/{}", id_of(&actor));

        let seen_by_bob: Value = server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&bob))
            .await
            .json();
        assert_eq!(seen_by_bob, actor);

        let updated: Value = server
            .put(&url)
            .add_header(header::AUTHORIZATION, auth(&bob))
            .json(&json!({ "type": "External System", "description": "Payment gateway" }))
            .await
            .json();
        assert_eq!(updated["type"], "External System");
        assert_eq!(updated["name"], "Customer");

        let listed: Vec<Value> = server
            .get("/actores")
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .json();
        assert_eq!(listed.len(), 1);

        server
            .delete(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&alice))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .get("/actores")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_relations() {
        let server = setup_test_server().await;
        let token = register_and_login(&server, "alice").await;
        let pid = id_of(&create_project(&server, &token, "Alpha").await);
        let req = id_of(&create_requirement(&server, &token, pid, requirement_body("R1")).await);
        let uc = id_of(&create_use_case(&server, &token, pid, use_case_body("U1", None)).await);

        let response = server
            .post("/relaciones")
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "requirement_id": req, "use_case_id": uc }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let relation: Value = response.json();
        let url = format!("/relaciones/{}", id_of(&relation));

        let fetched: Value = server
            .get(&url)
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        assert_eq!(fetched, relation);

        let duplicate = server
            .post("/relaciones")
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "requirement_id": req, "use_case_id": uc }))
            .await;
        duplicate.assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/relaciones")
            .add_header(header::AUTHORIZATION, auth(&token))
            .json(&json!({ "requirement_id": 9999, "use_case_id": uc }))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .delete(&url)
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        let listed: Vec<Value> = server
            .get("/relaciones")
            .add_header(header::AUTHORIZATION, auth(&token))
            .await
            .json();
        assert!(listed.is_empty());
    }
}
