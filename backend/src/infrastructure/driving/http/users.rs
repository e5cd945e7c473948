use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use shared::ResponseWrapper;

use super::middleware::CallerToken;
use crate::application::{FieldViolation, UserInput, UserServiceError, UserView};
use crate::infrastructure::AppState;

type Reply<T> = Result<(StatusCode, Json<ResponseWrapper<T>>), UserServiceError>;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_user))
        .route("/read/all", get(read_all_users))
        .route("/read/:username", get(read_user))
        .route("/check/:username", get(check_user))
        .route("/update/:username", put(update_user))
        .route("/delete/:username", delete(delete_user))
}

fn reply<T>(status: StatusCode, message: &str, data: T) -> Reply<T> {
    Ok((status, Json(ResponseWrapper::ok(status.as_u16(), message, data))))
}

fn unreadable_body(rejection: JsonRejection) -> UserServiceError {
    UserServiceError::ValidationFailed(vec![FieldViolation {
        field: "body",
        rejected_value: None,
        reason: rejection.body_text(),
    }])
}

async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Reply<UserView> {
    let Json(input) = payload.map_err(unreadable_body)?;
    let user = state.users.create(input).await?;
    reply(StatusCode::CREATED, "User is successfully created.", user)
}

async fn read_user(State(state): State<AppState>, Path(username): Path<String>) -> Reply<UserView> {
    let user = state.users.read_by_username(&username).await?;
    reply(StatusCode::OK, "User is successfully retrieved", user)
}

async fn read_all_users(State(state): State<AppState>) -> Reply<Vec<UserView>> {
    let users = state.users.read_all().await?;
    reply(StatusCode::OK, "Users are successfully retrieved.", users)
}

async fn check_user(State(state): State<AppState>, Path(username): Path<String>) -> Reply<bool> {
    if !state.users.exists(&username).await? {
        return Err(UserServiceError::NotFound);
    }
    reply(StatusCode::OK, "User exists.", true)
}

async fn update_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Reply<UserView> {
    let Json(input) = payload.map_err(unreadable_body)?;
    let user = state.users.update(&username, input).await?;
    reply(StatusCode::OK, "User is successfully updated.", user)
}

async fn delete_user(
    State(state): State<AppState>,
    CallerToken(token): CallerToken,
    Path(username): Path<String>,
) -> Result<StatusCode, UserServiceError> {
    state.users.delete(&username, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::application::ports::{MockIdentityProvider, MockRemoteCountGateway, RemoteCountGateway};
    use crate::application::UserLifecycleCoordinator;
    use crate::domain::{CountFailure, RemoteCountQuery, RemoteCountResult};
    use crate::infrastructure::driven::persistence::InMemoryUserRepository;
    use crate::infrastructure::driving::http::router;
    use crate::infrastructure::AppState;

    fn app(gateway: MockRemoteCountGateway) -> axum::Router {
        let mut identity = MockIdentityProvider::new();
        identity.expect_create_account().returning(|_| Ok(()));
        identity.expect_update_account().returning(|_| Ok(()));
        identity.expect_deactivate_account().returning(|_| Ok(()));
        app_with(identity, Arc::new(gateway), Duration::from_secs(5))
    }

    fn app_with(
        identity: MockIdentityProvider,
        gateway: Arc<dyn RemoteCountGateway>,
        request_timeout: Duration,
    ) -> axum::Router {
        let users = UserLifecycleCoordinator::new(Arc::new(InMemoryUserRepository::new()), Arc::new(identity), gateway);
        router(AppState { users: Arc::new(users) }, request_timeout)
    }

    /// Never answers; records when the pending lookup is dropped.
    #[derive(Default)]
    struct StalledGateway {
        abandoned: Arc<AtomicBool>,
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RemoteCountGateway for StalledGateway {
        async fn get_count(&self, _query: RemoteCountQuery) -> RemoteCountResult {
            let _guard = SetOnDrop(self.abandoned.clone());
            tokio::time::sleep(Duration::from_secs(30)).await;
            RemoteCountResult::Success(0)
        }
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", "Bearer caller-token");
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &axum::Router, request: Request<Body>) -> (u16, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status().as_u16();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    fn user(username: &str, first_name: &str, role: &str) -> Value {
        json!({
            "username": username,
            "firstName": first_name,
            "lastName": "Tester",
            "email": format!("{username}@example.com"),
            "role": role,
            "password": "Abc1!"
        })
    }

    #[tokio::test]
    async fn test_create_then_read() {
        let app = app(MockRemoteCountGateway::new());

        let (status, created) = send(&app, request("POST", "/api/v1/user/create", Some(user("alice", "Alice", "Admin")))).await;
        assert_eq!(status, 201);
        assert_eq!(created["message"], "User is successfully created.");
        assert!(created["data"].get("password").is_none());

        let (status, read) = send(&app, request("GET", "/api/v1/user/read/alice", None)).await;
        assert_eq!(status, 200);
        assert_eq!(read["data"]["firstName"], "Alice");
        assert_eq!(read["data"]["role"], "Admin");
    }

    #[tokio::test]
    async fn test_read_all_is_not_captured_by_username_route() {
        let app = app(MockRemoteCountGateway::new());
        send(&app, request("POST", "/api/v1/user/create", Some(user("zed", "Zed", "Admin")))).await;
        send(&app, request("POST", "/api/v1/user/create", Some(user("amy", "Amy", "Admin")))).await;

        let (status, all) = send(&app, request("GET", "/api/v1/user/read/all", None)).await;

        assert_eq!(status, 200);
        assert_eq!(all["data"][0]["username"], "amy");
        assert_eq!(all["data"][1]["username"], "zed");
    }

    #[tokio::test]
    async fn test_check_reports_absence_as_not_found() {
        let app = app(MockRemoteCountGateway::new());
        send(&app, request("POST", "/api/v1/user/create", Some(user("alice", "Alice", "Admin")))).await;

        let (status, found) = send(&app, request("GET", "/api/v1/user/check/alice", None)).await;
        assert_eq!(status, 200);
        assert_eq!(found["data"], true);

        let (status, _) = send(&app, request("GET", "/api/v1/user/check/nobody", None)).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let app = app(MockRemoteCountGateway::new());
        send(&app, request("POST", "/api/v1/user/create", Some(user("alice", "Alice", "Admin")))).await;

        let (status, json) = send(&app, request("POST", "/api/v1/user/create", Some(user("alice", "Alice", "Admin")))).await;

        assert_eq!(status, 409);
        assert_eq!(json["message"], "User already exists.");
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_with_violations() {
        let app = app(MockRemoteCountGateway::new());

        let (status, json) = send(&app, request("POST", "/api/v1/user/create", Some(json!({ "username": "x" })))).await;

        assert_eq!(status, 400);
        assert_eq!(json["message"], "Invalid Input(s)");
        assert!(json["errorCount"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_a_bad_request() {
        let app = app(MockRemoteCountGateway::new());
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/user/create")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, _) = send(&app, request).await;

        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_update_changes_profile() {
        let app = app(MockRemoteCountGateway::new());
        send(&app, request("POST", "/api/v1/user/create", Some(user("alice", "Alice", "Admin")))).await;

        let mut changed = user("ignored", "Alicia", "Admin");
        changed["password"] = json!("");
        let (status, json) = send(&app, request("PUT", "/api/v1/user/update/alice", Some(changed))).await;

        assert_eq!(status, 200);
        assert_eq!(json["data"]["username"], "alice");
        assert_eq!(json["data"]["firstName"], "Alicia");
    }

    #[tokio::test]
    async fn test_delete_requires_bearer_credential() {
        let app = app(MockRemoteCountGateway::new());
        send(&app, request("POST", "/api/v1/user/create", Some(user("alice", "Alice", "Admin")))).await;
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/v1/user/delete/alice")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(&app, request).await;

        assert_eq!(status, 403);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_active_projects() {
        let mut gateway = MockRemoteCountGateway::new();
        gateway
            .expect_get_count()
            .withf(|query| query.owner == "bob" && query.auth.expose() == "caller-token")
            .returning(|_| RemoteCountResult::Success(2));
        let app = app(gateway);
        send(&app, request("POST", "/api/v1/user/create", Some(user("bob", "Bob", "Manager")))).await;

        let (status, json) = send(&app, request("DELETE", "/api/v1/user/delete/bob", None)).await;

        assert_eq!(status, 409);
        assert_eq!(json["message"], "User can not be deleted. User is linked to 2 active project(s)");
    }

    #[tokio::test]
    async fn test_delete_with_unknown_count_is_unavailable() {
        let mut gateway = MockRemoteCountGateway::new();
        gateway
            .expect_get_count()
            .returning(|_| RemoteCountResult::Failure(CountFailure::Timeout));
        let app = app(gateway);
        send(&app, request("POST", "/api/v1/user/create", Some(user("carol", "Carol", "Employee")))).await;

        let (status, _) = send(&app, request("DELETE", "/api/v1/user/delete/carol", None)).await;
        assert_eq!(status, 503);

        let (status, _) = send(&app, request("GET", "/api/v1/user/read/carol", None)).await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_delete_admin_succeeds_without_count() {
        let app = app(MockRemoteCountGateway::new());
        send(&app, request("POST", "/api/v1/user/create", Some(user("alice", "Alice", "Admin")))).await;

        let (status, _) = send(&app, request("DELETE", "/api/v1/user/delete/alice", None)).await;
        assert_eq!(status, 204);

        let (status, _) = send(&app, request("GET", "/api/v1/user/read/alice", None)).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(MockRemoteCountGateway::new());
        let (status, json) = send(&app, request("GET", "/health", None)).await;
        assert_eq!(status, 200);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_request_timeout_abandons_lookup_and_keeps_user() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_create_account().returning(|_| Ok(()));
        identity.expect_deactivate_account().times(0);
        let gateway = StalledGateway::default();
        let abandoned = gateway.abandoned.clone();
        let app = app_with(identity, Arc::new(gateway), Duration::from_millis(100));
        send(&app, request("POST", "/api/v1/user/create", Some(user("carol", "Carol", "Manager")))).await;

        let (status, _) = send(&app, request("DELETE", "/api/v1/user/delete/carol", None)).await;

        assert_eq!(status, 408);
        assert!(abandoned.load(Ordering::SeqCst));
        let (status, json) = send(&app, request("GET", "/api/v1/user/check/carol", None)).await;
        assert_eq!(status, 200);
        assert_eq!(json["data"], true);
    }
}
