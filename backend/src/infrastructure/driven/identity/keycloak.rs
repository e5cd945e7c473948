use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::application::ports::{AccountSpec, IdentityProvider, IdentityProviderError};
use crate::domain::BearerToken;

#[derive(Debug, Clone)]
pub struct KeycloakSettings {
    pub base_url: Url,
    pub realm: String,
    pub admin_token: BearerToken,
    pub timeout: Duration,
}

/// Keycloak admin REST client for the user accounts mirrored from the store.
pub struct KeycloakIdentityProvider {
    settings: KeycloakSettings,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRepresentation<'a> {
    username: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    enabled: bool,
    email_verified: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    credentials: Vec<CredentialRepresentation<'a>>,
}

#[derive(Serialize)]
struct CredentialRepresentation<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
    temporary: bool,
}

#[derive(Deserialize)]
struct AccountRef {
    id: String,
}

impl<'a> UserRepresentation<'a> {
    fn from_spec(account: &'a AccountSpec) -> Self {
        Self {
            username: &account.username,
            first_name: &account.first_name,
            last_name: &account.last_name,
            email: &account.email,
            enabled: account.enabled,
            email_verified: true,
            credentials: account
                .password
                .iter()
                .map(|password| CredentialRepresentation {
                    kind: "password",
                    value: password.expose(),
                    temporary: false,
                })
                .collect(),
        }
    }
}

impl KeycloakIdentityProvider {
    pub fn new(settings: KeycloakSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { settings, client })
    }

    fn users_url(&self, tail: &[&str]) -> Result<Url, IdentityProviderError> {
        let mut url = self.settings.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IdentityProviderError::Transport("identity base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["admin", "realms", self.settings.realm.as_str(), "users"])
            .extend(tail);
        Ok(url)
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Response, IdentityProviderError> {
        let response = request
            .bearer_auth(self.settings.admin_token.expose())
            .send()
            .await
            .map_err(|e| IdentityProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityProviderError::Rejected { operation, status: status.as_u16() });
        }
        Ok(response)
    }

    async fn account_id(&self, username: &str) -> Result<String, IdentityProviderError> {
        let mut url = self.users_url(&[])?;
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("exact", "true");

        let matches: Vec<AccountRef> = self
            .send("lookup", self.client.get(url))
            .await?
            .json()
            .await
            .map_err(|e| IdentityProviderError::Transport(e.to_string()))?;

        matches
            .into_iter()
            .next()
            .map(|account| account.id)
            .ok_or_else(|| IdentityProviderError::AccountNotFound(username.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for KeycloakIdentityProvider {
    async fn create_account(&self, account: AccountSpec) -> Result<(), IdentityProviderError> {
        let url = self.users_url(&[])?;
        self.send("create", self.client.post(url).json(&UserRepresentation::from_spec(&account)))
            .await?;
        info!(username = %account.username, "identity account created");
        Ok(())
    }

    async fn update_account(&self, account: AccountSpec) -> Result<(), IdentityProviderError> {
        let id = self.account_id(&account.username).await?;
        let url = self.users_url(&[&id])?;
        self.send("update", self.client.put(url).json(&UserRepresentation::from_spec(&account)))
            .await?;
        debug!(username = %account.username, "identity account updated");
        Ok(())
    }

    /// Removes the account so its username can be provisioned again; the
    /// store keeps the tombstoned record.
    async fn deactivate_account(&self, username: String) -> Result<(), IdentityProviderError> {
        let id = self.account_id(&username).await?;
        let url = self.users_url(&[&id])?;
        self.send("deactivate", self.client.delete(url)).await?;
        info!(%username, "identity account removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    use crate::domain::Password;

    /// Admin API of a single realm; usernames are unique like in Keycloak.
    #[derive(Clone, Default)]
    struct Realm {
        accounts: Arc<Mutex<Vec<(String, Value)>>>,
        next_id: Arc<AtomicUsize>,
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer admin-token")
    }

    async fn create(State(realm): State<Realm>, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED;
        }
        let mut accounts = realm.accounts.lock();
        if accounts.iter().any(|(_, account)| account["username"] == body["username"]) {
            return StatusCode::CONFLICT;
        }
        let id = format!("kc-{}", realm.next_id.fetch_add(1, Ordering::SeqCst));
        accounts.push((id, body));
        StatusCode::CREATED
    }

    async fn lookup(State(realm): State<Realm>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        if params.get("exact").map(String::as_str) != Some("true") {
            return Json(json!([]));
        }
        let username = params.get("username").cloned().unwrap_or_default();
        let matches: Vec<Value> = realm
            .accounts
            .lock()
            .iter()
            .filter(|(_, account)| account["username"] == username.as_str())
            .map(|(id, account)| json!({ "id": id, "username": account["username"] }))
            .collect();
        Json(Value::Array(matches))
    }

    async fn replace(
        State(realm): State<Realm>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(body): Json<Value>,
    ) -> StatusCode {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED;
        }
        match realm.accounts.lock().iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, account)) => {
                *account = body;
                StatusCode::NO_CONTENT
            }
            None => StatusCode::NOT_FOUND,
        }
    }

    async fn remove(State(realm): State<Realm>, headers: HeaderMap, Path(id): Path<String>) -> StatusCode {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED;
        }
        let mut accounts = realm.accounts.lock();
        let before = accounts.len();
        accounts.retain(|(existing, _)| *existing != id);
        if accounts.len() < before {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::NOT_FOUND
        }
    }

    async fn provider() -> (KeycloakIdentityProvider, Realm) {
        let realm = Realm::default();
        let app = Router::new()
            .route("/auth/admin/realms/staff/users", get(lookup).post(create))
            .route("/auth/admin/realms/staff/users/:id", put(replace).delete(remove))
            .with_state(realm.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let provider = KeycloakIdentityProvider::new(KeycloakSettings {
            base_url: Url::parse(&format!("http://{addr}/auth/")).unwrap(),
            realm: "staff".to_string(),
            admin_token: BearerToken::new("admin-token"),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        (provider, realm)
    }

    fn account(username: &str, password: Option<&str>) -> AccountSpec {
        AccountSpec {
            username: username.to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            email: "alice@example.com".to_string(),
            enabled: true,
            password: password.map(|p| Password::new(p.to_string()).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_create_sends_password_credential() {
        let (provider, realm) = provider().await;

        provider.create_account(account("alice", Some("s3cret"))).await.unwrap();

        let accounts = realm.accounts.lock();
        assert_eq!(accounts[0].1["firstName"], "Alice");
        assert_eq!(accounts[0].1["credentials"][0]["type"], "password");
        assert_eq!(accounts[0].1["credentials"][0]["value"], "s3cret");
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let (provider, _) = provider().await;
        provider.create_account(account("alice", Some("pw"))).await.unwrap();

        let error = provider.create_account(account("alice", Some("pw"))).await.unwrap_err();

        assert!(matches!(error, IdentityProviderError::Rejected { operation: "create", status: 409 }));
    }

    #[tokio::test]
    async fn test_update_targets_looked_up_account() {
        let (provider, realm) = provider().await;
        provider.create_account(account("alice", Some("pw"))).await.unwrap();

        let changed = AccountSpec { first_name: "Alicia".to_string(), ..account("alice", None) };
        provider.update_account(changed).await.unwrap();

        let accounts = realm.accounts.lock();
        assert_eq!(accounts[0].0, "kc-0");
        assert_eq!(accounts[0].1["firstName"], "Alicia");
        assert!(accounts[0].1.get("credentials").is_none());
    }

    #[tokio::test]
    async fn test_deactivated_username_can_be_provisioned_again() {
        let (provider, realm) = provider().await;
        provider.create_account(account("alice", Some("pw"))).await.unwrap();

        provider.deactivate_account("alice".to_string()).await.unwrap();
        assert!(realm.accounts.lock().is_empty());

        provider.create_account(account("alice", Some("pw2"))).await.unwrap();
        let accounts = realm.accounts.lock();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].0, "kc-1");
    }

    #[tokio::test]
    async fn test_unknown_account_is_reported() {
        let (provider, _) = provider().await;

        let error = provider.deactivate_account("ghost".to_string()).await.unwrap_err();

        assert!(matches!(error, IdentityProviderError::AccountNotFound(name) if name == "ghost"));
    }
}
