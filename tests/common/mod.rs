#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use jsonwebtoken::{EncodingKey, Header, encode};
use markethub::{
    app::{create_app, metrics_pair},
    config::{ApiKeyStore, AppConfig, SecretsConfig},
    features::tenants::InMemoryRepository,
    state::AppState,
};
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

pub const JWT_SECRET: &str = "a-very-long-and-random-string-that-is-hard-to-guess";
pub const ADMIN_KEY: &str = "admin-key";
pub const REVOKED_KEY: &str = "revoked-key";

const KEY_STORE: &str = r#"
keys:
  admin-key:
    user_id: ops
    roles: [admin]
  revoked-key:
    user_id: former-ops
    roles: [admin]
    status: revoked
"#;

/// Config with generous limits so only rate-limit tests ever hit them.
pub fn config_with_policies(policies: &str) -> String {
    format!(
        r#"
server:
  addr: "127.0.0.1:0"
identity:
  api_key_store_path: "unused.yaml"
  mode: Either
rate_limits:
  policies:
{policies}
"#
    )
}

/// Default limits with Prometheus enabled. The recorder is process-global,
/// so only one test per binary may use this.
pub fn metrics_config() -> String {
    format!("{}observability:\n  metrics:\n    enabled: true\n", default_config())
}

pub fn default_config() -> String {
    config_with_policies(
        r#"    - name: api
      path: /api
      requests: 10000
      period: 1m"#,
    )
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Creates an organization as platform admin and returns its id.
    pub async fn create_organization(&self, name: &str) -> Uuid {
        let res = self
            .client
            .post(self.url("/api/organizations"))
            .bearer_auth(ADMIN_KEY)
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201, "creating organization {name}");
        let body: serde_json::Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().parse().unwrap()
    }
}

pub async fn spawn_app(config_yaml: &str) -> TestApp {
    let config = AppConfig::from_yaml_str(config_yaml).expect("test config must parse");
    let (prometheus_layer, prometheus_handle) = metrics_pair(&config);
    let key_store = ApiKeyStore::from_yaml_str(KEY_STORE).unwrap();
    let secrets = SecretsConfig {
        jwt_secret: JWT_SECRET.to_string(),
    };
    let state = Arc::new(AppState::new(
        config,
        secrets,
        key_store,
        Arc::new(InMemoryRepository::new()),
        prometheus_handle,
    ));

    let mut app = create_app(state).unwrap();
    if let Some(layer) = prometheus_layer {
        app = app.layer(layer);
    }
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
    }
}

pub fn generate_jwt(sub: &str, org: Option<Uuid>, roles: Vec<&str>, ttl_secs: i64) -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    let claims = json!({
        "sub": sub,
        "org": org.map(|id| id.to_string()),
        "roles": roles,
        "exp": now + ttl_secs,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_ref()),
    )
    .unwrap()
}

pub fn owner_jwt(org: Uuid) -> String {
    generate_jwt("owner-user", Some(org), vec!["owner"], 3600)
}

pub fn member_jwt(org: Uuid) -> String {
    generate_jwt("member-user", Some(org), vec!["member"], 3600)
}
