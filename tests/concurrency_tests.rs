mod common;

use anyhow::Result;
use common::{ADMIN_KEY, config_with_policies, default_config, owner_jwt, spawn_app};
use futures::future::join_all;
use serde_json::{Value, json};

#[tokio::test]
async fn concurrent_requests_respect_the_limit_exactly() -> Result<()> {
    let app = spawn_app(&config_with_policies(
        r#"    - name: api
      path: /api
      requests: 5
      period: 1m"#,
    ))
    .await;

    let requests = (0..20).map(|_| {
        app.client
            .get(app.url("/api/admin/runtime"))
            .bearer_auth(ADMIN_KEY)
            .send()
    });
    let statuses: Vec<u16> = join_all(requests)
        .await
        .into_iter()
        .map(|res| res.unwrap().status().as_u16())
        .collect();

    assert_eq!(statuses.iter().filter(|&&s| s == 200).count(), 5);
    assert_eq!(statuses.iter().filter(|&&s| s == 429).count(), 15);
    Ok(())
}

#[tokio::test]
async fn concurrent_connection_writes_all_land() -> Result<()> {
    let app = spawn_app(&default_config()).await;
    let org = app.create_organization("Acme").await;
    let owner = owner_jwt(org);

    let mut handles = Vec::new();
    for platform in ["instagram", "facebook", "tiktok"] {
        let client = app.client.clone();
        let url = app.url(&format!("/api/organizations/{org}/connections/{platform}"));
        let token = owner.clone();
        handles.push(tokio::spawn(async move {
            client
                .put(url)
                .bearer_auth(token)
                .json(&json!({ "account_id": format!("{platform}-account"), "access_token": "t" }))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await?, 200);
    }

    let list: Vec<Value> = app
        .client
        .get(app.url(&format!("/api/organizations/{org}/connections")))
        .bearer_auth(&owner)
        .send()
        .await?
        .json()
        .await?;
    let platforms: Vec<&str> = list.iter().map(|c| c["platform"].as_str().unwrap()).collect();
    assert_eq!(platforms, ["facebook", "instagram", "tiktok"]);
    Ok(())
}
