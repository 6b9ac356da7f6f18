mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{request, send, Fixture};

const ALICE: Option<(&str, &str)> = Some(("alice", "t1"));

async fn fixture_with_api_access() -> Result<Fixture> {
    let fx = Fixture::new()?;
    fx.grant(
        "t1",
        "alice",
        &[
            ("token api", "/api/tokens*", "POST"),
            ("menu api", "/api/menu/*", "GET"),
            ("Users", "SIDE_MENU/admin/users", "SHOW"),
        ],
    )
    .await;
    Ok(fx)
}

#[tokio::test]
async fn health_reports_store_state() -> Result<()> {
    let fx = Fixture::new()?;
    let app = fx.app();

    let (status, body) = send(&app, request("GET", "/health", None, None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ephemeral_keys"], true);

    fx.store.set_unavailable(true);
    let (status, _) = send(&app, request("GET", "/health", None, None)).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn missing_principal_is_unauthorized() -> Result<()> {
    let fx = fixture_with_api_access().await?;
    let (status, body) = send(&fx.app(), request("GET", "/api/menu/admin", None, None)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn principal_without_authority_is_forbidden() -> Result<()> {
    let fx = fixture_with_api_access().await?;
    let (status, body) = send(
        &fx.app(),
        request("POST", "/api/tokens", Some(("mallory", "t1")), Some(json!({"subject": "bob", "type": "INVITE"}))),
    )
    .await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn issue_introspect_consume_flow() -> Result<()> {
    let fx = fixture_with_api_access().await?;
    let app = fx.app();

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/tokens",
            ALICE,
            Some(json!({"subject": "bob", "type": "INVITE", "scope": ["invite:accept"]})),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["data"]["token"].as_str().expect("token string").to_string();

    let (status, body) = send(&app, request("POST", "/api/tokens/introspect", ALICE, Some(json!({"token": token})))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], true);

    let (status, body) = send(&app, request("POST", "/api/tokens/consume", ALICE, Some(json!({"token": token})))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["consumed"], true);

    let (status, body) = send(&app, request("POST", "/api/tokens/consume", ALICE, Some(json!({"token": token})))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TOKEN_REPLAYED");
    Ok(())
}

#[tokio::test]
async fn token_from_another_tenant_is_inactive_and_unconsumable() -> Result<()> {
    let fx = fixture_with_api_access().await?;
    fx.grant("t2", "alice", &[("token api", "/api/tokens*", "POST")]).await;
    let token = fx.issue("t1", "bob").await?;
    let app = fx.app();

    let other_tenant = Some(("alice", "t2"));
    let (status, body) = send(&app, request("POST", "/api/tokens/introspect", other_tenant, Some(json!({"token": token})))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], false);

    let (status, _) = send(&app, request("POST", "/api/tokens/consume", other_tenant, Some(json!({"token": token})))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn store_outage_surfaces_as_service_unavailable() -> Result<()> {
    let fx = fixture_with_api_access().await?;
    fx.store.set_unavailable(true);

    let (status, body) = send(
        &fx.app(),
        request("POST", "/api/tokens", ALICE, Some(json!({"subject": "bob", "type": "INVITE"}))),
    )
    .await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}

#[tokio::test]
async fn menu_endpoint_returns_resolved_items() -> Result<()> {
    let fx = fixture_with_api_access().await?;
    let (status, body) = send(&fx.app(), request("GET", "/api/menu/admin", ALICE, None)).await?;

    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().expect("menu array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["url"], "SIDE_MENU/admin/users");
    Ok(())
}
