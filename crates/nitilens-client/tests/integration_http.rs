//! HTTP integration tests for the subscription client
//!
//! Run against a wiremock server standing in for the subscription API.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nitilens_client::{
    CacheConfig, CachedUsageSource, ClientConfig, ClientError, SessionToken, SubscriptionClient,
    UsageSource,
};
use nitilens_types::{FeatureKey, Limit, PlanTier, ResourceKey, SubscriptionStatus};

// ============================================================================
// Helpers
// ============================================================================

fn token() -> SessionToken {
    SessionToken::new("test-token").unwrap()
}

fn client_for(server: &MockServer) -> SubscriptionClient {
    SubscriptionClient::new(ClientConfig::new(server.uri())).unwrap()
}

fn usage_body(plan: &str, remediation: bool) -> serde_json::Value {
    json!({
        "plan": {"name": plan, "price_monthly": 299.0},
        "subscription": {
            "status": "active",
            "started_at": "2025-01-01T00:00:00",
            "expires_at": "2026-01-01T00:00:00",
            "auto_renew": true
        },
        "limits": {
            "policies": {"current": 9, "limit": 10, "percentage": 90.0},
            "transactions": {"current": 1000, "limit": 1000000, "percentage": 0.1},
            "users": {"current": 2, "limit": 20, "percentage": 10.0}
        },
        "features": {
            "anomaly_detection": true,
            "remediation": remediation,
            "regulatory_mapping": true,
            "monitoring": true,
            "policy_impact": true,
            "multi_language": true
        }
    })
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_usage_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_body("pro", true)))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client_for(&server).usage(&token()).await.unwrap();

    assert!(snapshot.is_well_formed());
    assert!(snapshot.features.get(FeatureKey::Remediation));
    let limits = snapshot.limits.unwrap();
    assert_eq!(limits.get(ResourceKey::Policies).unwrap().current, 9);
}

#[tokio::test]
async fn test_plans_parse_unlimited_sentinel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "basic",
                "max_policies": 1,
                "max_transactions_per_month": 10000,
                "max_users": 3,
                "price_monthly": 0.0,
                "features": {}
            },
            {
                "name": "enterprise",
                "max_policies": "unlimited",
                "max_transactions_per_month": "unlimited",
                "max_users": "Unlimited",
                "price_monthly": 999.0,
                "features": {"remediation": true}
            }
        ])))
        .mount(&server)
        .await;

    let plans = client_for(&server).plans(&token()).await.unwrap();

    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].name, PlanTier::Basic);
    assert!(!plans[0].features.remediation);
    assert_eq!(plans[1].max_policies, Limit::Unlimited);
    assert_eq!(plans[1].max_transactions_per_month, Limit::Unlimited);
}

#[tokio::test]
async fn test_current_subscription() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscription_id": "0b6f1c1e-8f55-4f0e-9a8e-2f4f5b0e8d11",
            "plan": {
                "name": "pro",
                "max_policies": 10,
                "max_transactions_per_month": 1000000,
                "max_users": 20,
                "price_monthly": 299.0,
                "features": {"remediation": true}
            },
            "status": "active",
            "started_at": "2025-01-01T00:00:00Z",
            "expires_at": "2026-01-01T00:00:00Z",
            "auto_renew": true
        })))
        .mount(&server)
        .await;

    let current = client_for(&server).current(&token()).await.unwrap();

    assert_eq!(current.plan.name, PlanTier::Pro);
    assert_eq!(current.status, SubscriptionStatus::Active);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unauthorized_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid session token"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).usage(&token()).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.detail("fallback"), "Invalid session token");
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).usage(&token()).await.unwrap_err();

    assert_eq!(
        err,
        ClientError::Status {
            status: 503,
            detail: None
        }
    );
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).usage(&token()).await.unwrap_err();

    assert!(matches!(err, ClientError::Malformed(_)));
}

#[tokio::test]
async fn test_negative_limit_is_malformed() {
    let server = MockServer::start().await;
    let mut body = usage_body("pro", true);
    body["limits"]["users"]["limit"] = json!(-7);
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = client_for(&server).usage(&token()).await.unwrap_err();

    assert!(matches!(err, ClientError::Malformed(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = SubscriptionClient::new(ClientConfig::new(uri)).unwrap();
    let err = client.usage(&token()).await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_upgrade_posts_plan_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/upgrade"))
        .and(body_json(json!({"plan_name": "enterprise"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_body("enterprise", true)))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client_for(&server)
        .upgrade(&token(), PlanTier::Enterprise)
        .await
        .unwrap();

    assert_eq!(snapshot.plan_name(), Some("enterprise"));
}

#[tokio::test]
async fn test_upgrade_invalid_plan_surfaces_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/upgrade"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid plan name"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .upgrade_to(&token(), "platinum")
        .await
        .unwrap_err();

    assert_eq!(err.detail("Failed to upgrade plan"), "Invalid plan name");
}

#[tokio::test]
async fn test_cancel_returns_subscription() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscription_id": "0b6f1c1e-8f55-4f0e-9a8e-2f4f5b0e8d11",
            "tenant_id": "5d1c2b8a-3e4f-4a6b-8c9d-0e1f2a3b4c5d",
            "plan": "pro",
            "status": "active",
            "started_at": "2025-01-01T00:00:00Z",
            "expires_at": "2026-01-01T00:00:00Z",
            "auto_renew": false
        })))
        .mount(&server)
        .await;

    let subscription = client_for(&server).cancel(&token()).await.unwrap();

    assert!(!subscription.auto_renew);
    assert!(subscription.status.is_active());
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn test_cached_source_shares_one_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_body("pro", true)))
        .expect(1)
        .mount(&server)
        .await;

    let cached = CachedUsageSource::new(client_for(&server), CacheConfig::default());

    let first = cached.fetch_usage(&token()).await.unwrap();
    let second = cached.fetch_usage(&token()).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cached_source_does_not_cache_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let cached = CachedUsageSource::new(client_for(&server), CacheConfig::default());

    assert!(cached.fetch_usage(&token()).await.is_err());
    assert!(cached.fetch_usage(&token()).await.is_err());
}

#[tokio::test]
async fn test_cached_source_invalidates_on_upgrade() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_body("pro", true)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/upgrade"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_body("enterprise", true)))
        .expect(1)
        .mount(&server)
        .await;

    let cached = CachedUsageSource::new(client_for(&server), CacheConfig::default());

    cached.fetch_usage(&token()).await.unwrap();
    cached.upgrade(&token(), PlanTier::Enterprise).await.unwrap();
    cached.fetch_usage(&token()).await.unwrap();
}
