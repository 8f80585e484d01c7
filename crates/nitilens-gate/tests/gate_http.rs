//! Feature gate and subscription page against a mocked subscription API
//!
//! Request counts are asserted through wiremock expectations, which are
//! verified when each `MockServer` drops.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nitilens_client::{
    CacheConfig, CachedUsageSource, ClientConfig, SessionContext, SubscriptionClient, UsageSource,
};
use nitilens_gate::{
    FeatureGate, GateState, GatedContent, InputOutcome, LockReason, Notice, PageState,
    SubscriptionPage,
};
use nitilens_types::{FeatureKey, PlanTier, ResourceKey};

// ============================================================================
// Fixtures
// ============================================================================

/// Content that counts its own data requests
#[derive(Default)]
struct CasesTable {
    requests_fired: usize,
    selected: Option<u32>,
}

impl GatedContent for CasesTable {
    type View = String;
    type Input = u32;

    fn mount(&mut self) {
        self.requests_fired += 1;
    }

    fn render(&self) -> String {
        match self.selected {
            Some(id) => format!("cases (selected {id})"),
            None => "cases".to_string(),
        }
    }

    fn handle_input(&mut self, case_id: u32) {
        self.selected = Some(case_id);
    }
}

fn usage_body(plan: &str, status: &str, remediation: bool, policies: u64) -> serde_json::Value {
    json!({
        "plan": {"name": plan, "price_monthly": 299.0},
        "subscription": {
            "status": status,
            "started_at": "2025-01-01T00:00:00",
            "expires_at": "2026-01-01T00:00:00",
            "auto_renew": true
        },
        "limits": {
            "policies": {"current": policies, "limit": 10, "percentage": 0},
            "transactions": {"current": 100, "limit": 1000000, "percentage": 0},
            "users": {"current": 2, "limit": 20, "percentage": 10}
        },
        "features": {
            "anomaly_detection": true,
            "remediation": remediation,
            "regulatory_mapping": true,
            "monitoring": false,
            "policy_impact": true,
            "multi_language": true
        }
    })
}

fn plans_body() -> serde_json::Value {
    json!([
        {"name": "basic", "max_policies": 1, "max_transactions_per_month": 10000,
         "max_users": 3, "price_monthly": 0.0, "features": {}},
        {"name": "pro", "max_policies": 10, "max_transactions_per_month": 1000000,
         "max_users": 20, "price_monthly": 299.0, "features": {"remediation": true}},
        {"name": "enterprise", "max_policies": "unlimited",
         "max_transactions_per_month": "unlimited", "max_users": "unlimited",
         "price_monthly": 999.0, "features": {"remediation": true, "monitoring": true}}
    ])
}

fn client_for(server: &MockServer) -> SubscriptionClient {
    SubscriptionClient::new(ClientConfig::new(server.uri())).unwrap()
}

fn source_for(server: &MockServer) -> Arc<dyn UsageSource> {
    Arc::new(client_for(server))
}

fn session() -> SessionContext {
    SessionContext::from_stored(Some("tenant-token"))
}

async fn mock_usage(server: &MockServer, body: serde_json::Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .and(header("authorization", "Bearer tenant-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

// ============================================================================
// Feature gate
// ============================================================================

#[tokio::test]
async fn test_gate_without_token_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut gate = FeatureGate::new(
        FeatureKey::Remediation,
        CasesTable::default(),
        source_for(&server),
        SessionContext::from_stored(None),
    );
    gate.mount();

    assert_eq!(gate.settle().await, GateState::Locked(LockReason::NoSession));
    assert_eq!(gate.content().requests_fired, 0);
}

#[tokio::test]
async fn test_gate_backend_error_locks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut gate = FeatureGate::new(
        FeatureKey::Remediation,
        CasesTable::default(),
        source_for(&server),
        session(),
    );
    gate.mount();

    assert_eq!(gate.settle().await, GateState::Locked(LockReason::FetchFailed));
    assert_eq!(gate.dispatch(7), InputOutcome::Blocked);
    assert_eq!(gate.content().requests_fired, 0);
}

#[tokio::test]
async fn test_gate_malformed_body_locks() {
    let server = MockServer::start().await;
    mock_usage(&server, json!({"features": {"remediation": true}}), 1).await;

    let mut gate = FeatureGate::new(
        FeatureKey::Remediation,
        CasesTable::default(),
        source_for(&server),
        session(),
    );
    gate.mount();

    assert_eq!(gate.settle().await, GateState::Locked(LockReason::Malformed));
}

#[tokio::test]
async fn test_gate_unlocks_once_per_mount() {
    let server = MockServer::start().await;
    mock_usage(&server, usage_body("pro", "active", true, 3), 1).await;

    let mut gate = FeatureGate::new(
        FeatureKey::Remediation,
        CasesTable::default(),
        source_for(&server),
        session(),
    );
    gate.mount();

    assert_eq!(gate.settle().await, GateState::Unlocked);
    assert_eq!(gate.render().content(), Some(&"cases".to_string()));
    assert_eq!(gate.dispatch(42), InputOutcome::Delivered);
    assert_eq!(gate.render().content(), Some(&"cases (selected 42)".to_string()));
    assert_eq!(gate.content().requests_fired, 1);

    for _ in 0..3 {
        gate.render();
        gate.set_feature(FeatureKey::Remediation);
    }
    assert_eq!(gate.fetch_count(), 1);
}

#[tokio::test]
async fn test_gate_cancelled_subscription_locks() {
    let server = MockServer::start().await;
    mock_usage(&server, usage_body("pro", "cancelled", true, 3), 1).await;

    let mut gate = FeatureGate::new(
        FeatureKey::Remediation,
        CasesTable::default(),
        source_for(&server),
        session(),
    );
    gate.mount();

    assert_eq!(gate.settle().await, GateState::Locked(LockReason::Inactive));
    let view = gate.render();
    let locked = view.locked().unwrap();
    assert_eq!(locked.banner.plan.as_deref(), Some("pro"));
    assert_eq!(locked.preview.view, "cases");
}

#[tokio::test]
async fn test_gate_feature_change_refetches() {
    let server = MockServer::start().await;
    mock_usage(&server, usage_body("pro", "active", true, 3), 2).await;

    let mut gate = FeatureGate::new(
        FeatureKey::Remediation,
        CasesTable::default(),
        source_for(&server),
        session(),
    );
    gate.mount();
    assert_eq!(gate.settle().await, GateState::Unlocked);

    gate.set_feature(FeatureKey::Monitoring);
    assert!(gate.state().is_loading());
    assert!(gate.render().is_skeleton());

    assert_eq!(gate.settle().await, GateState::Locked(LockReason::NotInPlan));
    assert_eq!(gate.fetch_count(), 2);
}

#[tokio::test]
async fn test_gates_fetch_independently_without_cache() {
    let server = MockServer::start().await;
    mock_usage(&server, usage_body("pro", "active", true, 3), 2).await;

    let source = source_for(&server);
    let mut remediation = FeatureGate::new(
        FeatureKey::Remediation,
        CasesTable::default(),
        Arc::clone(&source),
        session(),
    );
    let mut monitoring =
        FeatureGate::new(FeatureKey::Monitoring, CasesTable::default(), source, session());

    remediation.mount();
    monitoring.mount();

    assert_eq!(remediation.settle().await, GateState::Unlocked);
    assert_eq!(monitoring.settle().await, GateState::Locked(LockReason::NotInPlan));
}

#[tokio::test]
async fn test_gates_share_cached_snapshot() {
    let server = MockServer::start().await;
    mock_usage(&server, usage_body("pro", "active", true, 3), 1).await;

    let cached: Arc<dyn UsageSource> = Arc::new(CachedUsageSource::new(
        client_for(&server),
        CacheConfig::default(),
    ));
    let mut first = FeatureGate::new(
        FeatureKey::Remediation,
        CasesTable::default(),
        Arc::clone(&cached),
        session(),
    );
    first.mount();
    assert_eq!(first.settle().await, GateState::Unlocked);

    let mut second = FeatureGate::new(
        FeatureKey::PolicyImpact,
        CasesTable::default(),
        cached,
        session(),
    );
    second.mount();
    assert_eq!(second.settle().await, GateState::Unlocked);
}

// ============================================================================
// Subscription page
// ============================================================================

async fn mock_plans(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/subscription/plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plans_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_page_loads_usage_and_plans() {
    let server = MockServer::start().await;
    mock_usage(&server, usage_body("pro", "active", true, 9), 1).await;
    mock_plans(&server).await;

    let mut page = SubscriptionPage::new(client_for(&server), session());
    page.load().await;

    assert_eq!(page.state(), &PageState::Ready);
    assert_eq!(page.plans().len(), 3);
    assert!(page.can_cancel());

    let cards = page.plan_cards();
    assert!(cards[1].is_current);
    assert!(cards[2].can_upgrade());

    let panel = page.usage_panel().unwrap();
    assert!(panel.nudge);
    assert_eq!(panel.row(ResourceKey::Policies).unwrap().percentage, Some(90));
}

#[tokio::test]
async fn test_page_without_token_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut page = SubscriptionPage::new(client_for(&server), SessionContext::anonymous());
    page.load().await;

    assert_eq!(
        page.state(),
        &PageState::Failed("Failed to load subscription data".to_string())
    );
}

#[tokio::test]
async fn test_page_upgrade_reloads_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_body("pro", "active", true, 3)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(usage_body("enterprise", "active", true, 3)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mock_plans(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/upgrade"))
        .and(body_json(json!({"plan_name": "enterprise"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(usage_body("enterprise", "active", true, 3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut page = SubscriptionPage::new(client_for(&server), session());
    page.load().await;
    assert_eq!(page.usage().unwrap().plan_name(), Some("pro"));

    assert!(page.upgrade(PlanTier::Enterprise).await);

    assert_eq!(page.usage().unwrap().plan_name(), Some("enterprise"));
    assert_eq!(
        page.take_notice(),
        Some(Notice::Success("Plan upgraded successfully!".to_string()))
    );
    assert!(page.notice().is_none());
}

#[tokio::test]
async fn test_page_upgrade_failure_keeps_snapshot() {
    let server = MockServer::start().await;
    mock_usage(&server, usage_body("pro", "active", true, 3), 1).await;
    mock_plans(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/upgrade"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid plan name"})))
        .mount(&server)
        .await;

    let mut page = SubscriptionPage::new(client_for(&server), session());
    page.load().await;
    let before = page.usage().cloned();

    assert!(!page.upgrade(PlanTier::Basic).await);

    assert_eq!(page.usage().cloned(), before);
    assert_eq!(
        page.notice(),
        Some(&Notice::Error("Invalid plan name".to_string()))
    );
}

#[tokio::test]
async fn test_page_cancel_failure_uses_fallback_message() {
    let server = MockServer::start().await;
    mock_usage(&server, usage_body("pro", "active", true, 3), 1).await;
    mock_plans(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/cancel"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let mut page = SubscriptionPage::new(client_for(&server), session());
    page.load().await;

    assert!(!page.cancel().await);
    assert_eq!(
        page.notice(),
        Some(&Notice::Error("Failed to cancel subscription".to_string()))
    );
    assert_eq!(page.state(), &PageState::Ready);
}

#[tokio::test]
async fn test_page_upgrade_through_cache_invalidates_gates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_body("basic", "active", false, 0)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/subscription/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_body("pro", "active", true, 0)))
        .mount(&server)
        .await;
    mock_plans(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/subscription/upgrade"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_body("pro", "active", true, 0)))
        .mount(&server)
        .await;

    let cache = CachedUsageSource::new(client_for(&server), CacheConfig::default());
    let shared: Arc<dyn UsageSource> = Arc::new(cache.clone());

    let mut before = FeatureGate::new(
        FeatureKey::Remediation,
        CasesTable::default(),
        Arc::clone(&shared),
        session(),
    );
    before.mount();
    assert_eq!(before.settle().await, GateState::Locked(LockReason::NotInPlan));

    let mut page = SubscriptionPage::with_cache(cache, session());
    assert!(page.upgrade(PlanTier::Pro).await);

    let mut after = FeatureGate::new(
        FeatureKey::Remediation,
        CasesTable::default(),
        shared,
        session(),
    );
    after.mount();
    assert_eq!(after.settle().await, GateState::Unlocked);
}
