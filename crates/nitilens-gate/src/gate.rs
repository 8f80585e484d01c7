//! Feature gate
//!
//! Each gate owns its state exclusively. Mounting starts a single
//! entitlement fetch on the tokio runtime; the result comes back over a
//! channel tagged with the mount generation, so a fetch started for an
//! earlier mount or feature key can never change the current state.
//!
//! ```ignore
//! let source = usage_source_for(&ClientConfig::from_env()?)?;
//! let mut gate = FeatureGate::new(FeatureKey::Remediation, RemediationBoard::new(), source, session);
//!
//! gate.mount();
//! gate.settle().await;
//!
//! match gate.render() {
//!     GateView::Skeleton => draw_skeleton(),
//!     GateView::Content(board) => draw(board),
//!     GateView::Locked(locked) => draw_locked(locked),
//! }
//! ```

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use nitilens_client::{ClientError, SessionContext, UsageSource};
use nitilens_entitlement::resolve_feature;
use nitilens_types::{FeatureKey, UsageSnapshot};

use crate::content::{GatedContent, InputOutcome};
use crate::state::{GateState, LockReason};
use crate::view::{GateView, LockedBanner, LockedView, Preview, UpgradeAction};

const RESOLUTIONS_TOTAL: &str = "nitilens_gate_resolutions_total";

/// A finished fetch, tagged with the mount generation that started it
struct Resolution {
    generation: u64,
    result: Result<UsageSnapshot, ClientError>,
}

/// Wraps content and enforces the tenant's entitlement to a feature
pub struct FeatureGate<C: GatedContent> {
    feature: FeatureKey,
    content: C,
    source: Arc<dyn UsageSource>,
    session: SessionContext,
    state: GateState,
    plan_name: Option<String>,
    /// Gate is attached to a live view
    attached: bool,
    /// `content.mount()` has run without a matching `unmount()`
    content_mounted: bool,
    generation: u64,
    cancel: CancellationToken,
    fetches: u64,
    tx: mpsc::UnboundedSender<Resolution>,
    rx: mpsc::UnboundedReceiver<Resolution>,
}

impl<C: GatedContent> FeatureGate<C> {
    /// Create an unmounted gate in `LOADING`
    pub fn new(
        feature: FeatureKey,
        content: C,
        source: Arc<dyn UsageSource>,
        session: SessionContext,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            feature,
            content,
            source,
            session,
            state: GateState::Loading,
            plan_name: None,
            attached: false,
            content_mounted: false,
            generation: 0,
            cancel: CancellationToken::new(),
            fetches: 0,
            tx,
            rx,
        }
    }

    pub fn feature(&self) -> FeatureKey {
        self.feature
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Plan name from the last applied snapshot
    pub fn plan_name(&self) -> Option<&str> {
        self.plan_name.as_deref()
    }

    /// Fetches started over the gate's lifetime
    pub fn fetch_count(&self) -> u64 {
        self.fetches
    }

    pub fn is_mounted(&self) -> bool {
        self.attached
    }

    /// The wrapped content
    pub fn content(&self) -> &C {
        &self.content
    }

    /// Attach the gate to a view and start resolving.
    ///
    /// Must be called inside a tokio runtime. Mounting an already mounted
    /// gate does nothing.
    pub fn mount(&mut self) {
        if self.attached {
            return;
        }
        self.attached = true;
        self.begin();
    }

    /// Detach the gate. Any in-flight fetch is cancelled and its result
    /// discarded.
    pub fn unmount(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.cancel.cancel();
        self.generation += 1;
        self.unmount_content();
        self.state = GateState::Loading;
    }

    /// Change the gated feature.
    ///
    /// A different key on a mounted gate restarts at `LOADING` with a new
    /// fetch. The same key is a no-op.
    pub fn set_feature(&mut self, feature: FeatureKey) {
        if feature == self.feature {
            return;
        }
        self.feature = feature;
        if self.attached {
            self.unmount_content();
            self.begin();
        }
    }

    /// Replace the session, taking effect at the next mount or feature change
    pub fn set_session(&mut self, session: SessionContext) {
        self.session = session;
    }

    fn begin(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation += 1;
        self.state = GateState::Loading;
        self.plan_name = None;

        let Some(token) = self.session.token().cloned() else {
            self.transition(GateState::Locked(LockReason::NoSession));
            return;
        };

        self.fetches += 1;
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let cancel = self.cancel.clone();
        let tx = self.tx.clone();
        let feature = self.feature;

        debug!(%feature, generation, "fetching entitlement");
        tokio::spawn(async move {
            // Own task so a panicking source still reports back
            let fetch = tokio::spawn(async move { source.fetch_usage(&token).await });
            let abort = fetch.abort_handle();

            let result = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    abort.abort();
                    return;
                }
                joined = fetch => joined.unwrap_or_else(|e| {
                    Err(ClientError::Transport(format!("usage source failed: {e}")))
                }),
            };
            // Receiver is gone once the gate is dropped
            let _ = tx.send(Resolution { generation, result });
        });
    }

    /// Wait for the in-flight fetch and apply its result.
    ///
    /// Returns immediately unless the gate is mounted and `LOADING`. A fetch
    /// that never completes keeps this pending; callers wanting a deadline
    /// wrap it in `tokio::time::timeout`.
    pub async fn settle(&mut self) -> GateState {
        while self.attached && self.state.is_loading() {
            match self.rx.recv().await {
                Some(resolution) => self.apply(resolution),
                None => break,
            }
        }
        self.state
    }

    /// Apply a completed fetch without waiting. Returns true if the state
    /// changed.
    pub fn try_settle(&mut self) -> bool {
        let before = self.state;
        while self.attached && self.state.is_loading() {
            match self.rx.try_recv() {
                Ok(resolution) => self.apply(resolution),
                Err(_) => break,
            }
        }
        before != self.state
    }

    fn apply(&mut self, resolution: Resolution) {
        if resolution.generation != self.generation || !self.state.is_loading() {
            debug!(
                generation = resolution.generation,
                current = self.generation,
                "discarding stale entitlement result"
            );
            return;
        }

        let next = match resolution.result {
            Ok(snapshot) => {
                self.plan_name = snapshot.plan_name().map(str::to_string);
                self.verdict(&snapshot)
            }
            Err(e) => {
                warn!(feature = %self.feature, error = %e, "entitlement fetch failed");
                GateState::Locked(LockReason::FetchFailed)
            }
        };
        self.transition(next);
    }

    fn verdict(&self, snapshot: &UsageSnapshot) -> GateState {
        if resolve_feature(snapshot, self.feature) {
            return GateState::Unlocked;
        }
        let reason = match &snapshot.subscription {
            _ if !snapshot.is_well_formed() => LockReason::Malformed,
            Some(sub) if !sub.status.is_active() => LockReason::Inactive,
            _ => LockReason::NotInPlan,
        };
        GateState::Locked(reason)
    }

    fn transition(&mut self, next: GateState) {
        self.state = next;
        debug!(feature = %self.feature, state = next.as_str(), "entitlement resolved");
        counter!(RESOLUTIONS_TOTAL, "outcome" => next.as_str()).increment(1);

        if next.is_unlocked() && !self.content_mounted {
            self.content.mount();
            self.content_mounted = true;
        }
    }

    fn unmount_content(&mut self) {
        if self.content_mounted {
            self.content.unmount();
            self.content_mounted = false;
        }
    }

    /// Render for the current state. Never fetches.
    pub fn render(&self) -> GateView<C::View> {
        match self.state {
            GateState::Loading => GateView::Skeleton,
            GateState::Unlocked => GateView::Content(self.content.render()),
            GateState::Locked(reason) => GateView::Locked(LockedView {
                reason,
                banner: LockedBanner {
                    feature: self.feature,
                    plan: self.plan_name.clone(),
                },
                upgrade: UpgradeAction::default(),
                preview: Preview {
                    view: self.content.render(),
                },
            }),
        }
    }

    /// Route input to the content; only an unlocked gate lets it through
    pub fn dispatch(&mut self, input: C::Input) -> InputOutcome {
        if self.state.is_unlocked() {
            self.content.handle_input(input);
            InputOutcome::Delivered
        } else {
            InputOutcome::Blocked
        }
    }
}

impl<C: GatedContent> Drop for FeatureGate<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.unmount_content();
    }
}

impl<C: GatedContent> std::fmt::Debug for FeatureGate<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureGate")
            .field("feature", &self.feature)
            .field("state", &self.state)
            .field("attached", &self.attached)
            .field("generation", &self.generation)
            .field("fetches", &self.fetches)
            .finish_non_exhaustive()
    }
}
