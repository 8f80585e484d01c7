//! The protected-content seam

/// Content a [`FeatureGate`](crate::FeatureGate) can protect
///
/// `mount` is where content starts its own side effects, such as data
/// requests. The gate calls it only once entitlement is proven, so locked
/// content never runs them. `render` must be free of side effects: the
/// locked preview is produced by calling it on unmounted content.
pub trait GatedContent {
    /// Rendered output
    type View;
    /// User input events
    type Input;

    /// Start side effects
    fn mount(&mut self) {}

    /// Stop side effects
    fn unmount(&mut self) {}

    fn render(&self) -> Self::View;

    fn handle_input(&mut self, input: Self::Input);
}

/// What happened to an input dispatched through a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Passed to the content
    Delivered,
    /// Swallowed by the gate
    Blocked,
}
