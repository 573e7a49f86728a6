//! Sliding-window rate limiter keyed by (caller, action kind).

use crate::window::SlidingWindow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use switchboard_core::{ActionKind, ActionLimitPolicy, Clock, RateLimitSettings};
use tracing::{debug, instrument};

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimitDecision {
    /// Whether the caller has capacity for one more action
    allowed: bool,
    /// Actions left after the one about to be recorded; zero when denied
    remaining: u32,
    /// Milliseconds until the oldest entry leaves the window; zero when allowed
    retry_after_ms: u64,
    /// Actions inside the window at check time
    current_count: u32,
    /// Configured maximum for the action
    max_allowed: u32,
}

impl RateLimitDecision {
    /// Whether the caller has capacity for one more action.
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// Actions left after the one about to be recorded.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Milliseconds until capacity frees up.
    pub fn retry_after_ms(&self) -> u64 {
        self.retry_after_ms
    }

    /// Actions inside the window at check time.
    pub fn current_count(&self) -> u32 {
        self.current_count
    }

    /// Configured maximum for the action.
    pub fn max_allowed(&self) -> u32 {
        self.max_allowed
    }

    fn evaluate(window: &SlidingWindow, policy: &ActionLimitPolicy, now: u64) -> Self {
        let count = u32::try_from(window.len()).unwrap_or(u32::MAX);
        let max = *policy.max_actions();
        if count < max {
            Self {
                allowed: true,
                remaining: max - count - 1,
                retry_after_ms: 0,
                current_count: count,
                max_allowed: max,
            }
        } else {
            let retry_after_ms = window
                .oldest()
                .map_or(0, |oldest| {
                    oldest.saturating_add(*policy.window_ms()).saturating_sub(now)
                });
            Self {
                allowed: false,
                remaining: 0,
                retry_after_ms,
                current_count: count,
                max_allowed: max,
            }
        }
    }
}

/// All action windows for one caller, guarded together so a reset is atomic.
#[derive(Debug, Default)]
struct CallerWindows {
    windows: [SlidingWindow; 3],
}

impl CallerWindows {
    fn window_mut(&mut self, action: ActionKind) -> &mut SlidingWindow {
        &mut self.windows[action.index()]
    }
}

type CallerSlot = Arc<Mutex<CallerWindows>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Rate limiter tracking every caller's recent actions.
///
/// Each caller has its own lock; the caller table lock is only held long
/// enough to find or create a caller's slot.
///
/// `check_limit` is advisory and `record_action` does not enforce: callers
/// that skip the check can exceed the bound. [`RateLimiter::try_acquire`]
/// is the atomic alternative.
pub struct RateLimiter {
    policies: [ActionLimitPolicy; 3],
    callers: Mutex<HashMap<String, CallerSlot>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policies", &self.policies)
            .field("tracked_callers", &self.tracked_callers())
            .finish()
    }
}

impl RateLimiter {
    /// Create a rate limiter from configured settings.
    pub fn new(settings: &RateLimitSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            policies: ActionKind::ALL.map(|action| settings.policy(action)),
            callers: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Window policy for an action kind.
    pub fn policy(&self, action: ActionKind) -> ActionLimitPolicy {
        self.policies[action.index()]
    }

    /// Number of callers with state.
    pub fn tracked_callers(&self) -> usize {
        lock(&self.callers).len()
    }

    fn slot(&self, caller_id: &str) -> CallerSlot {
        let mut callers = lock(&self.callers);
        if let Some(slot) = callers.get(caller_id) {
            return Arc::clone(slot);
        }
        debug!("Creating rate limit state for new caller");
        let slot = CallerSlot::default();
        callers.insert(caller_id.to_string(), Arc::clone(&slot));
        slot
    }

    /// Check whether the caller may perform one more action.
    ///
    /// Does not record anything; call [`RateLimiter::record_action`] after
    /// the action is actually performed.
    #[instrument(skip_all, fields(caller = %caller_id, action = %action))]
    pub fn check_limit(&self, caller_id: &str, action: ActionKind) -> RateLimitDecision {
        let policy = self.policy(action);
        let now = self.clock.now_millis();
        let slot = self.slot(caller_id);
        let mut state = lock(&slot);
        let window = state.window_mut(action);
        window.prune(now, *policy.window_ms());

        let decision = RateLimitDecision::evaluate(window, &policy, now);
        if decision.allowed {
            debug!(remaining = decision.remaining, "Rate limit check passed");
        } else {
            debug!(
                count = decision.current_count,
                retry_after_ms = decision.retry_after_ms,
                "Rate limit exceeded"
            );
        }
        decision
    }

    /// Record that the caller performed an action, unconditionally.
    #[instrument(skip_all, fields(caller = %caller_id, action = %action))]
    pub fn record_action(&self, caller_id: &str, action: ActionKind) {
        let policy = self.policy(action);
        let now = self.clock.now_millis();
        let slot = self.slot(caller_id);
        let mut state = lock(&slot);
        let window = state.window_mut(action);
        window.prune(now, *policy.window_ms());
        window.record(now);
        debug!(count = window.len(), "Recorded action");
    }

    /// Check and, if allowed, record in one step under the caller's lock.
    #[instrument(skip_all, fields(caller = %caller_id, action = %action))]
    pub fn try_acquire(&self, caller_id: &str, action: ActionKind) -> RateLimitDecision {
        let policy = self.policy(action);
        let now = self.clock.now_millis();
        let slot = self.slot(caller_id);
        let mut state = lock(&slot);
        let window = state.window_mut(action);
        window.prune(now, *policy.window_ms());

        let decision = RateLimitDecision::evaluate(window, &policy, now);
        if decision.allowed {
            window.record(now);
            debug!(remaining = decision.remaining, "Acquired rate limit capacity");
        } else {
            debug!(retry_after_ms = decision.retry_after_ms, "Rate limit exceeded");
        }
        decision
    }

    /// Clear every action kind for a caller. Idempotent.
    #[instrument(skip_all, fields(caller = %caller_id))]
    pub fn reset_caller(&self, caller_id: &str) {
        let mut callers = lock(&self.callers);
        if let Some(slot) = callers.remove(caller_id) {
            // Anyone still holding the slot observes it fully cleared.
            let mut state = lock(&slot);
            for window in state.windows.iter_mut() {
                window.clear();
            }
            debug!("Caller rate limit state reset");
        }
    }

    /// Actions inside the window right now. Unknown callers report zero.
    pub fn current_count(&self, caller_id: &str, action: ActionKind) -> u32 {
        let slot = match lock(&self.callers).get(caller_id) {
            Some(slot) => Arc::clone(slot),
            None => return 0,
        };
        let policy = self.policy(action);
        let now = self.clock.now_millis();
        let mut state = lock(&slot);
        let window = state.window_mut(action);
        window.prune(now, *policy.window_ms());
        u32::try_from(window.len()).unwrap_or(u32::MAX)
    }
}
