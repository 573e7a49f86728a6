//! Per-agent tool allowlist.

use std::collections::{BTreeMap, BTreeSet};
use switchboard_core::ToolPolicySettings;
use switchboard_error::{SecurityError, SecurityErrorKind, SecurityResult};
use tracing::{debug, instrument};

/// Allows every tool when present in a set.
pub const WILDCARD: &str = "*";

/// Decides which tools an agent may invoke.
#[derive(Debug, Clone, Default, derive_getters::Getters)]
pub struct ToolPolicy {
    /// Tools every agent may use
    default_allowed: BTreeSet<String>,
    /// Tools no agent may use (takes precedence)
    denied: BTreeSet<String>,
    /// Per-agent allowances, in addition to the defaults
    agents: BTreeMap<String, BTreeSet<String>>,
}

fn permits(set: &BTreeSet<String>, tool_name: &str) -> bool {
    set.contains(WILDCARD) || set.contains(tool_name)
}

impl ToolPolicy {
    /// Build a policy from settings.
    pub fn new(settings: &ToolPolicySettings) -> Self {
        Self {
            default_allowed: settings.default_allowed().clone(),
            denied: settings.denied().clone(),
            agents: settings.agents().clone(),
        }
    }

    /// Whether the agent may use the tool.
    #[instrument(skip(self))]
    pub fn is_tool_allowed(&self, agent_id: &str, tool_name: &str) -> bool {
        // Deny list takes precedence
        if self.denied.contains(tool_name) {
            debug!("Tool explicitly denied");
            return false;
        }

        let agent_allowed = self
            .agents
            .get(agent_id)
            .is_some_and(|tools| permits(tools, tool_name));
        let allowed = agent_allowed || permits(&self.default_allowed, tool_name);
        debug!(allowed, "Checked tool policy");
        allowed
    }

    /// Like [`ToolPolicy::is_tool_allowed`], as a result for `?` propagation.
    pub fn check_tool(&self, agent_id: &str, tool_name: &str) -> SecurityResult<()> {
        if self.is_tool_allowed(agent_id, tool_name) {
            Ok(())
        } else {
            Err(SecurityError::new(SecurityErrorKind::ToolDenied(
                tool_name.to_string(),
            )))
        }
    }
}
