//! PostgreSQL row-level security statements isolating rows per agent.

use switchboard_error::ConfigError;

/// Session setting holding the current agent id.
pub const DEFAULT_AGENT_SETTING: &str = "app.current_agent_id";

/// PostgreSQL truncates longer identifiers.
const MAX_IDENTIFIER_LEN: usize = 63;

const POLICY_SUFFIX: &str = "_agent_isolation";

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.len() <= MAX_IDENTIFIER_LEN
}

/// Validate a possibly schema-qualified name, returning its segments.
fn qualified_name<'a>(what: &str, name: &'a str) -> Result<Vec<&'a str>, ConfigError> {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() > 2 || !segments.iter().all(|s| is_identifier(s)) {
        return Err(ConfigError::new(format!(
            "Invalid {} name for row-level security policy",
            what
        )));
    }
    Ok(segments)
}

/// Single-quoted SQL string literal.
fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push('\'');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

/// Generates row-level security DDL keyed on a session setting.
#[derive(Debug, Clone)]
pub struct PolicyTextGenerator {
    setting: String,
}

impl Default for PolicyTextGenerator {
    fn default() -> Self {
        Self {
            setting: DEFAULT_AGENT_SETTING.to_string(),
        }
    }
}

impl PolicyTextGenerator {
    /// Use a custom `namespace.name` session setting.
    pub fn new(setting: impl Into<String>) -> Result<Self, ConfigError> {
        let setting = setting.into();
        if qualified_name("setting", &setting)?.len() != 2 {
            return Err(ConfigError::new(
                "Session setting must be of the form namespace.name",
            ));
        }
        Ok(Self { setting })
    }

    /// Session setting the policy compares against.
    pub fn setting(&self) -> &str {
        &self.setting
    }

    /// Statements enabling and forcing row-level security on `table`, with one
    /// policy restricting every command to rows whose `agent_column` equals
    /// the session's agent id.
    pub fn generate(&self, table: &str, agent_column: &str) -> Result<String, ConfigError> {
        let table_segments = qualified_name("table", table)?;
        if !is_identifier(agent_column) {
            return Err(ConfigError::new(
                "Invalid column name for row-level security policy",
            ));
        }
        let base = table_segments.last().copied().unwrap_or(table);
        let policy = format!("{}{}", base, POLICY_SUFFIX);
        if policy.len() > MAX_IDENTIFIER_LEN {
            return Err(ConfigError::new(
                "Table name too long for row-level security policy name",
            ));
        }

        let predicate = format!(
            "{} = current_setting({}, true)",
            agent_column,
            quote_literal(&self.setting)
        );
        Ok(format!(
            "ALTER TABLE {table} ENABLE ROW LEVEL SECURITY;\n\
             ALTER TABLE {table} FORCE ROW LEVEL SECURITY;\n\
             DROP POLICY IF EXISTS {policy} ON {table};\n\
             CREATE POLICY {policy} ON {table}\n    \
             USING ({predicate})\n    \
             WITH CHECK ({predicate});\n"
        ))
    }

    /// Statement binding the agent id for the current transaction.
    pub fn set_agent_statement(&self, agent_id: &str) -> String {
        format!(
            "SELECT set_config({}, {}, true);",
            quote_literal(&self.setting),
            quote_literal(agent_id)
        )
    }
}
