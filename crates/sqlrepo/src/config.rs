use crate::qb::Placeholder;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Per-repository settings: parameter syntax, timeouts and SQL logging.
///
/// Deserializable from application configuration. Durations are given in
/// milliseconds:
///
/// ```json
/// { "placeholder": "dollar", "statement_timeout_ms": 5000, "slow_statement_threshold_ms": 200 }
/// ```
///
/// Missing fields take their [`Default`] values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Parameter syntax of the target database.
    pub placeholder: Placeholder,
    /// Statement timeout. `None` means no timeout (default).
    #[serde(rename = "statement_timeout_ms", deserialize_with = "millis")]
    pub statement_timeout: Option<Duration>,
    /// Statements slower than this are logged at WARN level.
    #[serde(rename = "slow_statement_threshold_ms", deserialize_with = "millis")]
    pub slow_statement_threshold: Option<Duration>,
    /// Truncate logged SQL (in bytes). `None` logs the full text.
    pub max_logged_sql_length: Option<usize>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            placeholder: Placeholder::Question,
            statement_timeout: None,
            slow_statement_threshold: None,
            max_logged_sql_length: Some(200),
        }
    }
}

impl RepositoryConfig {
    /// Defaults with the given parameter syntax.
    pub fn new(placeholder: Placeholder) -> Self {
        Self {
            placeholder,
            ..Self::default()
        }
    }

    /// `$1, $2, ...` parameters.
    pub fn for_postgres() -> Self {
        Self::new(Placeholder::Dollar)
    }

    /// `?` parameters.
    pub fn for_sqlite() -> Self {
        Self::new(Placeholder::Question)
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Set the statement timeout.
    ///
    /// A statement exceeding this duration is abandoned and cancelled: it
    /// never starts if it is still waiting for the connection, otherwise the
    /// database aborts it. The operation returns a timeout error.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    pub fn with_slow_statement_threshold(mut self, threshold: Duration) -> Self {
        self.slow_statement_threshold = Some(threshold);
        self
    }

    pub fn with_max_logged_sql_length(mut self, len: usize) -> Self {
        self.max_logged_sql_length = Some(len);
        self
    }

    /// Log SQL without truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql_length = None;
        self
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}
