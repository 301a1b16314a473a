//! Ordered statement arguments with placeholder numbering.

use crate::qb::placeholder::Placeholder;
use crate::value::Value;

/// Collects arguments while a statement is rendered and writes the matching
/// placeholder for each one, so numbering is decided at build time.
#[derive(Debug, Clone)]
pub(crate) struct ParamList {
    placeholder: Placeholder,
    params: Vec<Value>,
}

impl ParamList {
    pub(crate) fn new(placeholder: Placeholder) -> Self {
        Self {
            placeholder,
            params: Vec::new(),
        }
    }

    /// Add a parameter and write its placeholder into `sql`.
    pub(crate) fn bind(&mut self, sql: &mut String, value: Value) {
        self.params.push(value);
        self.placeholder.write(sql, self.params.len());
    }

    pub(crate) fn into_values(self) -> Vec<Value> {
        self.params
    }
}
