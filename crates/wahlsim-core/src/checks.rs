//! Accumulating field checks shared by the entity validators.

use crate::error::{ValidationError, Violation};

pub(crate) struct Checks {
    entity: &'static str,
    violations: Vec<Violation>,
}

impl Checks {
    pub(crate) fn new(entity: &'static str) -> Self {
        Self {
            entity,
            violations: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Character length in Unicode scalar values, not bytes.
    pub(crate) fn chars(&mut self, field: impl Into<String>, value: &str, min: usize, max: usize) {
        let n = value.chars().count();
        if n < min || n > max {
            self.push(field, format!("must be {min}-{max} characters, got {n}"));
        }
    }

    /// Word count by whitespace-delimited tokens. Checked independently of
    /// [`chars`](Self::chars).
    pub(crate) fn words(&mut self, field: impl Into<String>, value: &str, min: usize, max: usize) {
        let n = word_count(value);
        if n < min || n > max {
            self.push(field, format!("must be {min}-{max} words, got {n}"));
        }
    }

    pub(crate) fn items(&mut self, field: impl Into<String>, len: usize, min: usize, max: usize) {
        if len < min || len > max {
            self.push(field, format!("must have {min}-{max} entries, got {len}"));
        }
    }

    pub(crate) fn int_range(&mut self, field: impl Into<String>, value: i64, min: i64, max: i64) {
        if value < min || value > max {
            self.push(field, format!("must be between {min} and {max}, got {value}"));
        }
    }

    pub(crate) fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.entity, self.violations))
        }
    }
}

pub(crate) fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}
