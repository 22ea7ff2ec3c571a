//! Validation report: pass/fail outcome, message, and exit status.

use serde::Serialize;
use std::fmt;

use crate::validate::ValidationError;

pub const SUCCESS_MESSAGE: &str = "Validation of tools was successful";
pub const FAILURE_HEADER: &str = "Validation of tools failed with the following errors:";

/// Outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    success: bool,
    errors: Vec<ValidationError>,
}

impl Report {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            success: errors.is_empty(),
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// 0 when every probe succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            return f.write_str(SUCCESS_MESSAGE);
        }

        f.write_str(FAILURE_HEADER)?;
        for error in &self.errors {
            write!(f, "\n{}", error)?;
        }
        Ok(())
    }
}
