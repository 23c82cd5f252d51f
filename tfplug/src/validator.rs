//! Built-in attribute validators
//!
//! Validators only see known, non-null configuration values; the planner
//! skips them otherwise.

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{Diagnostic, Dynamic};

fn error(request: &ValidatorRequest, summary: String, detail: String) -> ValidatorResponse {
    ValidatorResponse {
        diagnostics: vec![Diagnostic::error(summary, detail).with_attribute(request.path.clone())],
    }
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn create(min: Option<usize>, max: Option<usize>) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        format!("string length between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Dynamic::String(s) = &request.config_value.value else {
            return ValidatorResponse::default();
        };
        let len = s.chars().count();

        if let Some(min) = self.min {
            if len < min {
                return error(
                    &request,
                    format!("{} must have minimum length of {}", request.path, min),
                    format!("Got length {}", len),
                );
            }
        }
        if let Some(max) = self.max {
            if len > max {
                return error(
                    &request,
                    format!("{} must have maximum length of {}", request.path, max),
                    format!("Got length {}", len),
                );
            }
        }
        ValidatorResponse::default()
    }
}

pub struct StringPatternValidator {
    pub pattern: Result<regex::Regex, regex::Error>,
    pub description: String,
}

impl StringPatternValidator {
    /// An invalid pattern is reported as a diagnostic on every validation
    pub fn create(pattern: &str, description: &str) -> Box<dyn Validator> {
        Box::new(Self {
            pattern: regex::Regex::new(pattern),
            description: description.to_string(),
        })
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Dynamic::String(s) = &request.config_value.value else {
            return ValidatorResponse::default();
        };
        let pattern = match &self.pattern {
            Ok(pattern) => pattern,
            Err(e) => {
                return error(
                    &request,
                    format!("{} has an invalid validation pattern", request.path),
                    e.to_string(),
                )
            }
        };
        if pattern.is_match(s) {
            return ValidatorResponse::default();
        }
        error(
            &request,
            format!("{} must match {}", request.path, self.description),
            format!("Value '{}' does not match pattern", s),
        )
    }
}

/// Accepts only one of a fixed set of strings
pub struct OneOfValidator {
    pub allowed: Vec<String>,
}

impl OneOfValidator {
    pub fn create(allowed: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Validator for OneOfValidator {
    fn description(&self) -> String {
        format!("one of {}", self.allowed.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Dynamic::String(s) = &request.config_value.value else {
            return ValidatorResponse::default();
        };
        if self.allowed.iter().any(|a| a == s) {
            return ValidatorResponse::default();
        }
        error(
            &request,
            format!("{} must be one of: {}", request.path, self.allowed.join(", ")),
            format!("Got '{}'", s),
        )
    }
}

/// Requires every string element of a list or set to start with `prefix`.
/// Also works on single strings.
pub struct IdPrefixValidator {
    pub prefixes: Vec<String>,
}

impl IdPrefixValidator {
    pub fn create(prefixes: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn matches(&self, value: &str) -> bool {
        self.prefixes.iter().any(|p| value.starts_with(p.as_str()))
    }
}

impl Validator for IdPrefixValidator {
    fn description(&self) -> String {
        format!("identifier starting with {}", self.prefixes.join(" or "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let candidates: Vec<&str> = match &request.config_value.value {
            Dynamic::String(s) => vec![s.as_str()],
            Dynamic::List(items) => items.iter().filter_map(Dynamic::as_str).collect(),
            _ => vec![],
        };

        match candidates.into_iter().find(|c| !self.matches(c)) {
            Some(bad) => error(
                &request,
                format!(
                    "{} must reference an identifier starting with {}",
                    request.path,
                    self.prefixes.join(" or ")
                ),
                format!("Got '{}'", bad),
            ),
            None => ValidatorResponse::default(),
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn create(min: Option<f64>, max: Option<f64>) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        format!("number between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Dynamic::Number(n) = request.config_value.value else {
            return ValidatorResponse::default();
        };

        if let Some(min) = self.min {
            if n < min {
                return error(
                    &request,
                    format!("{} must be at least {}", request.path, min),
                    format!("Got {}", n),
                );
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return error(
                    &request,
                    format!("{} must be at most {}", request.path, max),
                    format!("Got {}", n),
                );
            }
        }
        ValidatorResponse::default()
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl ListLengthValidator {
    pub fn create(min: Option<usize>, max: Option<usize>) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }
}

impl Validator for ListLengthValidator {
    fn description(&self) -> String {
        format!("between {:?} and {:?} items", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Dynamic::List(items) = &request.config_value.value else {
            return ValidatorResponse::default();
        };

        if let Some(min) = self.min {
            if items.len() < min {
                return error(
                    &request,
                    format!("{} must have at least {} items", request.path, min),
                    format!("Got {} items", items.len()),
                );
            }
        }
        if let Some(max) = self.max {
            if items.len() > max {
                return error(
                    &request,
                    format!("{} must have at most {} items", request.path, max),
                    format!("Got {} items", items.len()),
                );
            }
        }
        ValidatorResponse::default()
    }
}
