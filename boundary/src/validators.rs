//! Validators for Boundary identifiers

use tfplug::schema::{Validator, ValidatorRequest, ValidatorResponse};
use tfplug::types::{Diagnostic, Dynamic};

/// Length of the random part of a Boundary identifier, as in `o_1234567890`
const ID_SUFFIX_LEN: usize = 10;

/// Accepts `<prefix>_<10 alphanumerics>` for any of the given prefixes, plus
/// any literal ids such as `global`. Works on strings and on lists or sets of
/// strings.
pub struct BoundaryIdValidator {
    prefixes: Vec<String>,
    literals: Vec<String>,
}

impl BoundaryIdValidator {
    pub fn new(prefixes: &[&str]) -> Self {
        Self {
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            literals: vec![],
        }
    }

    pub fn or_literal(mut self, literal: &str) -> Self {
        self.literals.push(literal.to_string());
        self
    }

    pub fn boxed(self) -> Box<dyn Validator> {
        Box::new(self)
    }

    pub fn create(prefixes: &[&str]) -> Box<dyn Validator> {
        Self::new(prefixes).boxed()
    }

    pub fn matches(&self, id: &str) -> bool {
        if self.literals.iter().any(|l| l == id) {
            return true;
        }
        let Some((prefix, suffix)) = id.split_once('_') else {
            return false;
        };
        self.prefixes.iter().any(|p| p == prefix)
            && suffix.len() == ID_SUFFIX_LEN
            && suffix.chars().all(|c| c.is_ascii_alphanumeric())
    }

    fn expected(&self) -> String {
        let mut forms: Vec<String> = self.literals.iter().map(|l| format!("\"{}\"", l)).collect();
        forms.extend(self.prefixes.iter().map(|p| format!("{}_<id>", p)));
        forms.join(", ")
    }
}

impl Validator for BoundaryIdValidator {
    fn description(&self) -> String {
        format!("Boundary identifier of the form {}", self.expected())
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let candidates: Vec<&str> = match &request.config_value.value {
            Dynamic::String(s) => vec![s.as_str()],
            Dynamic::List(items) => items.iter().filter_map(Dynamic::as_str).collect(),
            _ => vec![],
        };

        match candidates.into_iter().find(|c| !self.matches(c)) {
            Some(bad) => ValidatorResponse {
                diagnostics: vec![Diagnostic::error(
                    format!("Invalid identifier for {}", request.path),
                    format!("\"{}\" is not a valid identifier; expected {}", bad, self.expected()),
                )
                .with_attribute(request.path.clone())],
            },
            None => ValidatorResponse::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfplug::types::{AttributePath, DynamicValue};

    fn run(validator: &BoundaryIdValidator, value: Dynamic) -> ValidatorResponse {
        validator.validate(ValidatorRequest {
            config_value: DynamicValue::new(value),
            path: AttributePath::new("scope_id"),
        })
    }

    #[test]
    fn accepts_prefixed_ids_and_literals() {
        let validator = BoundaryIdValidator::new(&["o", "p"]).or_literal("global");
        assert!(validator.matches("global"));
        assert!(validator.matches("o_1234567890"));
        assert!(validator.matches("p_AbCdEf1234"));
        assert!(!validator.matches("o_123"));
        assert!(!validator.matches("u_1234567890"));
        assert!(!validator.matches("o_12345-7890"));
        assert!(!validator.matches("project"));
    }

    #[test]
    fn reports_first_bad_list_element_with_path() {
        let validator = BoundaryIdValidator::new(&["u", "g"]);
        let response = run(
            &validator,
            Dynamic::List(vec!["u_1234567890".into(), "x_1234567890".into()]),
        );
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].attribute,
            Some(AttributePath::new("scope_id"))
        );
        assert!(response.diagnostics[0].detail.contains("x_1234567890"));
    }

    #[test]
    fn ignores_non_string_values() {
        let validator = BoundaryIdValidator::new(&["o"]);
        assert!(run(&validator, Dynamic::Bool(true)).diagnostics.is_empty());
    }
}
