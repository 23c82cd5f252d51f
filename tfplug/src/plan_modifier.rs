//! Built-in plan modifiers
//!
//! Plan modifiers run once the planned value of an attribute has been
//! computed from configuration and prior state. They can keep a prior value,
//! or flag that a change cannot be applied in place.

use crate::schema::{PlanModifier, PlanModifierRequest, PlanModifierResponse};
use crate::types::{Diagnostic, Dynamic};

/// Forces replacement when the attribute changes on an existing resource
pub struct RequiresReplace;

impl RequiresReplace {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "changing this value forces a new resource".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let requires_replace = is_change(&request.state_value.value, &request.plan_value.value);

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics: vec![],
        }
    }
}

/// Keeps the prior state value for a computed attribute instead of marking
/// it unknown whenever anything else in the resource changes
pub struct UseStateForUnknown;

impl UseStateForUnknown {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "once set, the value is carried over from prior state".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let mut plan_value = request.plan_value;
        if plan_value.value.is_unknown() && !request.state_value.value.is_null() {
            plan_value = request.state_value;
        }

        PlanModifierResponse {
            plan_value,
            requires_replace: false,
            diagnostics: vec![],
        }
    }
}

/// Forces replacement only when `predicate` says the change needs it
pub struct RequiresReplaceIf<F>
where
    F: Fn(&PlanModifierRequest) -> bool + Send + Sync,
{
    predicate: F,
    description: String,
}

impl<F> RequiresReplaceIf<F>
where
    F: Fn(&PlanModifierRequest) -> bool + Send + Sync + 'static,
{
    pub fn create(predicate: F, description: impl Into<String>) -> Box<dyn PlanModifier> {
        Box::new(Self {
            predicate,
            description: description.into(),
        })
    }
}

impl<F> PlanModifier for RequiresReplaceIf<F>
where
    F: Fn(&PlanModifierRequest) -> bool + Send + Sync,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let requires_replace = is_change(&request.state_value.value, &request.plan_value.value)
            && (self.predicate)(&request);

        let mut diagnostics = vec![];
        if requires_replace {
            diagnostics.push(
                Diagnostic::warning(
                    format!("Attribute '{}' requires resource replacement", request.path),
                    &self.description,
                )
                .with_attribute(request.path.clone()),
            );
        }

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics,
        }
    }
}

/// A known value that differs from prior state. Creates never count.
fn is_change(state: &Dynamic, plan: &Dynamic) -> bool {
    if state.is_unknown() || plan.is_unknown() {
        return false;
    }
    state != plan
}
