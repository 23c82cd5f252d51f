//! Schema-driven planning
//!
//! These functions implement the part of planning the framework owns:
//! configuration validation against the schema, building the proposed new
//! state, marking computed values unknown, running attribute plan modifiers
//! and classifying the resulting change.

use crate::schema::{
    Attribute, AttributeType, DefaultRequest, PlanModifierRequest, Schema, ValidatorRequest,
};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;

/// What applying a plan will do to the remote object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Create,
    Update,
    /// Delete the existing object, then create a new one
    Replace,
    NoOp,
}

/// Outcome of the framework half of planning
#[derive(Debug)]
pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

fn attribute_value<'a>(value: &'a DynamicValue, name: &str) -> &'a Dynamic {
    match &value.value {
        Dynamic::Map(m) => m.get(name).unwrap_or(&Dynamic::Null),
        _ => &Dynamic::Null,
    }
}

/// Write one planned value, reporting a path that cannot be written as an
/// error diagnostic on that path
pub fn set_planned(
    planned: &mut DynamicValue,
    path: &AttributePath,
    value: Dynamic,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let Err(e) = planned.set(path, value) {
        diagnostics.push(
            Diagnostic::error("Failed to plan attribute", e.to_string())
                .with_attribute(path.clone()),
        );
    }
}

/// Validate configuration against the schema.
///
/// Checks presence rules, read-only attributes, unsupported arguments,
/// value types and the attribute validators. Unknown values pass.
pub fn validate_config(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];

    let entries = match &config.value {
        Dynamic::Map(m) => m.clone(),
        Dynamic::Null => HashMap::new(),
        other => {
            diagnostics.push(Diagnostic::error(
                "Invalid configuration",
                format!("expected an object, got {}", other.type_name()),
            ));
            return diagnostics;
        }
    };

    for key in entries.keys() {
        if schema.attribute(key).is_none() {
            diagnostics.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{}\" is not expected here", key),
                )
                .with_attribute(AttributePath::new(key)),
            );
        }
    }

    for attr in &schema.attributes {
        let path = AttributePath::new(&attr.name);
        let value = entries.get(&attr.name).unwrap_or(&Dynamic::Null);

        if value.is_null() {
            if attr.required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("The argument \"{}\" is required", attr.name),
                    )
                    .with_attribute(path),
                );
            }
            continue;
        }

        if attr.computed && !attr.optional && !attr.required {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid configuration",
                    format!("\"{}\" is read-only and cannot be set", attr.name),
                )
                .with_attribute(path),
            );
            continue;
        }

        if !conforms(&attr.r#type, value) {
            diagnostics.push(
                Diagnostic::error(
                    "Incorrect attribute value type",
                    format!(
                        "\"{}\" expects {}, got {}",
                        attr.name,
                        describe(&attr.r#type),
                        value.type_name()
                    ),
                )
                .with_attribute(path),
            );
            continue;
        }

        if !value.is_wholly_known() {
            continue;
        }

        for validator in &attr.validators {
            let response = validator.validate(ValidatorRequest {
                config_value: DynamicValue::new(value.clone()),
                path: path.clone(),
            });
            diagnostics.extend(response.diagnostics);
        }
    }

    diagnostics
}

fn conforms(ty: &AttributeType, value: &Dynamic) -> bool {
    match (ty, value) {
        (_, Dynamic::Null) | (_, Dynamic::Unknown) => true,
        (AttributeType::String, Dynamic::String(_)) => true,
        (AttributeType::Number, Dynamic::Number(_)) => true,
        (AttributeType::Bool, Dynamic::Bool(_)) => true,
        (AttributeType::List(inner), Dynamic::List(items))
        | (AttributeType::Set(inner), Dynamic::List(items)) => {
            items.iter().all(|item| conforms(inner, item))
        }
        (AttributeType::Map(inner), Dynamic::Map(entries)) => {
            entries.values().all(|v| conforms(inner, v))
        }
        (AttributeType::Object(fields), Dynamic::Map(entries)) => entries
            .iter()
            .all(|(k, v)| fields.get(k).is_some_and(|t| conforms(t, v))),
        _ => false,
    }
}

fn describe(ty: &AttributeType) -> String {
    match ty {
        AttributeType::String => "string".to_string(),
        AttributeType::Number => "number".to_string(),
        AttributeType::Bool => "bool".to_string(),
        AttributeType::List(inner) => format!("list of {}", describe(inner)),
        AttributeType::Set(inner) => format!("set of {}", describe(inner)),
        AttributeType::Map(inner) => format!("map of {}", describe(inner)),
        AttributeType::Object(_) => "object".to_string(),
    }
}

/// Sort and de-duplicate every set-typed attribute so that set comparisons
/// are independent of the order values were written in.
pub fn normalize(schema: &Schema, value: &mut DynamicValue) {
    let Dynamic::Map(entries) = &mut value.value else {
        return;
    };
    for attr in schema.attributes.iter().filter(|a| a.r#type.is_set()) {
        if let Some(Dynamic::List(items)) = entries.get_mut(&attr.name) {
            normalize_set(items);
        }
    }
}

pub fn normalize_set(items: &mut Vec<Dynamic>) {
    if items.iter().any(Dynamic::is_unknown) {
        return;
    }
    items.sort_by_cached_key(set_sort_key);
    items.dedup();
}

fn set_sort_key(value: &Dynamic) -> String {
    match value {
        Dynamic::String(s) => s.clone(),
        other => format!("{:?}", other),
    }
}

/// Build the proposed new state from configuration and prior state.
///
/// Configured values win. Unset attributes take their default, then the
/// prior value when computed. Computed attributes of a new resource are
/// unknown. Write-only attributes are always null.
pub fn propose_new_state(
    schema: &Schema,
    prior_state: &DynamicValue,
    config: &DynamicValue,
) -> DynamicValue {
    let creating = prior_state.is_null();
    let mut proposed = HashMap::new();

    for attr in &schema.attributes {
        let configured = attribute_value(config, &attr.name);
        let value = if attr.write_only {
            Dynamic::Null
        } else if !configured.is_null() {
            configured.clone()
        } else if let Some(default) = &attr.default {
            default
                .default_value(DefaultRequest {
                    path: AttributePath::new(&attr.name),
                })
                .value
                .value
        } else if attr.computed {
            if creating {
                Dynamic::Unknown
            } else {
                attribute_value(prior_state, &attr.name).clone()
            }
        } else {
            Dynamic::Null
        };
        proposed.insert(attr.name.clone(), value);
    }

    let mut proposed = DynamicValue::new(Dynamic::Map(proposed));
    normalize(schema, &mut proposed);
    proposed
}

/// Finish planning an existing resource or a create.
///
/// When the plan differs from prior state, computed values that were only
/// carried over from prior state become unknown, because applying the change
/// may alter them. Attribute plan modifiers then run in schema order.
pub fn plan_resource_change(
    schema: &Schema,
    prior_state: &DynamicValue,
    config: &DynamicValue,
    proposed: DynamicValue,
) -> PlannedChange {
    let mut planned = proposed;
    let mut diagnostics = vec![];
    let mut requires_replace = vec![];

    if !prior_state.is_null() && planned != *prior_state {
        for attr in schema.attributes.iter().filter(|a| a.computed) {
            let carried_over = attribute_value(config, &attr.name).is_null()
                && attr.default.is_none()
                && attribute_value(&planned, &attr.name) == attribute_value(prior_state, &attr.name);
            if carried_over {
                set_planned(
                    &mut planned,
                    &AttributePath::new(&attr.name),
                    Dynamic::Unknown,
                    &mut diagnostics,
                );
            }
        }
    }

    for attr in &schema.attributes {
        run_plan_modifiers(
            attr,
            prior_state,
            config,
            &mut planned,
            &mut requires_replace,
            &mut diagnostics,
        );
    }

    PlannedChange {
        planned_state: planned,
        requires_replace,
        diagnostics,
    }
}

fn run_plan_modifiers(
    attr: &Attribute,
    prior_state: &DynamicValue,
    config: &DynamicValue,
    planned: &mut DynamicValue,
    requires_replace: &mut Vec<AttributePath>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let path = AttributePath::new(&attr.name);
    for modifier in &attr.plan_modifiers {
        let response = modifier.modify(PlanModifierRequest {
            config_value: DynamicValue::new(attribute_value(config, &attr.name).clone()),
            state_value: DynamicValue::new(attribute_value(prior_state, &attr.name).clone()),
            plan_value: DynamicValue::new(attribute_value(planned, &attr.name).clone()),
            path: path.clone(),
        });

        if !prior_state.is_null() && response.requires_replace && !requires_replace.contains(&path)
        {
            requires_replace.push(path.clone());
        }
        diagnostics.extend(response.diagnostics);
        set_planned(planned, &path, response.plan_value.value, diagnostics);
    }
}

/// Classify a finished plan
pub fn classify(
    prior_state: &DynamicValue,
    planned_state: &DynamicValue,
    requires_replace: &[AttributePath],
) -> PlanAction {
    if prior_state.is_null() {
        PlanAction::Create
    } else if !requires_replace.is_empty() {
        PlanAction::Replace
    } else if planned_state == prior_state {
        PlanAction::NoOp
    } else {
        PlanAction::Update
    }
}

/// Known planned values must survive apply unchanged.
/// Returns one error per attribute that drifted.
pub fn check_applied_state(
    schema: &Schema,
    planned: &DynamicValue,
    applied: &DynamicValue,
) -> Vec<Diagnostic> {
    schema
        .attributes
        .iter()
        .filter(|attr| !attr.write_only)
        .filter_map(|attr| {
            let planned_value = attribute_value(planned, &attr.name);
            let applied_value = attribute_value(applied, &attr.name);
            if planned_value.is_wholly_known() && planned_value != applied_value {
                Some(
                    Diagnostic::error(
                        "Provider produced inconsistent result after apply",
                        format!(
                            "\"{}\" was planned as {:?} but is now {:?}",
                            attr.name, planned_value, applied_value
                        ),
                    )
                    .with_attribute(AttributePath::new(&attr.name)),
                )
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;
    use crate::plan_modifier::{RequiresReplace, UseStateForUnknown};
    use crate::schema::{AttributeBuilder, SchemaBuilder};
    use crate::validator::StringLengthValidator;

    #[test]
    fn unwritable_planned_path_becomes_a_diagnostic() {
        let mut planned = DynamicValue::from_pairs([("host_ids", Dynamic::List(vec![]))]);
        let path = AttributePath::new("host_ids").index(2);
        let mut diagnostics = vec![];

        set_planned(&mut planned, &path, Dynamic::Unknown, &mut diagnostics);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some(path));
        assert_eq!(planned.get(&AttributePath::new("host_ids")), Some(&Dynamic::List(vec![])));

        set_planned(&mut planned, &AttributePath::new("id"), Dynamic::Unknown, &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert!(planned.get(&AttributePath::new("id")).unwrap().is_unknown());
    }

    fn schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("scope_id", AttributeType::String)
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .optional()
                    .validator(StringLengthValidator::create(Some(1), None))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("member_ids", AttributeType::Set(Box::new(AttributeType::String)))
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("port", AttributeType::Number)
                    .optional()
                    .computed()
                    .default(StaticDefault::number(22.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password", AttributeType::String)
                    .optional()
                    .write_only()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("version", AttributeType::Number)
                    .computed()
                    .build(),
            )
            .build()
    }

    fn prior() -> DynamicValue {
        DynamicValue::from_pairs([
            ("id", Dynamic::from("g_1234567890")),
            ("scope_id", Dynamic::from("o_1234567890")),
            ("name", Dynamic::from("ops")),
            ("member_ids", Dynamic::from(vec!["u_a", "u_b"])),
            ("port", Dynamic::Number(22.0)),
            ("password", Dynamic::Null),
            ("version", Dynamic::Number(2.0)),
        ])
    }

    fn config(name: &str, members: Vec<&str>) -> DynamicValue {
        DynamicValue::from_pairs([
            ("scope_id", Dynamic::from("o_1234567890")),
            ("name", Dynamic::from(name)),
            ("member_ids", Dynamic::from(members)),
            ("password", Dynamic::from("hunter2")),
        ])
    }

    fn plan(prior: &DynamicValue, config: &DynamicValue) -> (PlanAction, PlannedChange) {
        let schema = schema();
        let proposed = propose_new_state(&schema, prior, config);
        let change = plan_resource_change(&schema, prior, config, proposed);
        let action = classify(prior, &change.planned_state, &change.requires_replace);
        (action, change)
    }

    #[test]
    fn validate_reports_missing_required_and_read_only() {
        let config = DynamicValue::from_pairs([("version", Dynamic::Number(3.0))]);
        let diagnostics = validate_config(&schema(), &config);

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .any(|d| d.attribute == Some(AttributePath::new("scope_id"))));
        assert!(diagnostics
            .iter()
            .any(|d| d.attribute == Some(AttributePath::new("version"))));
    }

    #[test]
    fn validate_rejects_unsupported_and_mistyped_arguments() {
        let config = DynamicValue::from_pairs([
            ("scope_id", Dynamic::Number(1.0)),
            ("colour", Dynamic::from("blue")),
        ]);
        let diagnostics = validate_config(&schema(), &config);

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(Diagnostic::is_error));
    }

    #[test]
    fn validate_skips_validators_for_unknown_values() {
        let config = DynamicValue::from_pairs([
            ("scope_id", Dynamic::Unknown),
            ("name", Dynamic::Unknown),
        ]);
        assert!(validate_config(&schema(), &config).is_empty());
    }

    #[test]
    fn create_marks_computed_unknown_and_applies_defaults() {
        let (action, change) = plan(&DynamicValue::null(), &config("ops", vec!["u_b", "u_a"]));

        assert_eq!(action, PlanAction::Create);
        let planned = change.planned_state;
        assert!(planned.get(&AttributePath::new("id")).unwrap().is_unknown());
        assert_eq!(planned.get_number(&AttributePath::new("port")).unwrap(), 22.0);
        assert!(planned.get(&AttributePath::new("password")).unwrap().is_null());
        assert_eq!(
            planned.get_list(&AttributePath::new("member_ids")).unwrap(),
            vec![Dynamic::from("u_a"), Dynamic::from("u_b")]
        );
    }

    #[test]
    fn unchanged_config_is_a_no_op_regardless_of_set_order() {
        let (action, change) = plan(&prior(), &config("ops", vec!["u_b", "u_a", "u_b"]));

        assert_eq!(action, PlanAction::NoOp);
        assert_eq!(change.planned_state, prior());
    }

    #[test]
    fn update_marks_version_unknown_but_keeps_id() {
        let (action, change) = plan(&prior(), &config("platform", vec!["u_a", "u_b"]));

        assert_eq!(action, PlanAction::Update);
        let planned = change.planned_state;
        assert_eq!(
            planned.get_string(&AttributePath::new("id")).unwrap(),
            "g_1234567890"
        );
        assert!(planned
            .get(&AttributePath::new("version"))
            .unwrap()
            .is_unknown());
    }

    #[test]
    fn changing_force_new_attribute_replaces() {
        let mut cfg = config("ops", vec!["u_a", "u_b"]);
        cfg.set_string(&AttributePath::new("scope_id"), "o_0987654321".to_string())
            .unwrap();
        let (action, change) = plan(&prior(), &cfg);

        assert_eq!(action, PlanAction::Replace);
        assert_eq!(change.requires_replace, vec![AttributePath::new("scope_id")]);
    }

    #[test]
    fn applied_state_must_match_known_plan() {
        let schema = schema();
        let planned = prior();
        let mut applied = prior();
        applied
            .set_string(&AttributePath::new("name"), "renamed".to_string())
            .unwrap();

        let diagnostics = check_applied_state(&schema, &planned, &applied);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some(AttributePath::new("name")));
    }
}
