//! data.boundary_sessions

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::OneOfValidator;

use super::BoundaryDataSource;
use crate::api::sessions::Session;
use crate::api::{ApiError, ApiQueryParams, Client};
use crate::resources::StateWriter;
use crate::validators::BoundaryIdValidator;

const SESSION_FIELDS: [&str; 8] = [
    "id",
    "target_id",
    "user_id",
    "host_id",
    "status",
    "type",
    "created_time",
    "expiration_time",
];

/// Filter expression for the optional item filters, `None` when none is set
fn session_filter(criteria: &[(&str, Option<String>)]) -> Option<String> {
    let clauses: Vec<String> = criteria
        .iter()
        .filter_map(|(field, value)| {
            value
                .as_ref()
                .map(|value| format!("\"/item/{}\" == \"{}\"", field, value.replace('"', "\\\"")))
        })
        .collect();
    (!clauses.is_empty()).then(|| clauses.join(" and "))
}

fn session_value(session: &Session) -> Dynamic {
    let string = |value: Option<&String>| value.map_or(Dynamic::Null, |v| Dynamic::from(v.as_str()));
    Dynamic::Map(HashMap::from([
        ("id".to_string(), Dynamic::from(session.id.as_str())),
        ("target_id".to_string(), string(session.target_id.as_ref())),
        ("user_id".to_string(), string(session.user_id.as_ref())),
        ("host_id".to_string(), string(session.host_id.as_ref())),
        ("status".to_string(), string(session.status.as_ref())),
        ("type".to_string(), string(session.kind.as_ref())),
        ("created_time".to_string(), string(session.created_time.as_ref())),
        ("expiration_time".to_string(), string(session.expiration_time.as_ref())),
    ]))
}

#[derive(Default)]
pub struct SessionsDataSource;

#[async_trait]
impl BoundaryDataSource for SessionsDataSource {
    const TYPE_NAME: &'static str = "boundary_sessions";
    const DESCRIPTION: &'static str = "List sessions in a scope";

    fn attributes(&self) -> Vec<Attribute> {
        let session = SESSION_FIELDS
            .iter()
            .map(|field| (field.to_string(), AttributeType::String))
            .collect();
        vec![
            AttributeBuilder::new("scope_id", AttributeType::String)
                .description("Scope to list sessions in")
                .optional()
                .validator(BoundaryIdValidator::new(&["o", "p"]).or_literal("global").boxed())
                .build(),
            AttributeBuilder::new("target_id", AttributeType::String)
                .optional()
                .build(),
            AttributeBuilder::new("user_id", AttributeType::String)
                .optional()
                .build(),
            AttributeBuilder::new("status", AttributeType::String)
                .optional()
                .validator(OneOfValidator::create(&[
                    "pending",
                    "active",
                    "canceling",
                    "terminated",
                ]))
                .build(),
            AttributeBuilder::new("recursive", AttributeType::Bool)
                .description("Include sessions of child scopes")
                .optional()
                .build(),
            AttributeBuilder::new(
                "sessions",
                AttributeType::List(Box::new(AttributeType::Object(session))),
            )
            .computed()
            .build(),
        ]
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let path = AttributePath::new("scope_id");
        match config.get(&path) {
            None | Some(Dynamic::Null) => vec![Diagnostic::error(
                "Missing required argument",
                "scope_id is required to list sessions",
            )
            .with_attribute(path)],
            _ => vec![],
        }
    }

    async fn read(&self, client: &Client, config: &DynamicValue) -> Result<DynamicValue, ApiError> {
        let string = |name: &str| config.get_optional_string(&AttributePath::new(name));
        let scope_id = string("scope_id")?
            .ok_or_else(|| ApiError::Validation("scope_id is required".to_string()))?;
        let target_id = string("target_id")?;
        let user_id = string("user_id")?;
        let status = string("status")?;
        let recursive = config.get_optional_bool(&AttributePath::new("recursive"))?;

        let filter = session_filter(&[
            ("target_id", target_id.clone()),
            ("user_id", user_id.clone()),
            ("status", status.clone()),
        ]);
        let params = ApiQueryParams::new()
            .add("scope_id", &scope_id)
            .add_optional("recursive", recursive.filter(|r| *r))
            .add_optional("filter", filter);
        let sessions = client.sessions().list(params).await?;

        let mut state = StateWriter::new();
        state
            .string("scope_id", Some(&scope_id))
            .string("target_id", target_id.as_deref())
            .string("user_id", user_id.as_deref())
            .string("status", status.as_deref())
            .bool("recursive", recursive)
            .value(
                "sessions",
                Dynamic::List(sessions.iter().map(session_value).collect()),
            );
        Ok(state.finish())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn scope_is_required() {
        let diagnostics = SessionsDataSource.validate(&DynamicValue::object());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some(AttributePath::new("scope_id")));
    }

    #[test]
    fn filters_combine_with_and() {
        assert_eq!(session_filter(&[("status", None)]), None);
        assert_eq!(
            session_filter(&[
                ("target_id", Some("ttcp_1234567890".to_string())),
                ("status", Some("active".to_string())),
            ])
            .as_deref(),
            Some(r#""/item/target_id" == "ttcp_1234567890" and "/item/status" == "active""#)
        );
    }

    #[tokio::test]
    async fn lists_active_sessions_recursively() {
        let mut server = Server::new_async().await;
        let list = server
            .mock("GET", "/v1/sessions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("scope_id".into(), "global".into()),
                Matcher::UrlEncoded("recursive".into(), "true".into()),
                Matcher::UrlEncoded("filter".into(), r#""/item/status" == "active""#.into()),
            ]))
            .with_body(
                r#"{"items":[{"id":"s_1234567890","scope_id":"p_1234567890","target_id":"ttcp_1234567890","user_id":"u_1234567890","status":"active","type":"tcp","created_time":"2024-05-01T10:00:00Z"}]}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let config = DynamicValue::from_pairs([
            ("scope_id", Dynamic::from("global")),
            ("status", Dynamic::from("active")),
            ("recursive", Dynamic::Bool(true)),
        ]);
        let state = SessionsDataSource.read(&client, &config).await.unwrap();

        list.assert_async().await;
        let Some(Dynamic::List(sessions)) = state.get(&AttributePath::new("sessions")) else {
            panic!("sessions should be a list");
        };
        assert_eq!(sessions.len(), 1);
        let Dynamic::Map(session) = &sessions[0] else {
            panic!("session should be an object");
        };
        assert_eq!(session["id"], Dynamic::from("s_1234567890"));
        assert_eq!(session["host_id"], Dynamic::Null);
    }
}
