//! boundary_target
//!
//! Host and credential sources are attached through `:set-host-sources` and
//! `:set-credential-sources` after the target itself is written. A target
//! reaches its hosts either through `address` or through host sources, never
//! both, so sources are detached before an address is set.

use async_trait::async_trait;
use tfplug::plan_modifier::RequiresReplace;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{NumberRangeValidator, OneOfValidator};
use tracing::debug;

use super::{
    description_attribute, flag_attribute, optional_computed, parent_attribute, set_changed,
    string_set, BoundaryResource, Secrets, StateModel, StateReader, StateWriter, Tracked,
};
use crate::api::targets::{
    CreateTargetRequest, SetCredentialSourcesRequest, SetHostSourcesRequest, SshTargetAttributes,
    Target, TargetAttributes, TcpTargetAttributes,
};
use crate::api::{ApiError, Client, UpdateBody};
use crate::validators::BoundaryIdValidator;

const TARGET_TYPES: &[&str] = &["tcp", "ssh"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetModel {
    pub scope_id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub default_port: Option<u32>,
    pub default_client_port: Option<u32>,
    pub session_max_seconds: Option<u32>,
    pub session_connection_limit: Option<i32>,
    pub egress_worker_filter: Option<String>,
    pub ingress_worker_filter: Option<String>,
    pub address: Option<String>,
    pub host_source_ids: Vec<String>,
    pub brokered_credential_source_ids: Vec<String>,
    pub injected_application_credential_source_ids: Vec<String>,
    pub enable_session_recording: Option<bool>,
    pub storage_bucket_id: Option<String>,
}

impl TargetModel {
    fn is_ssh(&self) -> bool {
        self.kind == "ssh"
    }

    fn variant(&self) -> TargetAttributes {
        if self.is_ssh() {
            TargetAttributes::Ssh(SshTargetAttributes {
                default_port: self.default_port,
                default_client_port: self.default_client_port,
                enable_session_recording: self.enable_session_recording,
                storage_bucket_id: self.storage_bucket_id.clone(),
            })
        } else {
            TargetAttributes::Tcp(TcpTargetAttributes {
                default_port: self.default_port,
                default_client_port: self.default_client_port,
            })
        }
    }
}

impl StateModel for TargetModel {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError> {
        Ok(Self {
            scope_id: state.required_string("scope_id")?,
            name: state.required_string("name")?,
            description: state.string("description")?,
            kind: state.required_string("type")?,
            default_port: state.number("default_port")?,
            default_client_port: state.number("default_client_port")?,
            session_max_seconds: state.number("session_max_seconds")?,
            session_connection_limit: state.number("session_connection_limit")?,
            egress_worker_filter: state.string("egress_worker_filter")?,
            ingress_worker_filter: state.string("ingress_worker_filter")?,
            address: state.string("address")?,
            host_source_ids: state.strings("host_source_ids")?,
            brokered_credential_source_ids: state.strings("brokered_credential_source_ids")?,
            injected_application_credential_source_ids: state
                .strings("injected_application_credential_source_ids")?,
            enable_session_recording: state.bool("enable_session_recording")?,
            storage_bucket_id: state.string("storage_bucket_id")?,
        })
    }

    fn write_state(&self, state: &mut StateWriter) {
        state
            .string("scope_id", Some(&self.scope_id))
            .string("name", Some(&self.name))
            .string("description", self.description.as_deref())
            .string("type", Some(&self.kind))
            .number("default_port", self.default_port)
            .number("default_client_port", self.default_client_port)
            .number("session_max_seconds", self.session_max_seconds)
            .number("session_connection_limit", self.session_connection_limit)
            .string("egress_worker_filter", self.egress_worker_filter.as_deref())
            .string("ingress_worker_filter", self.ingress_worker_filter.as_deref())
            .string("address", self.address.as_deref())
            .strings("host_source_ids", &self.host_source_ids)
            .strings(
                "brokered_credential_source_ids",
                &self.brokered_credential_source_ids,
            )
            .strings(
                "injected_application_credential_source_ids",
                &self.injected_application_credential_source_ids,
            )
            .bool("enable_session_recording", self.enable_session_recording)
            .string("storage_bucket_id", self.storage_bucket_id.as_deref());
    }
}

impl TryFrom<Target> for Tracked<TargetModel> {
    type Error = ApiError;

    fn try_from(target: Target) -> Result<Self, ApiError> {
        let variant = target.variant()?;
        let (enable_session_recording, storage_bucket_id) = match &variant {
            TargetAttributes::Ssh(attrs) => (
                Some(attrs.enable_session_recording.unwrap_or(false)),
                attrs.storage_bucket_id.clone(),
            ),
            TargetAttributes::Tcp(_) => (None, None),
        };
        Ok(Tracked {
            model: TargetModel {
                scope_id: target.meta.scope_id.clone().unwrap_or_default(),
                name: target.meta.name.clone().unwrap_or_default(),
                description: target.meta.description.clone(),
                kind: target.kind,
                default_port: variant.default_port(),
                default_client_port: variant.default_client_port(),
                session_max_seconds: target.session_max_seconds,
                session_connection_limit: target.session_connection_limit,
                egress_worker_filter: target.egress_worker_filter,
                ingress_worker_filter: target.ingress_worker_filter,
                address: target.address,
                host_source_ids: target.host_source_ids,
                brokered_credential_source_ids: target.brokered_credential_source_ids,
                injected_application_credential_source_ids: target
                    .injected_application_credential_source_ids,
                enable_session_recording,
                storage_bucket_id,
            },
            meta: target.meta,
        })
    }
}

async fn set_host_sources(
    client: &Client,
    id: &str,
    version: u32,
    host_source_ids: &[String],
) -> Result<Target, ApiError> {
    let request = SetHostSourcesRequest {
        version,
        host_source_ids: host_source_ids.to_vec(),
    };
    client.targets().action(id, "set-host-sources", &request).await
}

async fn set_credential_sources(
    client: &Client,
    id: &str,
    version: u32,
    plan: &TargetModel,
) -> Result<Target, ApiError> {
    let request = SetCredentialSourcesRequest {
        version,
        brokered_credential_source_ids: plan.brokered_credential_source_ids.clone(),
        injected_application_credential_source_ids: plan
            .injected_application_credential_source_ids
            .clone(),
    };
    client
        .targets()
        .action(id, "set-credential-sources", &request)
        .await
}

fn configured(config: &DynamicValue, name: &str) -> bool {
    match config.get(&AttributePath::new(name)) {
        None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => false,
        Some(Dynamic::List(items)) => !items.is_empty(),
        Some(Dynamic::Bool(value)) => *value,
        Some(_) => true,
    }
}

#[derive(Default)]
pub struct TargetResource;

#[async_trait]
impl BoundaryResource for TargetResource {
    type Model = TargetModel;

    const TYPE_NAME: &'static str = "boundary_target";
    const DESCRIPTION: &'static str = "A tcp or ssh target users connect to through Boundary";

    fn attributes(&self) -> Vec<Attribute> {
        let port = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::Number)
                .description(description)
                .optional()
                .validator(NumberRangeValidator::create(Some(0.0), Some(65535.0)))
                .build()
        };
        let filter = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(description)
                .optional()
                .build()
        };
        let ids = |prefixes: &[&str]| BoundaryIdValidator::create(prefixes);
        vec![
            parent_attribute(
                "scope_id",
                "The project the target belongs to",
                BoundaryIdValidator::new(&["p"]),
            ),
            AttributeBuilder::new("name", AttributeType::String)
                .description("The name of the target, unique within its project")
                .required()
                .build(),
            description_attribute(),
            AttributeBuilder::new("type", AttributeType::String)
                .description("tcp or ssh")
                .required()
                .validator(OneOfValidator::create(TARGET_TYPES))
                .plan_modifier(RequiresReplace::create())
                .build(),
            port("default_port", "Port on the host to connect to"),
            port("default_client_port", "Local port the client listens on"),
            optional_computed(
                "session_max_seconds",
                AttributeType::Number,
                "Maximum session duration",
            ),
            optional_computed(
                "session_connection_limit",
                AttributeType::Number,
                "Connections allowed per session; -1 means unlimited",
            ),
            filter("egress_worker_filter", "Filter selecting workers that reach the host"),
            filter("ingress_worker_filter", "Filter selecting workers clients connect to"),
            AttributeBuilder::new("address", AttributeType::String)
                .description("Direct address of the host; excludes host_source_ids")
                .optional()
                .build(),
            string_set("host_source_ids", "Host sets and catalogs providing hosts")
                .validator(ids(&["hsst", "hsplg"]))
                .build(),
            string_set(
                "brokered_credential_source_ids",
                "Credential sources returned to the user",
            )
            .validator(ids(&["clvlt", "clvsclt", "credup", "credspk", "credjson"]))
            .build(),
            string_set(
                "injected_application_credential_source_ids",
                "Credential sources injected into ssh sessions",
            )
            .validator(ids(&["clvlt", "clvsclt", "credup", "credspk"]))
            .build(),
            flag_attribute(
                "enable_session_recording",
                "Record ssh sessions into storage_bucket_id",
            ),
            AttributeBuilder::new("storage_bucket_id", AttributeType::String)
                .description("Storage bucket for session recordings")
                .optional()
                .validator(ids(&["sb"]))
                .build(),
        ]
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];
        let error = |name: &str, summary: &str, detail: &str| {
            Diagnostic::error(summary, detail).with_attribute(AttributePath::new(name))
        };

        if configured(config, "address") && configured(config, "host_source_ids") {
            diagnostics.push(error(
                "address",
                "Conflicting host configuration",
                "address and host_source_ids cannot be set together",
            ));
        }

        let kind = config
            .get_optional_string(&AttributePath::new("type"))
            .ok()
            .flatten();
        if kind.as_deref() == Some("tcp") {
            for name in [
                "injected_application_credential_source_ids",
                "enable_session_recording",
                "storage_bucket_id",
            ] {
                if configured(config, name) {
                    diagnostics.push(error(
                        name,
                        "Attribute requires an ssh target",
                        &format!("{} is only supported on ssh targets", name),
                    ));
                }
            }
        }

        let recording = matches!(
            config.get(&AttributePath::new("enable_session_recording")),
            Some(Dynamic::Bool(true))
        );
        let bucket = config.get(&AttributePath::new("storage_bucket_id"));
        if recording && matches!(bucket, None | Some(Dynamic::Null)) {
            diagnostics.push(error(
                "storage_bucket_id",
                "Missing storage bucket",
                "enable_session_recording requires storage_bucket_id",
            ));
        }
        diagnostics
    }

    async fn create(
        &self,
        client: &Client,
        plan: &TargetModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<TargetModel>, ApiError> {
        let request = CreateTargetRequest {
            scope_id: plan.scope_id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            session_max_seconds: plan.session_max_seconds,
            session_connection_limit: plan.session_connection_limit,
            egress_worker_filter: plan.egress_worker_filter.clone(),
            ingress_worker_filter: plan.ingress_worker_filter.clone(),
            address: plan.address.clone(),
            attributes: plan.variant(),
        };
        let mut target = client.targets().create(&request).await?;
        let id = target.meta.id.clone();

        if !plan.host_source_ids.is_empty() {
            target = set_host_sources(client, &id, target.meta.version, &plan.host_source_ids).await?;
        }
        if !plan.brokered_credential_source_ids.is_empty()
            || !plan.injected_application_credential_source_ids.is_empty()
        {
            target = set_credential_sources(client, &id, target.meta.version, plan).await?;
        }
        target.try_into()
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<TargetModel>, ApiError> {
        client.targets().read(id).await?.try_into()
    }

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<TargetModel>,
        plan: &TargetModel,
        _secrets: &Secrets,
    ) -> Result<Tracked<TargetModel>, ApiError> {
        let id = &prior.meta.id;
        let old = &prior.model;
        let mut version = prior.meta.version;
        let mut latest: Option<Target> = None;

        let hosts_changed = set_changed(&old.host_source_ids, &plan.host_source_ids);
        let detach_first = hosts_changed && plan.host_source_ids.is_empty();
        if detach_first {
            debug!(%id, "detaching host sources");
            let target = set_host_sources(client, id, version, &[]).await?;
            version = target.meta.version;
            latest = Some(target);
        }

        let mut body = UpdateBody::new(version);
        body.optional("name", &Some(&old.name), &Some(&plan.name))
            .optional("description", &old.description, &plan.description)
            .computed("session_max_seconds", &old.session_max_seconds, &plan.session_max_seconds)
            .computed(
                "session_connection_limit",
                &old.session_connection_limit,
                &plan.session_connection_limit,
            )
            .optional(
                "egress_worker_filter",
                &old.egress_worker_filter,
                &plan.egress_worker_filter,
            )
            .optional(
                "ingress_worker_filter",
                &old.ingress_worker_filter,
                &plan.ingress_worker_filter,
            )
            .optional("address", &old.address, &plan.address)
            .attribute_optional("default_port", &old.default_port, &plan.default_port)
            .attribute_optional(
                "default_client_port",
                &old.default_client_port,
                &plan.default_client_port,
            );
        if plan.is_ssh() {
            body.attribute_computed(
                "enable_session_recording",
                &old.enable_session_recording,
                &plan.enable_session_recording,
            )
            .attribute_optional(
                "storage_bucket_id",
                &old.storage_bucket_id,
                &plan.storage_bucket_id,
            );
        }
        if body.has_changes() {
            let target = client.targets().update(id, &body.into_value()).await?;
            version = target.meta.version;
            latest = Some(target);
        }

        if hosts_changed && !detach_first {
            let target = set_host_sources(client, id, version, &plan.host_source_ids).await?;
            version = target.meta.version;
            latest = Some(target);
        }

        let credentials_changed = set_changed(
            &old.brokered_credential_source_ids,
            &plan.brokered_credential_source_ids,
        ) || set_changed(
            &old.injected_application_credential_source_ids,
            &plan.injected_application_credential_source_ids,
        );
        if credentials_changed {
            latest = Some(set_credential_sources(client, id, version, plan).await?);
        }

        match latest {
            Some(target) => target.try_into(),
            None => self.read(client, id).await,
        }
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        client.targets().delete(id).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::ItemMeta;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config(mut pairs: Vec<(&str, Dynamic)>) -> DynamicValue {
        pairs.push(("scope_id", Dynamic::from("p_1234567890")));
        pairs.push(("name", Dynamic::from("db")));
        DynamicValue::from_pairs(pairs)
    }

    fn attributes_of(diagnostics: &[Diagnostic]) -> Vec<AttributePath> {
        diagnostics.iter().filter_map(|d| d.attribute.clone()).collect()
    }

    #[test]
    fn address_excludes_host_sources() {
        let diagnostics = TargetResource.validate(&config(vec![
            ("type", Dynamic::from("tcp")),
            ("address", Dynamic::from("10.0.0.5")),
            (
                "host_source_ids",
                Dynamic::List(vec![Dynamic::from("hsst_1234567890")]),
            ),
        ]));
        assert_eq!(attributes_of(&diagnostics), vec![AttributePath::new("address")]);
    }

    #[test]
    fn recording_is_ssh_only_and_needs_a_bucket() {
        let diagnostics = TargetResource.validate(&config(vec![
            ("type", Dynamic::from("tcp")),
            ("enable_session_recording", Dynamic::Bool(true)),
        ]));
        assert_eq!(
            attributes_of(&diagnostics),
            vec![
                AttributePath::new("enable_session_recording"),
                AttributePath::new("storage_bucket_id"),
            ]
        );

        let diagnostics = TargetResource.validate(&config(vec![
            ("type", Dynamic::from("ssh")),
            ("enable_session_recording", Dynamic::Bool(true)),
            ("storage_bucket_id", Dynamic::from("sb_1234567890")),
        ]));
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn create_attaches_sources_with_chained_versions() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/v1/targets")
            .match_body(Matcher::Json(json!({
                "scope_id": "p_1234567890",
                "name": "db",
                "type": "tcp",
                "attributes": {"default_port": 5432}
            })))
            .with_body(
                r#"{"id":"ttcp_1234567890","scope_id":"p_1234567890","name":"db","type":"tcp","version":1,"attributes":{"default_port":5432},"session_max_seconds":28800,"session_connection_limit":-1}"#,
            )
            .create_async()
            .await;
        let hosts = server
            .mock("POST", "/v1/targets/ttcp_1234567890:set-host-sources")
            .match_body(Matcher::Json(json!({
                "version": 1,
                "host_source_ids": ["hsst_1234567890"]
            })))
            .with_body(
                r#"{"id":"ttcp_1234567890","scope_id":"p_1234567890","name":"db","type":"tcp","version":2,"attributes":{"default_port":5432},"host_source_ids":["hsst_1234567890"],"session_max_seconds":28800,"session_connection_limit":-1}"#,
            )
            .create_async()
            .await;
        let credentials = server
            .mock("POST", "/v1/targets/ttcp_1234567890:set-credential-sources")
            .match_body(Matcher::Json(json!({
                "version": 2,
                "brokered_credential_source_ids": ["credup_1234567890"]
            })))
            .with_body(
                r#"{"id":"ttcp_1234567890","scope_id":"p_1234567890","name":"db","type":"tcp","version":3,"attributes":{"default_port":5432},"host_source_ids":["hsst_1234567890"],"brokered_credential_source_ids":["credup_1234567890"],"session_max_seconds":28800,"session_connection_limit":-1}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let plan = TargetModel {
            scope_id: "p_1234567890".to_string(),
            name: "db".to_string(),
            kind: "tcp".to_string(),
            default_port: Some(5432),
            host_source_ids: vec!["hsst_1234567890".to_string()],
            brokered_credential_source_ids: vec!["credup_1234567890".to_string()],
            ..Default::default()
        };
        let target = TargetResource
            .create(&client, &plan, &Secrets::default())
            .await
            .unwrap();

        create.assert_async().await;
        hosts.assert_async().await;
        credentials.assert_async().await;
        assert_eq!(target.meta.version, 3);
        assert_eq!(target.model.session_connection_limit, Some(-1));
        assert_eq!(target.model.enable_session_recording, None);
    }

    #[tokio::test]
    async fn switching_to_an_address_detaches_hosts_first() {
        let mut server = Server::new_async().await;
        let detach = server
            .mock("POST", "/v1/targets/ttcp_1234567890:set-host-sources")
            .match_body(Matcher::Json(json!({"version": 5, "host_source_ids": []})))
            .with_body(
                r#"{"id":"ttcp_1234567890","scope_id":"p_1234567890","name":"db","type":"tcp","version":6,"attributes":{}}"#,
            )
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/v1/targets/ttcp_1234567890")
            .match_body(Matcher::Json(json!({"version": 6, "address": "10.0.0.5"})))
            .with_body(
                r#"{"id":"ttcp_1234567890","scope_id":"p_1234567890","name":"db","type":"tcp","version":7,"attributes":{},"address":"10.0.0.5"}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), false).unwrap();
        let prior = Tracked {
            meta: ItemMeta {
                id: "ttcp_1234567890".to_string(),
                version: 5,
                ..Default::default()
            },
            model: TargetModel {
                scope_id: "p_1234567890".to_string(),
                name: "db".to_string(),
                kind: "tcp".to_string(),
                host_source_ids: vec!["hsst_1234567890".to_string()],
                ..Default::default()
            },
        };
        let plan = TargetModel {
            host_source_ids: vec![],
            address: Some("10.0.0.5".to_string()),
            ..prior.model.clone()
        };

        let target = TargetResource
            .update(&client, &prior, &plan, &Secrets::default())
            .await
            .unwrap();

        detach.assert_async().await;
        patch.assert_async().await;
        assert_eq!(target.meta.version, 7);
        assert_eq!(target.model.address.as_deref(), Some("10.0.0.5"));
    }
}
