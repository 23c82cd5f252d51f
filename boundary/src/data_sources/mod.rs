//! Boundary data sources
//!
//! Single-item data sources look an object up either by `id` or by `name`
//! within a parent. A name lookup lists the parent collection with a
//! server-side filter and must match exactly one object.

pub mod account;
pub mod auth_method;
pub mod group;
pub mod scope;
pub mod sessions;
pub mod target;
pub mod user;

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource,
    DataSourceSchemaRequest, DataSourceSchemaResponse, DataSourceWithConfigure,
    ReadDataSourceRequest, ReadDataSourceResponse, ValidateDataSourceConfigRequest,
    ValidateDataSourceConfigResponse,
};
use tfplug::provider::DataSourceFactory;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tracing::debug;

use crate::api::{cancellable, ApiError, ApiQueryParams, BoundaryApiResource, Client, Collection};
use crate::resources::{error_diagnostics, provider_data_from};
use crate::validators::BoundaryIdValidator;
use crate::BoundaryProviderData;

#[async_trait]
pub trait BoundaryDataSource: Default + Send + Sync + 'static {
    const TYPE_NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn attributes(&self) -> Vec<Attribute>;

    fn validate(&self, _config: &DynamicValue) -> Vec<Diagnostic> {
        vec![]
    }

    /// Full state of the data source, configured lookup attributes included
    async fn read(&self, client: &Client, config: &DynamicValue) -> Result<DynamicValue, ApiError>;
}

/// `id`, `name` and the parent attribute of a single-item lookup
pub(crate) fn lookup_attributes(parent: &str, id: BoundaryIdValidator) -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("id", AttributeType::String)
            .description("ID of the object; conflicts with name")
            .optional()
            .computed()
            .build(),
        AttributeBuilder::new("name", AttributeType::String)
            .description(&format!("Name of the object, unique within {}", parent))
            .optional()
            .computed()
            .build(),
        AttributeBuilder::new(parent, AttributeType::String)
            .description(&format!("Required with name: the {} to search", parent))
            .optional()
            .computed()
            .validator(id.boxed())
            .build(),
        AttributeBuilder::new("description", AttributeType::String)
            .computed()
            .build(),
    ]
}

/// A single-item lookup taken from configuration
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lookup {
    Id(String),
    Name { name: String, parent: String },
}

impl Lookup {
    pub fn from_config(config: &DynamicValue, parent: &str) -> Result<Self, ApiError> {
        let string = |name: &str| config.get_optional_string(&AttributePath::new(name));
        match (string("id")?, string("name")?, string(parent)?) {
            (Some(id), _, _) => Ok(Lookup::Id(id)),
            (None, Some(name), Some(parent)) => Ok(Lookup::Name { name, parent }),
            (None, Some(_), None) => Err(ApiError::Validation(format!(
                "{} is required when looking up by name",
                parent
            ))),
            (None, None, _) => Err(ApiError::Validation(
                "one of id or name must be set".to_string(),
            )),
        }
    }

    /// Configuration errors caught before any request
    pub fn validate(config: &DynamicValue, parent: &str) -> Vec<Diagnostic> {
        let set = |name: &str| {
            !matches!(
                config.get(&AttributePath::new(name)),
                None | Some(Dynamic::Null)
            )
        };
        match (set("id"), set("name")) {
            (false, false) => vec![Diagnostic::error(
                "Missing lookup attribute",
                "Exactly one of \"id\" or \"name\" must be set",
            )
            .with_attribute(AttributePath::new("id"))],
            (true, true) => vec![Diagnostic::error(
                "Conflicting lookup attributes",
                "\"id\" and \"name\" cannot both be set",
            )
            .with_attribute(AttributePath::new("name"))],
            (false, true) if !set(parent) => vec![Diagnostic::error(
                "Missing lookup attribute",
                format!("\"{}\" is required when looking up by name", parent),
            )
            .with_attribute(AttributePath::new(parent))],
            _ => vec![],
        }
    }

    pub async fn find<T: BoundaryApiResource>(&self, collection: Collection<'_, T>) -> Result<T, ApiError> {
        let (name, parent) = match self {
            Lookup::Id(id) => return collection.read(id).await,
            Lookup::Name { name, parent } => (name, parent),
        };
        let params = ApiQueryParams::new()
            .add(T::PARENT_PARAM, parent)
            .add("filter", name_filter(name));
        let mut items = collection.list(params).await?;
        match items.len() {
            0 => Err(ApiError::NotFound(format!(
                "no {} named \"{}\" in {}",
                T::COLLECTION,
                name,
                parent
            ))),
            1 => Ok(items.remove(0)),
            n => Err(ApiError::Validation(format!(
                "name \"{}\" is ambiguous: {} {} match in {}",
                name,
                n,
                T::COLLECTION,
                parent
            ))),
        }
    }
}

/// Boundary filter expression matching one name exactly
fn name_filter(name: &str) -> String {
    format!(
        "\"/item/name\" == \"{}\"",
        name.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Adapts a [`BoundaryDataSource`] to the tfplug data source traits
pub struct ManagedDataSource<D: BoundaryDataSource> {
    handler: D,
    provider_data: Option<BoundaryProviderData>,
}

impl<D: BoundaryDataSource> ManagedDataSource<D> {
    pub fn new() -> Self {
        Self {
            handler: D::default(),
            provider_data: None,
        }
    }

    pub fn factory() -> DataSourceFactory {
        Box::new(|| Box::new(Self::new()))
    }

    pub fn schema() -> Schema {
        SchemaBuilder::new()
            .description(D::DESCRIPTION)
            .attributes(D::default().attributes())
            .build()
    }

    async fn do_read(&self, config: &DynamicValue) -> Result<DynamicValue, ApiError> {
        let client = match &self.provider_data {
            Some(data) => data.client().await?,
            None => {
                return Err(ApiError::Validation(
                    "the provider has not been configured".to_string(),
                ))
            }
        };
        let state = self.handler.read(&client, config).await?;
        debug!(data_source = D::TYPE_NAME, "read data source");
        Ok(state)
    }
}

impl<D: BoundaryDataSource> Default for ManagedDataSource<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: BoundaryDataSource> DataSource for ManagedDataSource<D> {
    fn type_name(&self) -> &str {
        D::TYPE_NAME
    }

    async fn schema(&self, _ctx: Context, _request: DataSourceSchemaRequest) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: Self::schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: self.handler.validate(&request.config),
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        match cancellable(&ctx, self.do_read(&request.config)).await {
            Ok(state) => ReadDataSourceResponse {
                state,
                diagnostics: vec![],
            },
            Err(e) => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: error_diagnostics("read", D::TYPE_NAME, &e),
            },
        }
    }
}

#[async_trait]
impl<D: BoundaryDataSource> DataSourceWithConfigure for ManagedDataSource<D> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let (provider_data, diagnostics) = provider_data_from(request.provider_data, "data source");
        self.provider_data = provider_data;
        ConfigureDataSourceResponse { diagnostics }
    }
}

/// Factories for every data source, keyed by type name
pub fn factories() -> HashMap<String, DataSourceFactory> {
    fn entry<D: BoundaryDataSource>() -> (String, DataSourceFactory) {
        (D::TYPE_NAME.to_string(), ManagedDataSource::<D>::factory())
    }

    HashMap::from([
        entry::<scope::ScopeDataSource>(),
        entry::<auth_method::AuthMethodDataSource>(),
        entry::<account::AccountDataSource>(),
        entry::<user::UserDataSource>(),
        entry::<group::GroupDataSource>(),
        entry::<target::TargetDataSource>(),
        entry::<sessions::SessionsDataSource>(),
    ])
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::groups::Group;
    use mockito::{Matcher, Server};

    #[test]
    fn lookup_needs_id_or_name() {
        let diagnostics = Lookup::validate(&DynamicValue::object(), "scope_id");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].detail.contains("\"id\""));
        assert!(diagnostics[0].detail.contains("\"name\""));

        let by_name = DynamicValue::from_pairs([("name", Dynamic::from("ops"))]);
        let diagnostics = Lookup::validate(&by_name, "scope_id");
        assert_eq!(diagnostics[0].attribute, Some(AttributePath::new("scope_id")));

        let config = DynamicValue::from_pairs([
            ("name", Dynamic::from("ops")),
            ("scope_id", Dynamic::from("o_1234567890")),
        ]);
        assert!(Lookup::validate(&config, "scope_id").is_empty());
        assert_eq!(
            Lookup::from_config(&config, "scope_id").unwrap(),
            Lookup::Name {
                name: "ops".to_string(),
                parent: "o_1234567890".to_string()
            }
        );
    }

    #[test]
    fn name_filter_quotes_the_name() {
        assert_eq!(name_filter("ops"), r#""/item/name" == "ops""#);
        assert_eq!(name_filter(r#"a"b"#), r#""/item/name" == "a\"b""#);
    }

    #[tokio::test]
    async fn name_lookup_requires_exactly_one_match() {
        let mut server = Server::new_async().await;
        let lookup = Lookup::Name {
            name: "ops".to_string(),
            parent: "o_1234567890".to_string(),
        };
        let query = Matcher::AllOf(vec![
            Matcher::UrlEncoded("scope_id".into(), "o_1234567890".into()),
            Matcher::UrlEncoded("filter".into(), r#""/item/name" == "ops""#.into()),
        ]);

        let none = server
            .mock("GET", "/v1/groups")
            .match_query(query.clone())
            .with_body(r#"{"items":[]}"#)
            .create_async()
            .await;
        let client = Client::new(&server.url(), false).unwrap();
        let err = lookup.find::<Group>(client.groups()).await.unwrap_err();
        assert!(err.is_not_found());
        none.remove_async().await;

        server
            .mock("GET", "/v1/groups")
            .match_query(query)
            .with_body(
                r#"{"items":[{"id":"g_1111111111","name":"ops","version":1},{"id":"g_2222222222","name":"ops","version":1}]}"#,
            )
            .create_async()
            .await;
        let err = lookup.find::<Group>(client.groups()).await.unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn every_data_source_has_a_schema() {
        for (type_name, factory) in factories() {
            assert_eq!(factory().type_name(), type_name);
        }
        assert_eq!(factories().len(), 7);
    }
}
