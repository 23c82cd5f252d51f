//! Boundary resources
//!
//! Every resource type implements [`BoundaryResource`]: its schema, a typed
//! model of its configurable attributes and the API calls behind create, read,
//! update and delete. [`ManagedResource`] turns such a handler into a tfplug
//! resource and owns everything the handlers share: the computed `id`,
//! `version`, timestamps and `authorized_actions`, write-only secrets and
//! their digests, cancellation and the mapping of API errors to diagnostics.

pub mod account_ldap;
pub mod account_oidc;
pub mod account_password;
pub mod auth_method_ldap;
pub mod auth_method_oidc;
pub mod auth_method_password;
pub mod credential_json;
pub mod credential_library_vault;
pub mod credential_library_vault_ssh_certificate;
pub mod credential_ssh_private_key;
pub mod credential_store_static;
pub mod credential_store_vault;
pub mod credential_username_password;
pub mod group;
pub mod host_catalog_static;
pub mod host_set_static;
pub mod host_static;
pub mod managed_group;
pub mod managed_group_ldap;
mod primary;
pub mod role;
pub mod scope;
pub mod storage_bucket;
pub mod target;
pub mod user;
pub mod worker;

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::plan::set_planned;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::provider::ResourceFactory;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ModifyPlanRequest,
    ModifyPlanResponse, ReadResourceRequest, ReadResourceResponse, Resource,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tracing::{debug, info};

use crate::api::{cancellable, ApiError, Client, ItemMeta};
use crate::digest::secret_digest;
use crate::validators::BoundaryIdValidator;
use crate::BoundaryProviderData;

/// A remote object as last seen: server-managed metadata plus the model
#[derive(Debug, Clone)]
pub struct Tracked<M> {
    pub meta: ItemMeta,
    pub model: M,
}

/// Typed view of a resource's configurable attributes
pub trait StateModel: Sized + Send + Sync {
    fn from_state(state: &StateReader<'_>) -> Result<Self, ApiError>;

    /// Write every attribute the model owns, nulls included
    fn write_state(&self, state: &mut StateWriter);
}

/// A write-only attribute. Its digest lives in `<attribute>_digest`.
#[derive(Debug, Clone, Copy)]
pub struct Secret {
    pub attribute: &'static str,
    /// Changing the secret replaces the resource
    pub force_new: bool,
}

impl Secret {
    pub const fn new(attribute: &'static str) -> Self {
        Self {
            attribute,
            force_new: false,
        }
    }

    pub const fn force_new(attribute: &'static str) -> Self {
        Self {
            attribute,
            force_new: true,
        }
    }

    pub fn digest_attribute(&self) -> String {
        format!("{}_digest", self.attribute)
    }
}

#[async_trait]
pub trait BoundaryResource: Default + Send + Sync + 'static {
    type Model: StateModel;

    const TYPE_NAME: &'static str;
    const DESCRIPTION: &'static str;
    const SECRETS: &'static [Secret] = &[];
    /// Attributes the API does not return. Refresh keeps the value from
    /// state whenever `read` leaves them null.
    const PRESERVED: &'static [&'static str] = &[];

    /// Resource specific attributes; the shared computed ones are added for you
    fn attributes(&self) -> Vec<Attribute>;

    /// Cross-field checks that need no network access
    fn validate(&self, _config: &DynamicValue) -> Vec<Diagnostic> {
        vec![]
    }

    async fn create(
        &self,
        client: &Client,
        plan: &Self::Model,
        secrets: &Secrets,
    ) -> Result<Tracked<Self::Model>, ApiError>;

    async fn read(&self, client: &Client, id: &str) -> Result<Tracked<Self::Model>, ApiError>;

    async fn update(
        &self,
        client: &Client,
        prior: &Tracked<Self::Model>,
        plan: &Self::Model,
        secrets: &Secrets,
    ) -> Result<Tracked<Self::Model>, ApiError>;

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError>;
}

/// Read access to a state or plan value
pub struct StateReader<'a> {
    value: &'a DynamicValue,
}

impl<'a> StateReader<'a> {
    pub fn new(value: &'a DynamicValue) -> Self {
        Self { value }
    }

    pub fn string(&self, name: &str) -> Result<Option<String>, ApiError> {
        Ok(self.value.get_optional_string(&AttributePath::new(name))?)
    }

    pub fn required_string(&self, name: &str) -> Result<String, ApiError> {
        self.string(name)?
            .ok_or_else(|| ApiError::Validation(format!("\"{}\" must be set", name)))
    }

    pub fn bool(&self, name: &str) -> Result<Option<bool>, ApiError> {
        Ok(self.value.get_optional_bool(&AttributePath::new(name))?)
    }

    pub fn number<N: TryFrom<i64>>(&self, name: &str) -> Result<Option<N>, ApiError> {
        match self.value.get_optional_int(&AttributePath::new(name))? {
            None => Ok(None),
            Some(n) => N::try_from(n)
                .map(Some)
                .map_err(|_| ApiError::Validation(format!("\"{}\" is out of range: {}", name, n))),
        }
    }

    /// Sets and lists of strings; unset reads as empty
    pub fn strings(&self, name: &str) -> Result<Vec<String>, ApiError> {
        Ok(self
            .value
            .get_optional_strings(&AttributePath::new(name))?
            .unwrap_or_default())
    }

    /// Maps of strings; unset reads as empty
    pub fn string_map(&self, name: &str) -> Result<HashMap<String, String>, ApiError> {
        Ok(self
            .value
            .get_optional_string_map(&AttributePath::new(name))?
            .unwrap_or_default())
    }
}

/// Builds a state object one attribute at a time
pub struct StateWriter {
    entries: HashMap<String, Dynamic>,
}

impl StateWriter {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn string(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        let value = value.map_or(Dynamic::Null, Dynamic::from);
        self.entries.insert(name.to_string(), value);
        self
    }

    pub fn bool(&mut self, name: &str, value: Option<bool>) -> &mut Self {
        let value = value.map_or(Dynamic::Null, Dynamic::Bool);
        self.entries.insert(name.to_string(), value);
        self
    }

    pub fn number<N: Into<f64>>(&mut self, name: &str, value: Option<N>) -> &mut Self {
        let value = value.map_or(Dynamic::Null, |n| Dynamic::Number(n.into()));
        self.entries.insert(name.to_string(), value);
        self
    }

    /// Empty collections are stored as null
    pub fn strings(&mut self, name: &str, values: &[String]) -> &mut Self {
        let value = if values.is_empty() {
            Dynamic::Null
        } else {
            Dynamic::List(values.iter().map(|v| Dynamic::from(v.as_str())).collect())
        };
        self.entries.insert(name.to_string(), value);
        self
    }

    pub fn string_map(&mut self, name: &str, values: &HashMap<String, String>) -> &mut Self {
        let value = if values.is_empty() {
            Dynamic::Null
        } else {
            Dynamic::Map(
                values
                    .iter()
                    .map(|(k, v)| (k.clone(), Dynamic::from(v.as_str())))
                    .collect(),
            )
        };
        self.entries.insert(name.to_string(), value);
        self
    }

    pub fn value(&mut self, name: &str, value: Dynamic) -> &mut Self {
        self.entries.insert(name.to_string(), value);
        self
    }

    pub fn null(&mut self, name: &str) -> &mut Self {
        self.entries.insert(name.to_string(), Dynamic::Null);
        self
    }

    pub fn finish(self) -> DynamicValue {
        DynamicValue::new(Dynamic::Map(self.entries))
    }
}

impl Default for StateWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write-only secret values taken from configuration, with change tracking
#[derive(Default)]
pub struct Secrets {
    entries: HashMap<&'static str, SecretValue>,
}

struct SecretValue {
    value: Option<String>,
    digest: Option<String>,
    changed: bool,
}

impl Secrets {
    /// Secrets come from configuration only. A secret counts as changed when
    /// its digest differs from the one recorded in `prior`.
    pub fn collect(
        specs: &[Secret],
        config: &DynamicValue,
        prior: &DynamicValue,
    ) -> Result<Self, ApiError> {
        let mut entries = HashMap::new();
        for spec in specs {
            let value = config.get_optional_string(&AttributePath::new(spec.attribute))?;
            let digest = value.as_deref().map(secret_digest);
            let prior_digest =
                prior.get_optional_string(&AttributePath::new(&spec.digest_attribute()))?;
            entries.insert(
                spec.attribute,
                SecretValue {
                    changed: digest != prior_digest,
                    value,
                    digest,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn value(&self, attribute: &str) -> Option<&str> {
        self.entries
            .get(attribute)
            .and_then(|entry| entry.value.as_deref())
    }

    pub fn changed(&self, attribute: &str) -> bool {
        self.entries
            .get(attribute)
            .map(|entry| entry.changed)
            .unwrap_or(false)
    }

    fn digest(&self, attribute: &str) -> Option<&str> {
        self.entries
            .get(attribute)
            .and_then(|entry| entry.digest.as_deref())
    }
}

/// Computed attributes every resource carries
fn computed_attributes() -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("id", AttributeType::String)
            .description("The ID of the resource")
            .computed()
            .plan_modifier(UseStateForUnknown::create())
            .build(),
        AttributeBuilder::new("version", AttributeType::Number)
            .description("Optimistic-concurrency version of the resource")
            .computed()
            .build(),
        AttributeBuilder::new("created_time", AttributeType::String)
            .computed()
            .plan_modifier(UseStateForUnknown::create())
            .build(),
        AttributeBuilder::new("updated_time", AttributeType::String)
            .computed()
            .build(),
        AttributeBuilder::new(
            "authorized_actions",
            AttributeType::List(Box::new(AttributeType::String)),
        )
        .description("Actions the caller may perform on the resource")
        .computed()
        .build(),
    ]
}

fn digest_attribute(secret: &Secret) -> Attribute {
    let mut builder = AttributeBuilder::new(&secret.digest_attribute(), AttributeType::String)
        .description(&format!("SHA-256 digest of `{}`", secret.attribute))
        .computed()
        .plan_modifier(UseStateForUnknown::create());
    if secret.force_new {
        builder = builder.plan_modifier(RequiresReplace::create());
    }
    builder.build()
}

pub(crate) fn name_attribute() -> Attribute {
    AttributeBuilder::new("name", AttributeType::String)
        .description("The name of the resource")
        .optional()
        .build()
}

pub(crate) fn description_attribute() -> Attribute {
    AttributeBuilder::new("description", AttributeType::String)
        .description("The description of the resource")
        .optional()
        .build()
}

/// Required reference to the parent object; moving to another parent replaces
pub(crate) fn parent_attribute(name: &str, description: &str, id: BoundaryIdValidator) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .required()
        .validator(id.boxed())
        .plan_modifier(RequiresReplace::create())
        .build()
}

pub(crate) fn string_set(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::Set(Box::new(AttributeType::String)))
        .description(description)
        .optional()
}

/// Optional flag the API omits when false. Unset keeps the remote value, so
/// read must map an absent flag to `Some(false)`.
pub(crate) fn flag_attribute(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::Bool)
        .description(description)
        .optional()
        .computed()
        .plan_modifier(UseStateForUnknown::create())
        .build()
}

/// Optional value the server fills in when it is not configured
pub(crate) fn optional_computed(name: &str, r#type: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .optional()
        .computed()
        .plan_modifier(UseStateForUnknown::create())
        .build()
}

/// Collections are sent as null rather than `[]` when cleared
pub(crate) fn non_empty(values: &[String]) -> Option<&[String]> {
    (!values.is_empty()).then_some(values)
}

/// Order-insensitive comparison of two id sets
pub(crate) fn set_changed(prior: &[String], planned: &[String]) -> bool {
    let mut prior = prior.to_vec();
    let mut planned = planned.to_vec();
    prior.sort();
    prior.dedup();
    planned.sort();
    planned.dedup();
    prior != planned
}

fn write_meta(state: &mut StateWriter, meta: &ItemMeta) {
    state
        .string("id", Some(&meta.id))
        .number("version", Some(meta.version))
        .string("created_time", meta.created_time.as_deref())
        .string("updated_time", meta.updated_time.as_deref())
        .strings("authorized_actions", &meta.authorized_actions);
}

fn read_meta(state: &StateReader<'_>) -> Result<ItemMeta, ApiError> {
    Ok(ItemMeta {
        id: state.required_string("id")?,
        version: state
            .number("version")?
            .ok_or_else(|| ApiError::Validation("state has no version".to_string()))?,
        created_time: state.string("created_time")?,
        updated_time: state.string("updated_time")?,
        authorized_actions: state.strings("authorized_actions")?,
        ..Default::default()
    })
}

/// Turn an API failure into diagnostics for `action` on `type_name`
pub(crate) fn error_diagnostics(action: &str, type_name: &str, err: &ApiError) -> Vec<Diagnostic> {
    match err {
        ApiError::Conflict(message) => vec![Diagnostic::error(
            format!("Version conflict while trying to {} {}", action, type_name),
            format!(
                "The object was modified outside of Terraform. Refresh state and retry: {}",
                message
            ),
        )],
        ApiError::AuthError(message) | ApiError::Forbidden(message) => vec![Diagnostic::error(
            format!("Not authorized to {} {}", action, type_name),
            message.clone(),
        )],
        ApiError::Cancelled => vec![Diagnostic::error(
            format!("Failed to {} {}", action, type_name),
            "The operation was cancelled",
        )],
        err if !err.field_errors().is_empty() => err
            .field_errors()
            .iter()
            .map(|field| {
                let attribute = field
                    .name
                    .strip_prefix("attributes.")
                    .unwrap_or(&field.name);
                Diagnostic::error(
                    format!("Invalid value for {}", attribute),
                    field.description.clone(),
                )
                .with_attribute(AttributePath::new(attribute))
            })
            .collect(),
        err => vec![Diagnostic::error(
            format!("Failed to {} {}", action, type_name),
            format!("API error: {}", err),
        )],
    }
}

/// Extract provider data handed over by the provider's configure
pub(crate) fn provider_data_from(
    provider_data: Option<std::sync::Arc<dyn std::any::Any + Send + Sync>>,
    kind: &str,
) -> (Option<BoundaryProviderData>, Vec<Diagnostic>) {
    match provider_data {
        Some(data) => match data.downcast_ref::<BoundaryProviderData>() {
            Some(provider_data) => (Some(provider_data.clone()), vec![]),
            None => (
                None,
                vec![Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract BoundaryProviderData from provider data",
                )],
            ),
        },
        None => (
            None,
            vec![Diagnostic::error(
                "No provider data",
                format!("No provider data was provided to the {}", kind),
            )],
        ),
    }
}

/// Adapts a [`BoundaryResource`] to the tfplug resource traits
pub struct ManagedResource<R: BoundaryResource> {
    handler: R,
    provider_data: Option<BoundaryProviderData>,
}

impl<R: BoundaryResource> ManagedResource<R> {
    pub fn new() -> Self {
        Self {
            handler: R::default(),
            provider_data: None,
        }
    }

    pub fn factory() -> ResourceFactory {
        Box::new(|| Box::new(Self::new()))
    }

    pub fn schema() -> Schema {
        let handler = R::default();
        SchemaBuilder::new()
            .description(R::DESCRIPTION)
            .attributes(computed_attributes())
            .attributes(handler.attributes())
            .attributes(R::SECRETS.iter().map(digest_attribute))
            .build()
    }

    async fn client(&self) -> Result<Client, ApiError> {
        match &self.provider_data {
            Some(data) => data.client().await,
            None => Err(ApiError::Validation(
                "the provider has not been configured".to_string(),
            )),
        }
    }

    /// State after a write: secrets null, digests from the secrets just sent
    fn render(tracked: &Tracked<R::Model>, digest: impl Fn(&Secret) -> Option<String>) -> DynamicValue {
        let mut state = StateWriter::new();
        write_meta(&mut state, &tracked.meta);
        tracked.model.write_state(&mut state);
        for secret in R::SECRETS {
            state
                .null(secret.attribute)
                .string(&secret.digest_attribute(), digest(secret).as_deref());
        }
        state.finish()
    }

    async fn do_create(&self, request: &CreateResourceRequest) -> Result<DynamicValue, ApiError> {
        let client = self.client().await?;
        let plan = R::Model::from_state(&StateReader::new(&request.planned_state))?;
        let secrets = Secrets::collect(R::SECRETS, &request.config, &DynamicValue::null())?;

        let created = self.handler.create(&client, &plan, &secrets).await?;
        info!(resource = R::TYPE_NAME, id = %created.meta.id, "created resource");
        Ok(Self::render(&created, |s| {
            secrets.digest(s.attribute).map(str::to_string)
        }))
    }

    async fn do_read(&self, current: &DynamicValue) -> Result<Option<DynamicValue>, ApiError> {
        let id = StateReader::new(current).required_string("id")?;
        let client = self.client().await?;

        match self.handler.read(&client, &id).await {
            Ok(tracked) => {
                let mut state = Self::render(&tracked, |s| {
                    current
                        .get_optional_string(&AttributePath::new(&s.digest_attribute()))
                        .ok()
                        .flatten()
                });
                for name in R::PRESERVED {
                    let path = AttributePath::new(name);
                    if matches!(state.get(&path), None | Some(Dynamic::Null)) {
                        let value = current.get(&path).cloned().unwrap_or(Dynamic::Null);
                        state.set(&path, value)?;
                    }
                }
                Ok(Some(state))
            }
            Err(e) if e.is_not_found() => {
                info!(resource = R::TYPE_NAME, %id, "resource no longer exists");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn do_update(&self, request: &UpdateResourceRequest) -> Result<DynamicValue, ApiError> {
        let client = self.client().await?;
        let prior_state = StateReader::new(&request.prior_state);
        let prior = Tracked {
            meta: read_meta(&prior_state)?,
            model: R::Model::from_state(&prior_state)?,
        };
        let plan = R::Model::from_state(&StateReader::new(&request.planned_state))?;
        let secrets = Secrets::collect(R::SECRETS, &request.config, &request.prior_state)?;

        let updated = self.handler.update(&client, &prior, &plan, &secrets).await?;
        info!(
            resource = R::TYPE_NAME,
            id = %updated.meta.id,
            version = updated.meta.version,
            "updated resource"
        );
        Ok(Self::render(&updated, |s| {
            secrets.digest(s.attribute).map(str::to_string)
        }))
    }

    async fn do_delete(&self, prior: &DynamicValue) -> Result<(), ApiError> {
        let id = StateReader::new(prior).required_string("id")?;
        let client = self.client().await?;

        match self.handler.delete(&client, &id).await {
            Err(e) if e.is_not_found() => {
                debug!(resource = R::TYPE_NAME, %id, "resource already deleted");
                Ok(())
            }
            result => result,
        }
    }
}

impl<R: BoundaryResource> Default for ManagedResource<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Collections are stored as null when empty, so an empty configured
/// collection plans the same way as an omitted one
fn normalize_empty_collections(
    schema: &Schema,
    planned: &mut DynamicValue,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for attr in &schema.attributes {
        let path = AttributePath::new(&attr.name);
        let empty = match planned.get(&path) {
            Some(Dynamic::List(items)) => items.is_empty(),
            Some(Dynamic::Map(entries)) => {
                entries.is_empty() && matches!(attr.r#type, AttributeType::Map(_))
            }
            _ => false,
        };
        if empty {
            set_planned(planned, &path, Dynamic::Null, diagnostics);
        }
    }
}

#[async_trait]
impl<R: BoundaryResource> Resource for ManagedResource<R> {
    fn type_name(&self) -> &str {
        R::TYPE_NAME
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: self.handler.validate(&request.config),
        }
    }

    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        let mut planned = request.proposed_new_state;
        let mut diagnostics = vec![];

        if !planned.is_null() {
            normalize_empty_collections(&Self::schema(), &mut planned, &mut diagnostics);

            for secret in R::SECRETS {
                let path = AttributePath::new(&secret.digest_attribute());
                let digest = match request.config.get(&AttributePath::new(secret.attribute)) {
                    Some(Dynamic::String(value)) => Dynamic::String(secret_digest(value)),
                    Some(Dynamic::Unknown) => Dynamic::Unknown,
                    _ => Dynamic::Null,
                };
                if let Err(e) = planned.set(&path, digest) {
                    diagnostics.push(Diagnostic::error("Failed to plan secret digest", e.to_string()));
                }
            }
        }

        ModifyPlanResponse {
            planned_state: planned,
            requires_replace: vec![],
            diagnostics,
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        match cancellable(&ctx, self.do_create(&request)).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => CreateResourceResponse {
                new_state: DynamicValue::null(),
                diagnostics: error_diagnostics("create", R::TYPE_NAME, &e),
            },
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        match cancellable(&ctx, self.do_read(&request.current_state)).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: error_diagnostics("read", R::TYPE_NAME, &e),
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match cancellable(&ctx, self.do_update(&request)).await {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: error_diagnostics("update", R::TYPE_NAME, &e),
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        match cancellable(&ctx, self.do_delete(&request.prior_state)).await {
            Ok(()) => DeleteResourceResponse {
                diagnostics: vec![],
            },
            Err(e) => DeleteResourceResponse {
                diagnostics: error_diagnostics("delete", R::TYPE_NAME, &e),
            },
        }
    }
}

#[async_trait]
impl<R: BoundaryResource> ResourceWithConfigure for ManagedResource<R> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let (provider_data, diagnostics) = provider_data_from(request.provider_data, "resource");
        self.provider_data = provider_data;
        ConfigureResourceResponse { diagnostics }
    }
}

/// Factories for every resource type, keyed by type name
pub fn factories() -> HashMap<String, ResourceFactory> {
    fn entry<R: BoundaryResource>() -> (String, ResourceFactory) {
        (R::TYPE_NAME.to_string(), ManagedResource::<R>::factory())
    }

    HashMap::from([
        entry::<scope::ScopeResource>(),
        entry::<auth_method_password::AuthMethodPasswordResource>(),
        entry::<auth_method_oidc::AuthMethodOidcResource>(),
        entry::<auth_method_ldap::AuthMethodLdapResource>(),
        entry::<account_password::AccountPasswordResource>(),
        entry::<account_oidc::AccountOidcResource>(),
        entry::<account_ldap::AccountLdapResource>(),
        entry::<user::UserResource>(),
        entry::<group::GroupResource>(),
        entry::<role::RoleResource>(),
        entry::<managed_group::ManagedGroupResource>(),
        entry::<managed_group_ldap::ManagedGroupLdapResource>(),
        entry::<host_catalog_static::HostCatalogStaticResource>(),
        entry::<host_static::HostStaticResource>(),
        entry::<host_set_static::HostSetStaticResource>(),
        entry::<credential_store_vault::CredentialStoreVaultResource>(),
        entry::<credential_store_static::CredentialStoreStaticResource>(),
        entry::<credential_library_vault::CredentialLibraryVaultResource>(),
        entry::<credential_library_vault_ssh_certificate::CredentialLibraryVaultSshCertificateResource>(),
        entry::<credential_username_password::CredentialUsernamePasswordResource>(),
        entry::<credential_ssh_private_key::CredentialSshPrivateKeyResource>(),
        entry::<credential_json::CredentialJsonResource>(),
        entry::<target::TargetResource>(),
        entry::<worker::WorkerResource>(),
        entry::<storage_bucket::StorageBucketResource>(),
    ])
}
