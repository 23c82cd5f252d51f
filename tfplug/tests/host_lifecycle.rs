//! Lifecycle tests driving an in-memory provider through ProviderHost

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
    ValidateProviderConfigRequest, ValidateProviderConfigResponse,
};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::{PlanAction, ProviderHost};

#[derive(Clone, Debug, PartialEq)]
struct Note {
    id: String,
    folder: String,
    title: String,
    tags: Vec<String>,
    revision: u64,
}

#[derive(Default)]
struct Store {
    notes: RwLock<HashMap<String, Note>>,
    next_id: AtomicU64,
}

struct NotesProvider {
    store: Arc<Store>,
}

#[async_trait]
impl Provider for NotesProvider {
    fn type_name(&self) -> &str {
        "notes"
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("token", AttributeType::String)
                        .optional()
                        .sensitive()
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(self.store.clone() as Arc<dyn std::any::Any + Send + Sync>),
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse {
            diagnostics: vec![],
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            "notes_note".to_string(),
            Box::new(|| Box::new(NoteResource { store: None }) as Box<dyn ResourceWithConfigure>),
        );
        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories: HashMap<String, DataSourceFactory> = HashMap::new();
        factories.insert(
            "notes_note".to_string(),
            Box::new(|| {
                Box::new(NoteDataSource { store: None }) as Box<dyn DataSourceWithConfigure>
            }),
        );
        factories
    }
}

fn note_state(note: &Note) -> DynamicValue {
    DynamicValue::from_pairs([
        ("id", Dynamic::from(note.id.clone())),
        ("folder", Dynamic::from(note.folder.clone())),
        ("title", Dynamic::from(note.title.clone())),
        ("tags", Dynamic::from(note.tags.clone())),
        ("revision", Dynamic::Number(note.revision as f64)),
    ])
}

struct NoteResource {
    store: Option<Arc<Store>>,
}

impl NoteResource {
    fn store(&self) -> &Store {
        self.store.as_ref().unwrap()
    }
}

#[async_trait]
impl Resource for NoteResource {
    fn type_name(&self) -> &str {
        "notes_note"
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("id", AttributeType::String)
                        .computed()
                        .plan_modifier(UseStateForUnknown::create())
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("folder", AttributeType::String)
                        .required()
                        .plan_modifier(RequiresReplace::create())
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("title", AttributeType::String)
                        .required()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("tags", AttributeType::Set(Box::new(AttributeType::String)))
                        .optional()
                        .computed()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("revision", AttributeType::Number)
                        .computed()
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];
        if let Ok(Some(title)) = request
            .config
            .get_optional_string(&AttributePath::new("title"))
        {
            if title.trim().is_empty() {
                diagnostics.push(
                    Diagnostic::error("Invalid title", "title must not be blank")
                        .with_attribute(AttributePath::new("title")),
                );
            }
        }
        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let plan = &request.planned_state;
        let id = format!("n_{}", self.store().next_id.fetch_add(1, Ordering::SeqCst));
        let note = Note {
            id: id.clone(),
            folder: plan.get_string(&AttributePath::new("folder")).unwrap(),
            title: plan.get_string(&AttributePath::new("title")).unwrap(),
            tags: plan
                .get_optional_strings(&AttributePath::new("tags"))
                .unwrap()
                .unwrap_or_default(),
            revision: 1,
        };
        self.store().notes.write().await.insert(id, note.clone());

        CreateResourceResponse {
            new_state: note_state(&note),
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let id = request
            .current_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        let notes = self.store().notes.read().await;

        ReadResourceResponse {
            new_state: notes.get(&id).map(note_state),
            diagnostics: vec![],
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let id = request.prior_state.get_string(&AttributePath::new("id")).unwrap();
        let mut notes = self.store().notes.write().await;
        let note = notes.get_mut(&id).unwrap();
        note.title = request
            .planned_state
            .get_string(&AttributePath::new("title"))
            .unwrap();
        if let Some(tags) = request
            .planned_state
            .get_optional_strings(&AttributePath::new("tags"))
            .unwrap()
        {
            note.tags = tags;
        }
        note.revision += 1;

        UpdateResourceResponse {
            new_state: note_state(note),
            diagnostics: vec![],
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let id = request.prior_state.get_string(&AttributePath::new("id")).unwrap();
        self.store().notes.write().await.remove(&id);
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for NoteResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];
        match request.provider_data.and_then(|d| d.downcast::<Store>().ok()) {
            Some(store) => self.store = Some(store),
            None => diagnostics.push(Diagnostic::error(
                "Provider not configured",
                "The provider hasn't been configured before apply",
            )),
        }
        ConfigureResourceResponse { diagnostics }
    }
}

struct NoteDataSource {
    store: Option<Arc<Store>>,
}

#[async_trait]
impl DataSource for NoteDataSource {
    fn type_name(&self) -> &str {
        "notes_note"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("id", AttributeType::String)
                        .required()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("title", AttributeType::String)
                        .computed()
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let id = request.config.get_string(&AttributePath::new("id")).unwrap();
        let notes = self.store.as_ref().unwrap().notes.read().await;
        match notes.get(&id) {
            Some(note) => ReadDataSourceResponse {
                state: DynamicValue::from_pairs([
                    ("id", Dynamic::from(note.id.clone())),
                    ("title", Dynamic::from(note.title.clone())),
                ]),
                diagnostics: vec![],
            },
            None => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![Diagnostic::error("Note not found", id)],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for NoteDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        self.store = request.provider_data.and_then(|d| d.downcast::<Store>().ok());
        ConfigureDataSourceResponse {
            diagnostics: vec![],
        }
    }
}

async fn configured_host() -> (ProviderHost<NotesProvider>, Arc<Store>) {
    let store = Arc::new(Store::default());
    let mut host = ProviderHost::new(NotesProvider {
        store: store.clone(),
    });
    host.configure(Context::new(), DynamicValue::object())
        .await
        .unwrap();
    (host, store)
}

fn note_config(folder: &str, title: &str, tags: Vec<&str>) -> DynamicValue {
    DynamicValue::from_pairs([
        ("folder", Dynamic::from(folder)),
        ("title", Dynamic::from(title)),
        ("tags", Dynamic::from(tags)),
    ])
}

#[tokio::test]
async fn create_then_refresh_matches_and_replans_as_no_op() {
    let (host, _) = configured_host().await;
    let config = note_config("inbox", "groceries", vec!["home", "errands"]);

    let plan = host
        .plan(Context::new(), "notes_note", None, config.clone())
        .await
        .unwrap();
    assert_eq!(plan.action, PlanAction::Create);

    let state = host
        .apply(Context::new(), &plan, None)
        .await
        .unwrap()
        .unwrap();
    let refreshed = host
        .refresh(Context::new(), &state)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.value().unwrap(), state.value().unwrap());

    let replan = host
        .plan(Context::new(), "notes_note", Some(&refreshed), config)
        .await
        .unwrap();
    assert_eq!(replan.action, PlanAction::NoOp);
}

#[tokio::test]
async fn update_in_place_keeps_id() {
    let (host, _) = configured_host().await;
    let plan = host
        .plan(
            Context::new(),
            "notes_note",
            None,
            note_config("inbox", "groceries", vec![]),
        )
        .await
        .unwrap();
    let state = host.apply(Context::new(), &plan, None).await.unwrap().unwrap();

    let plan = host
        .plan(
            Context::new(),
            "notes_note",
            Some(&state),
            note_config("inbox", "shopping", vec![]),
        )
        .await
        .unwrap();
    assert_eq!(plan.action, PlanAction::Update);

    let updated = host
        .apply(Context::new(), &plan, Some(&state))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.id(), state.id());
    assert_eq!(
        updated
            .value()
            .unwrap()
            .get_number(&AttributePath::new("revision"))
            .unwrap(),
        2.0
    );
}

#[tokio::test]
async fn changing_folder_replaces_note() {
    let (host, store) = configured_host().await;
    let plan = host
        .plan(
            Context::new(),
            "notes_note",
            None,
            note_config("inbox", "groceries", vec![]),
        )
        .await
        .unwrap();
    let state = host.apply(Context::new(), &plan, None).await.unwrap().unwrap();

    let plan = host
        .plan(
            Context::new(),
            "notes_note",
            Some(&state),
            note_config("archive", "groceries", vec![]),
        )
        .await
        .unwrap();
    assert_eq!(plan.action, PlanAction::Replace);
    assert_eq!(plan.requires_replace, vec![AttributePath::new("folder")]);

    let replaced = host
        .apply(Context::new(), &plan, Some(&state))
        .await
        .unwrap()
        .unwrap();
    assert_ne!(replaced.id(), state.id());
    assert_eq!(store.notes.read().await.len(), 1);
}

#[tokio::test]
async fn destroyed_note_drops_from_state_on_refresh() {
    let (host, _) = configured_host().await;
    let plan = host
        .plan(
            Context::new(),
            "notes_note",
            None,
            note_config("inbox", "groceries", vec![]),
        )
        .await
        .unwrap();
    let state = host.apply(Context::new(), &plan, None).await.unwrap().unwrap();

    tokio_test::assert_ok!(host.destroy(Context::new(), &state).await);

    assert!(host.refresh(Context::new(), &state).await.unwrap().is_none());
}

#[tokio::test]
async fn import_reads_full_state() {
    let (host, _) = configured_host().await;
    let plan = host
        .plan(
            Context::new(),
            "notes_note",
            None,
            note_config("inbox", "groceries", vec!["home"]),
        )
        .await
        .unwrap();
    let state = host.apply(Context::new(), &plan, None).await.unwrap().unwrap();

    let imported = host
        .import(Context::new(), "notes_note", &state.id().unwrap())
        .await
        .unwrap();
    assert_eq!(imported.value().unwrap(), state.value().unwrap());

    let missing = host.import(Context::new(), "notes_note", "n_404").await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn validation_errors_carry_attribute_paths() {
    let (host, _) = configured_host().await;

    let err = host
        .plan(
            Context::new(),
            "notes_note",
            None,
            note_config("inbox", "  ", vec![]),
        )
        .await
        .unwrap_err();
    assert!(err.has_attribute_error(&AttributePath::new("title")));

    let err = host
        .plan(
            Context::new(),
            "notes_note",
            None,
            DynamicValue::from_pairs([("title", Dynamic::from("x"))]),
        )
        .await
        .unwrap_err();
    assert!(err.has_attribute_error(&AttributePath::new("folder")));
}

#[tokio::test]
async fn unknown_types_are_rejected() {
    let (host, _) = configured_host().await;
    let err = host
        .plan(Context::new(), "notes_folder", None, DynamicValue::object())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("notes_folder"));
}

#[tokio::test]
async fn unconfigured_provider_fails_resource_configure() {
    let host = ProviderHost::new(NotesProvider {
        store: Arc::new(Store::default()),
    });
    let err = host
        .plan(
            Context::new(),
            "notes_note",
            None,
            note_config("inbox", "groceries", vec![]),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Provider not configured"));
}

#[tokio::test]
async fn data_source_reads_existing_note() {
    let (host, _) = configured_host().await;
    let plan = host
        .plan(
            Context::new(),
            "notes_note",
            None,
            note_config("inbox", "groceries", vec![]),
        )
        .await
        .unwrap();
    let state = host.apply(Context::new(), &plan, None).await.unwrap().unwrap();

    let data = host
        .read_data_source(
            Context::new(),
            "notes_note",
            DynamicValue::from_pairs([("id", Dynamic::from(state.id().unwrap()))]),
        )
        .await
        .unwrap();
    assert_eq!(
        data.get_string(&AttributePath::new("title")).unwrap(),
        "groceries"
    );
}

#[tokio::test]
async fn concurrent_applies_share_one_host() {
    let (host, store) = configured_host().await;
    let host = Arc::new(host);

    let mut handles = vec![];
    for i in 0..8 {
        let host = host.clone();
        handles.push(tokio::spawn(async move {
            let plan = host
                .plan(
                    Context::new(),
                    "notes_note",
                    None,
                    note_config("inbox", &format!("note {}", i), vec![]),
                )
                .await
                .unwrap();
            host.apply(Context::new(), &plan, None).await.unwrap().unwrap()
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(store.notes.read().await.len(), 8);
}
