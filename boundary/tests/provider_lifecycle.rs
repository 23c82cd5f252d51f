//! Full plan/apply/refresh/import/destroy cycles against a mocked controller

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use boundary::api::{ApiQueryParams, Client};
use boundary::digest::secret_digest;
use boundary::BoundaryProvider;
use tfplug::context::Context;
use tfplug::types::{AttributePath, Dynamic, DynamicValue};
use tfplug::{PlanAction, ProviderHost};

const GROUP: &str = r#"{"id":"g_1234567890","scope_id":"o_1234567890","name":"ops","version":2,"created_time":"2024-01-01T00:00:00Z","authorized_actions":["read","update","delete"],"member_ids":["u_1111111111","u_2222222222"]}"#;

async fn host(server: &ServerGuard) -> ProviderHost<BoundaryProvider> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut host = ProviderHost::new(BoundaryProvider::new());
    let config = DynamicValue::from_pairs([
        ("addr", Dynamic::from(server.url())),
        ("token", Dynamic::from("at_1234567890_token")),
    ]);
    assert_ok!(host.configure(Context::new(), config).await);
    host
}

fn group_config(name: &str) -> DynamicValue {
    DynamicValue::from_pairs([
        ("scope_id", Dynamic::from("o_1234567890")),
        ("name", Dynamic::from(name)),
        (
            "member_ids",
            Dynamic::List(vec![
                Dynamic::from("u_2222222222"),
                Dynamic::from("u_1111111111"),
            ]),
        ),
    ])
}

fn string(state: &DynamicValue, name: &str) -> Option<String> {
    state.get_optional_string(&AttributePath::new(name)).unwrap()
}

#[tokio::test]
async fn create_refresh_and_replan_is_a_no_op() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/v1/groups")
        .match_header("authorization", "Bearer at_1234567890_token")
        .match_body(Matcher::Json(json!({"scope_id": "o_1234567890", "name": "ops"})))
        .with_body(r#"{"id":"g_1234567890","scope_id":"o_1234567890","name":"ops","version":1}"#)
        .create_async()
        .await;
    let members = server
        .mock("POST", "/v1/groups/g_1234567890:set-members")
        .match_body(Matcher::Json(json!({
            "version": 1,
            "member_ids": ["u_1111111111", "u_2222222222"]
        })))
        .with_body(GROUP)
        .create_async()
        .await;
    server
        .mock("GET", "/v1/groups/g_1234567890")
        .with_body(GROUP)
        .create_async()
        .await;

    let host = host(&server).await;
    let plan = host
        .plan(Context::new(), "boundary_group", None, group_config("ops"))
        .await
        .unwrap();
    assert_eq!(plan.action, PlanAction::Create);

    let applied = host.apply(Context::new(), &plan, None).await.unwrap().unwrap();
    create.assert_async().await;
    members.assert_async().await;
    assert_eq!(applied.id().as_deref(), Some("g_1234567890"));

    let refreshed = host.refresh(Context::new(), &applied).await.unwrap().unwrap();
    assert_eq!(refreshed.value().unwrap(), applied.value().unwrap());

    let replan = host
        .plan(Context::new(), "boundary_group", Some(&refreshed), group_config("ops"))
        .await
        .unwrap();
    assert_eq!(replan.action, PlanAction::NoOp);
}

#[tokio::test]
async fn import_then_refresh_drops_deleted_objects() {
    let mut server = Server::new_async().await;
    let read = server
        .mock("GET", "/v1/groups/g_1234567890")
        .with_body(GROUP)
        .create_async()
        .await;

    let host = host(&server).await;
    let imported = host
        .import(Context::new(), "boundary_group", "g_1234567890")
        .await
        .unwrap();
    let state = imported.value().unwrap();
    assert_eq!(string(&state, "name").as_deref(), Some("ops"));
    assert_eq!(string(&state, "scope_id").as_deref(), Some("o_1234567890"));

    // The imported state plans cleanly against matching configuration
    let plan = host
        .plan(Context::new(), "boundary_group", Some(&imported), group_config("ops"))
        .await
        .unwrap();
    assert_eq!(plan.action, PlanAction::NoOp);

    read.remove_async().await;
    server
        .mock("GET", "/v1/groups/g_1234567890")
        .with_status(404)
        .with_body(r#"{"status":404,"kind":"NotFound","message":"Resource not found."}"#)
        .create_async()
        .await;
    assert_eq!(host.refresh(Context::new(), &imported).await.unwrap(), None);
}

#[tokio::test]
async fn destroying_a_missing_object_succeeds() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/groups/g_1234567890")
        .with_body(GROUP)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/v1/groups/g_1234567890")
        .with_status(404)
        .with_body(r#"{"status":404,"kind":"NotFound","message":"Resource not found."}"#)
        .create_async()
        .await;

    let host = host(&server).await;
    let imported = host
        .import(Context::new(), "boundary_group", "g_1234567890")
        .await
        .unwrap();
    assert_ok!(host.destroy(Context::new(), &imported).await);
    delete.assert_async().await;
}

#[tokio::test]
async fn version_conflict_asks_for_a_refresh() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/groups/g_1234567890")
        .with_body(GROUP)
        .create_async()
        .await;
    server
        .mock("PATCH", "/v1/groups/g_1234567890")
        .match_body(Matcher::Json(json!({"version": 2, "name": "platform"})))
        .with_status(409)
        .with_body(r#"{"status":409,"kind":"FailedPrecondition","message":"version mismatch"}"#)
        .create_async()
        .await;

    let host = host(&server).await;
    let imported = host
        .import(Context::new(), "boundary_group", "g_1234567890")
        .await
        .unwrap();
    let plan = host
        .plan(Context::new(), "boundary_group", Some(&imported), group_config("platform"))
        .await
        .unwrap();
    assert_eq!(plan.action, PlanAction::Update);

    let err = host
        .apply(Context::new(), &plan, Some(&imported))
        .await
        .unwrap_err();
    assert!(err.diagnostics[0].summary.contains("Version conflict"));
    assert!(err.diagnostics[0].detail.contains("version mismatch"));
}

#[tokio::test]
async fn update_of_a_deleted_object_fails() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/groups/g_1234567890")
        .with_body(GROUP)
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/v1/groups/g_1234567890")
        .with_status(404)
        .with_body(r#"{"status":404,"kind":"NotFound","message":"gone"}"#)
        .expect(1)
        .create_async()
        .await;

    let host = host(&server).await;
    let imported = host
        .import(Context::new(), "boundary_group", "g_1234567890")
        .await
        .unwrap();
    let plan = host
        .plan(Context::new(), "boundary_group", Some(&imported), group_config("platform"))
        .await
        .unwrap();
    assert_eq!(plan.action, PlanAction::Update);

    let err = assert_err!(host.apply(Context::new(), &plan, Some(&imported)).await);
    patch.assert_async().await;
    assert!(err.diagnostics[0].summary.contains("Failed to update boundary_group"));
    assert!(err.diagnostics[0].detail.contains("gone"));
}

#[tokio::test]
async fn field_errors_point_at_the_attribute() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/groups")
        .with_status(400)
        .with_body(
            r#"{"status":400,"kind":"InvalidArgument","message":"Error in provided request.","details":{"request_fields":[{"name":"name","description":"Name must be unique in the scope."}]}}"#,
        )
        .create_async()
        .await;

    let host = host(&server).await;
    let plan = host
        .plan(Context::new(), "boundary_group", None, group_config("ops"))
        .await
        .unwrap();
    let err = host.apply(Context::new(), &plan, None).await.unwrap_err();
    assert!(err.has_attribute_error(&AttributePath::new("name")));
}

#[tokio::test]
async fn secret_digests_drive_the_plan() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/v1/credentials")
        .match_body(Matcher::PartialJson(json!({
            "attributes": {"username": "postgres", "password": "hunter22"}
        })))
        .with_body(
            r#"{"id":"credup_1234567890","credential_store_id":"csst_1234567890","type":"username_password","version":1,"attributes":{"username":"postgres","password_hmac":"x1"}}"#,
        )
        .create_async()
        .await;

    let config = |password: &str| {
        DynamicValue::from_pairs([
            ("credential_store_id", Dynamic::from("csst_1234567890")),
            ("username", Dynamic::from("postgres")),
            ("password", Dynamic::from(password)),
        ])
    };

    let host = host(&server).await;
    let plan = host
        .plan(
            Context::new(),
            "boundary_credential_username_password",
            None,
            config("hunter22"),
        )
        .await
        .unwrap();
    let applied = host.apply(Context::new(), &plan, None).await.unwrap().unwrap();
    create.assert_async().await;

    let state = applied.value().unwrap();
    assert_eq!(state.get(&AttributePath::new("password")), Some(&Dynamic::Null));
    assert_eq!(
        string(&state, "password_digest"),
        Some(secret_digest("hunter22"))
    );

    let unchanged = host
        .plan(
            Context::new(),
            "boundary_credential_username_password",
            Some(&applied),
            config("hunter22"),
        )
        .await
        .unwrap();
    assert_eq!(unchanged.action, PlanAction::NoOp);

    let rotated = host
        .plan(
            Context::new(),
            "boundary_credential_username_password",
            Some(&applied),
            config("hunter23"),
        )
        .await
        .unwrap();
    assert_eq!(rotated.action, PlanAction::Update);
    assert_eq!(
        string(&rotated.planned_state, "password_digest"),
        Some(secret_digest("hunter23"))
    );
}

#[tokio::test]
async fn invalid_target_config_fails_before_any_request() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let host = host(&server).await;
    let config = DynamicValue::from_pairs([
        ("scope_id", Dynamic::from("p_1234567890")),
        ("name", Dynamic::from("db")),
        ("type", Dynamic::from("tcp")),
        ("address", Dynamic::from("10.0.0.5")),
        (
            "host_source_ids",
            Dynamic::List(vec![Dynamic::from("hsst_1234567890")]),
        ),
    ]);
    let err = host
        .plan(Context::new(), "boundary_target", None, config)
        .await
        .unwrap_err();
    assert!(err.has_attribute_error(&AttributePath::new("address")));
    any.assert_async().await;
}

#[tokio::test]
async fn cancelled_apply_sends_nothing() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/v1/groups")
        .expect(0)
        .create_async()
        .await;

    let host = host(&server).await;
    let plan = host
        .plan(Context::new(), "boundary_group", None, group_config("ops"))
        .await
        .unwrap();

    let ctx = Context::new();
    ctx.cancel();
    let err = host.apply(ctx, &plan, None).await.unwrap_err();
    assert!(err.diagnostics[0].detail.contains("cancelled"));
    create.assert_async().await;
}

#[tokio::test]
async fn data_sources_look_up_by_id_or_name() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/scopes/global")
        .with_body(r#"{"id":"global","name":"Global","type":"global","version":1}"#)
        .create_async()
        .await;

    let host = host(&server).await;
    let state = host
        .read_data_source(
            Context::new(),
            "boundary_scope",
            DynamicValue::from_pairs([("id", Dynamic::from("global"))]),
        )
        .await
        .unwrap();
    assert_eq!(string(&state, "type").as_deref(), Some("global"));
    assert_eq!(string(&state, "scope_id"), None);

    let err = assert_err!(
        host.read_data_source(Context::new(), "boundary_group", DynamicValue::object())
            .await
    );
    assert!(err.has_attribute_error(&AttributePath::new("id")));
}

#[tokio::test]
async fn scoped_clients_do_not_share_scope() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/v1/groups")
        .match_query(Matcher::UrlEncoded("scope_id".into(), "o_1111111111".into()))
        .with_body(r#"{"items":[{"id":"g_1111111111","scope_id":"o_1111111111","version":1}]}"#)
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/v1/groups")
        .match_query(Matcher::UrlEncoded("scope_id".into(), "o_2222222222".into()))
        .with_body(r#"{"items":[{"id":"g_2222222222","scope_id":"o_2222222222","version":1}]}"#)
        .expect(1)
        .create_async()
        .await;

    let base = Client::new(&server.url(), false).unwrap().with_token("at_token");
    let a = base.with_scope("o_1111111111");
    let b = base.with_scope("o_2222222222");
    let (groups_a, groups_b) = (a.groups(), b.groups());
    let (left, right) = tokio::join!(
        groups_a.list(ApiQueryParams::new()),
        groups_b.list(ApiQueryParams::new())
    );

    assert_eq!(left.unwrap()[0].meta.id, "g_1111111111");
    assert_eq!(right.unwrap()[0].meta.id, "g_2222222222");
    assert_eq!(base.scope_id(), None);
    first.assert_async().await;
    second.assert_async().await;
}
