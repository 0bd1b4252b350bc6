use async_trait::async_trait;
use axum::http::StatusCode;
use jsonapi_sdk::error::NotifyError;
use jsonapi_sdk::notify::NotificationContext;
use jsonapi_sdk::*;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

fn setup() -> (AppState, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let state = AppState::new(
        default_catalogue().expect("built-in catalogue resolves"),
        Arc::new(MemoryStore::new()),
        notifier.clone(),
        Settings::default(),
    );
    (state, notifier)
}

fn to_json(document: Document) -> Value {
    serde_json::to_value(document).expect("documents serialize")
}

async fn create_user(state: &AppState, name: &str) -> String {
    let payload = json!({"data": {"type": "users", "attributes": {
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "password": "secret-pass",
        "password_confirmation": "secret-pass"
    }}});
    let doc = to_json(JsonApiService::create(state, "users", &payload).await.expect("user created"));
    doc["data"]["id"].as_str().expect("id is a string").to_string()
}

async fn create_project(state: &AppState, name: &str) -> String {
    let payload = json!({"data": {"type": "projects", "attributes": {"name": name}}});
    let doc = to_json(JsonApiService::create(state, "projects", &payload).await.expect("project created"));
    doc["data"]["id"].as_str().expect("id is a string").to_string()
}

async fn create_task(state: &AppState, title: &str, project_id: &str) -> String {
    let payload = json!({"data": {"type": "tasks", "attributes": {
        "title": title,
        "project_id": project_id.parse::<i64>().expect("numeric id"),
        "deadline": "2025-01-31 17:00:00"
    }}});
    let doc = to_json(JsonApiService::create(state, "tasks", &payload).await.expect("task created"));
    doc["data"]["id"].as_str().expect("id is a string").to_string()
}

fn users<S: AsRef<str>>(ids: &[S]) -> Value {
    Value::Array(ids.iter().map(|id| json!({"type": "users", "id": id.as_ref()})).collect())
}

fn identifiers<S: AsRef<str>>(ids: &[S]) -> BTreeSet<ResourceIdentifier> {
    ids.iter().map(|id| ResourceIdentifier::new("users", id.as_ref())).collect()
}

fn pointers(err: &AppError) -> Vec<String> {
    let (_, doc) = ErrorFormatter::format(err);
    to_json(doc)["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .map(|e| e["source"]["pointer"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

mod included_resources {
    use super::*;

    #[tokio::test]
    async fn shared_assignee_is_included_once() {
        let (state, _) = setup();
        let ada = create_user(&state, "Ada").await;
        let bob = create_user(&state, "Bob").await;
        let project = create_project(&state, "Apollo").await;
        let first = create_task(&state, "Design", &project).await;
        let second = create_task(&state, "Build", &project).await;
        JsonApiService::replace_relationship(&state, "tasks", &first, "assignees", &json!({"data": users(&[&ada])}), None)
            .await
            .unwrap();
        JsonApiService::replace_relationship(&state, "tasks", &second, "assignees", &json!({"data": users(&[&ada, &bob])}), None)
            .await
            .unwrap();

        let doc = to_json(
            JsonApiService::list(&state, "tasks", &ListParams::default().include("assignees,project"))
                .await
                .unwrap(),
        );
        let included: Vec<String> = doc["included"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| format!("{}:{}", o["type"].as_str().unwrap(), o["id"].as_str().unwrap()))
            .collect();
        assert_eq!(included, vec!["users:1", "projects:1", "users:2"]);
    }

    #[tokio::test]
    async fn list_without_include_has_no_included_key() {
        let (state, _) = setup();
        let project = create_project(&state, "Apollo").await;
        create_task(&state, "Design", &project).await;
        let doc = to_json(JsonApiService::list(&state, "tasks", &ListParams::default()).await.unwrap());
        assert!(doc.get("included").is_none());
        assert_eq!(doc["meta"]["total"], json!(1));
    }

    #[tokio::test]
    async fn requested_but_empty_include_is_an_empty_list() {
        let (state, _) = setup();
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        let doc = to_json(JsonApiService::show(&state, "tasks", &task, Some("assignees")).await.unwrap());
        assert_eq!(doc["included"], json!([]));
    }

    #[tokio::test]
    async fn disallowed_include_is_rejected() {
        let (state, _) = setup();
        let err = JsonApiService::list(&state, "groups", &ListParams::default().include("tasks"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IncludeNotAllowed { ref include, .. } if include == "tasks"));
        let (status, doc) = ErrorFormatter::format(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let doc = to_json(doc);
        assert!(doc.get("data").is_none());
        assert_eq!(doc["errors"][0]["source"]["parameter"], json!("include"));
    }

    #[tokio::test]
    async fn hidden_attributes_never_render() {
        let (state, _) = setup();
        let ada = create_user(&state, "Ada").await;
        let doc = to_json(JsonApiService::show(&state, "users", &ada, None).await.unwrap());
        let attributes = doc["data"]["attributes"].as_object().unwrap();
        assert_eq!(attributes["name"], json!("Ada"));
        assert!(!attributes.contains_key("password"));
        assert!(!attributes.contains_key("password_confirmation"));
    }
}

mod relationship_sync {
    use super::*;

    #[tokio::test]
    async fn replacing_members_notifies_only_the_changes() {
        let (state, notifier) = setup();
        let a = create_user(&state, "Ada").await;
        let b = create_user(&state, "Bob").await;
        let c = create_user(&state, "Cyd").await;
        let d = create_user(&state, "Dee").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;

        JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": users(&[&a, &b, &c])}), None)
            .await
            .unwrap();
        notifier.clear();

        let outcome = JsonApiService::replace_relationship(
            &state,
            "tasks",
            &task,
            "assignees",
            &json!({"data": users(&[&b, &c, &d])}),
            Some(&Actor::new(a.clone())),
        )
        .await
        .unwrap();
        assert_eq!(outcome.diff.added, identifiers(&[&d]));
        assert_eq!(outcome.diff.removed, identifiers(&[&a]));
        assert_eq!(outcome.diff.unchanged, identifiers(&[&b, &c]));
        assert_eq!(notifier.recipients_of(EventKind::Assigned), vec![ResourceIdentifier::new("users", d.clone())]);
        assert_eq!(notifier.recipients_of(EventKind::Unassigned), vec![ResourceIdentifier::new("users", a.clone())]);
        assert_eq!(notifier.deliveries()[0].context.actor, Some(Actor::new(a)));
    }

    #[tokio::test]
    async fn empty_set_clears_the_relationship() {
        let (state, _) = setup();
        let a = create_user(&state, "Ada").await;
        let b = create_user(&state, "Bob").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": users(&[&a, &b])}), None)
            .await
            .unwrap();

        let outcome = JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": []}), None)
            .await
            .unwrap();
        assert!(outcome.diff.added.is_empty());
        assert_eq!(outcome.diff.removed, identifiers(&[&a, &b]));

        let doc = to_json(JsonApiService::show_relationship(&state, "tasks", &task, "assignees").await.unwrap());
        assert_eq!(doc["data"], json!([]));
    }

    #[tokio::test]
    async fn null_data_also_clears() {
        let (state, _) = setup();
        let a = create_user(&state, "Ada").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": users(&[&a])}), None)
            .await
            .unwrap();
        let outcome = JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": null}), None)
            .await
            .unwrap();
        assert_eq!(outcome.diff.removed, identifiers(&[&a]));
    }

    #[tokio::test]
    async fn repeating_a_replace_changes_nothing() {
        let (state, notifier) = setup();
        let a = create_user(&state, "Ada").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        let payload = json!({"data": users(&[&a])});
        JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &payload, None)
            .await
            .unwrap();
        notifier.clear();

        let second = JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &payload, None)
            .await
            .unwrap();
        assert!(second.diff.is_empty());
        assert!(second.events.is_empty());
        assert!(notifier.deliveries().is_empty());
    }

    #[tokio::test]
    async fn missing_target_rejects_the_whole_update() {
        let (state, notifier) = setup();
        let a = create_user(&state, "Ada").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": users(&[&a])}), None)
            .await
            .unwrap();
        notifier.clear();

        let err = JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": users(&["99"])}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RelationshipTargetNotFound(ref ids) if ids == &vec![ResourceIdentifier::new("users", "99")]));
        assert_eq!(ErrorFormatter::status(&err), StatusCode::NOT_FOUND);

        let doc = to_json(JsonApiService::show_relationship(&state, "tasks", &task, "assignees").await.unwrap());
        assert_eq!(doc["data"], users(&[&a]));
        assert!(notifier.deliveries().is_empty());
    }

    #[tokio::test]
    async fn inverse_side_sees_memberships_by_url_segment() {
        let (state, _) = setup();
        let a = create_user(&state, "Ada").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": users(&[&a])}), None)
            .await
            .unwrap();

        let doc = to_json(JsonApiService::show_relationship(&state, "users", &a, "tasks-assigned").await.unwrap());
        assert_eq!(doc["data"], json!([{"type": "tasks", "id": task}]));
        assert_eq!(
            doc["links"]["self"],
            json!(format!("/api/v1/users/{}/relationships/tasks-assigned", a))
        );
    }

    #[tokio::test]
    async fn pivot_attributes_attach_to_new_members() {
        let (state, _) = setup();
        let a = create_user(&state, "Ada").await;
        let project = create_project(&state, "Apollo").await;
        let pivot = json!({"status": "invited"}).as_object().cloned().unwrap();
        JsonApiService::replace_relationship_with_pivot(&state, "projects", &project, "invitees", &json!({"data": users(&[&a])}), &pivot, None)
            .await
            .unwrap();

        let registry = default_catalogue().unwrap();
        let invitees = registry.describe("projects").unwrap().relationship("invitees").unwrap().clone();
        let memberships = state
            .store
            .memberships(&ResourceIdentifier::new("projects", project.clone()), &invitees)
            .await
            .unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].pivot["status"], json!("invited"));
    }

    #[tokio::test]
    async fn only_join_relationships_are_mutable() {
        let (state, _) = setup();
        let a = create_user(&state, "Ada").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        let err = JsonApiService::replace_relationship(&state, "tasks", &task, "creator", &json!({"data": {"type": "users", "id": a}}), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RelationshipNotMutable { .. }));
        assert_eq!(ErrorFormatter::status(&err), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn wrong_target_type_conflicts() {
        let (state, _) = setup();
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        let err = JsonApiService::replace_relationship(
            &state,
            "tasks",
            &task,
            "assignees",
            &json!({"data": [{"type": "projects", "id": project}]}),
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(ErrorFormatter::status(&err), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_relationship_is_not_found() {
        let (state, _) = setup();
        let project = create_project(&state, "Apollo").await;
        let err = JsonApiService::show_relationship(&state, "projects", &project, "owners").await.unwrap_err();
        assert!(matches!(err, AppError::UnknownRelationship { .. }));
    }
}

mod failing_notifier {
    use super::*;

    struct Offline;

    #[async_trait]
    impl Notifier for Offline {
        async fn send(&self, _: &[ResourceIdentifier], _: EventKind, _: &NotificationContext) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp unreachable".into()))
        }
    }

    #[tokio::test]
    async fn membership_change_survives_delivery_failure() {
        let state = AppState::new(
            default_catalogue().unwrap(),
            Arc::new(MemoryStore::new()),
            Arc::new(Offline),
            Settings::default(),
        );
        let a = create_user(&state, "Ada").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;

        let outcome = JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": users(&[&a])}), None)
            .await
            .unwrap();
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].kind, EventKind::Assigned);

        let doc = to_json(JsonApiService::show_relationship(&state, "tasks", &task, "assignees").await.unwrap());
        assert_eq!(doc["data"], users(&[&a]));
    }
}

mod supervisor_roles {
    use super::*;

    #[tokio::test]
    async fn promote_flags_members_and_notifies_named() {
        let (state, notifier) = setup();
        let a = create_user(&state, "Ada").await;
        let b = create_user(&state, "Bob").await;
        let outsider = create_user(&state, "Cyd").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": users(&[&a, &b])}), None)
            .await
            .unwrap();
        notifier.clear();

        let outcome = JsonApiService::promote_relationship(&state, "tasks", &task, "assignees", &json!({"data": users(&[&a, &outsider])}), None)
            .await
            .unwrap();
        assert_eq!(outcome.changed, 1);
        assert_eq!(
            notifier.recipients_of(EventKind::Promoted),
            vec![ResourceIdentifier::new("users", a.clone()), ResourceIdentifier::new("users", outsider)]
        );

        let registry = default_catalogue().unwrap();
        let assignees = registry.describe("tasks").unwrap().relationship("assignees").unwrap().clone();
        let memberships = state
            .store
            .memberships(&ResourceIdentifier::new("tasks", task.clone()), &assignees)
            .await
            .unwrap();
        assert_eq!(memberships.len(), 2);
        let supervisors: Vec<&str> = memberships
            .iter()
            .filter(|m| m.flags.supervisor)
            .map(|m| m.target.id.as_str())
            .collect();
        assert_eq!(supervisors, vec![a.as_str()]);
    }

    #[tokio::test]
    async fn demote_clears_the_flag() {
        let (state, notifier) = setup();
        let a = create_user(&state, "Ada").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        let payload = json!({"data": users(&[&a])});
        JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &payload, None)
            .await
            .unwrap();
        JsonApiService::promote_relationship(&state, "tasks", &task, "assignees", &payload, None)
            .await
            .unwrap();

        let outcome = JsonApiService::demote_relationship(&state, "tasks", &task, "assignees", &payload, None)
            .await
            .unwrap();
        assert_eq!(outcome.changed, 1);
        assert_eq!(outcome.event.kind, EventKind::Demoted);
        assert_eq!(notifier.recipients_of(EventKind::Demoted).len(), 1);
    }
}

mod relationship_payloads {
    use super::*;

    async fn replace(payload: Value) -> AppError {
        let (state, _) = setup();
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &payload, None)
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn element_without_id() {
        let err = replace(json!({"data": [{"type": "users"}]})).await;
        assert_eq!(pointers(&err), vec!["/data/0/id"]);
        assert_eq!(ErrorFormatter::status(&err), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn element_without_type() {
        let err = replace(json!({"data": [{"id": "1"}]})).await;
        assert_eq!(pointers(&err), vec!["/data/0/type"]);
    }

    #[tokio::test]
    async fn element_with_numeric_id() {
        let err = replace(json!({"data": [{"id": 1, "type": "users"}]})).await;
        assert_eq!(pointers(&err), vec!["/data/0/id"]);
        match err {
            AppError::Validation(errors) => assert_eq!(errors[0].detail, "The data.0.id must be a string."),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_data_member() {
        let err = replace(json!({"meta": {}})).await;
        assert_eq!(pointers(&err), vec!["/data"]);
    }

    #[tokio::test]
    async fn object_without_identifier_keeps_members() {
        let (state, notifier) = setup();
        let ada = create_user(&state, "Ada").await;
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;
        JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": users(&[&ada])}), None)
            .await
            .unwrap();
        notifier.clear();

        let err = JsonApiService::replace_relationship(&state, "tasks", &task, "assignees", &json!({"data": {"foo": 1}}), None)
            .await
            .unwrap_err();
        assert_eq!(pointers(&err), vec!["/data"]);
        assert!(notifier.deliveries().is_empty());
        let doc = to_json(JsonApiService::show_relationship(&state, "tasks", &task, "assignees").await.unwrap());
        assert_eq!(doc["data"], json!([{"type": "users", "id": ada}]));
    }

    #[tokio::test]
    async fn single_identifier_for_to_many() {
        let err = replace(json!({"data": {"type": "users", "id": "1"}})).await;
        assert_eq!(pointers(&err), vec!["/data"]);
    }
}

mod pagination {
    use super::*;

    async fn seed_categories(state: &AppState, count: usize) {
        for i in 1..=count {
            let payload = json!({"data": {"type": "categories", "attributes": {"title": format!("c{}", i)}}});
            JsonApiService::create(state, "categories", &payload).await.unwrap();
        }
    }

    #[tokio::test]
    async fn first_of_two_pages() {
        let (state, _) = setup();
        seed_categories(&state, 9).await;
        let doc = to_json(JsonApiService::list(&state, "categories", &ListParams::default().page(5, 1)).await.unwrap());
        assert_eq!(doc["data"].as_array().unwrap().len(), 5);
        assert!(doc["links"]["prev"].is_null());
        assert_eq!(doc["links"]["next"], json!("/api/v1/categories?page[size]=5&page[number]=2"));
        assert_eq!(doc["links"]["last"], json!("/api/v1/categories?page[size]=5&page[number]=2"));
        assert_eq!(doc["meta"]["total"], json!(9));
    }

    #[tokio::test]
    async fn second_of_two_pages() {
        let (state, _) = setup();
        seed_categories(&state, 9).await;
        let doc = to_json(JsonApiService::list(&state, "categories", &ListParams::default().page(5, 2)).await.unwrap());
        assert_eq!(doc["data"].as_array().unwrap().len(), 4);
        assert_eq!(doc["links"]["prev"], json!("/api/v1/categories?page[size]=5&page[number]=1"));
        assert!(doc["links"]["next"].is_null());
        assert!(doc["links"].as_object().unwrap().contains_key("next"));
    }

    #[tokio::test]
    async fn page_links_keep_sort() {
        let (state, _) = setup();
        seed_categories(&state, 3).await;
        let doc = to_json(
            JsonApiService::list(&state, "categories", &ListParams::default().sort("-title").page(2, 1))
                .await
                .unwrap(),
        );
        let titles: Vec<&str> = doc["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["attributes"]["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["c3", "c2"]);
        assert_eq!(doc["links"]["next"], json!("/api/v1/categories?page[size]=2&page[number]=2&sort=-title"));
    }

    #[tokio::test]
    async fn unlisted_sort_field_is_rejected() {
        let (state, _) = setup();
        let err = JsonApiService::list(&state, "users", &ListParams::default().sort("password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSortField { ref field, .. } if field == "password"));
    }

    #[tokio::test]
    async fn non_numeric_page_is_rejected() {
        let (state, _) = setup();
        let params = ListParams {
            page_size: Some("many".into()),
            ..ListParams::default()
        };
        let err = JsonApiService::list(&state, "users", &params).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPagination(_)));
    }
}

mod resources {
    use super::*;

    #[tokio::test]
    async fn create_reports_every_invalid_field() {
        let (state, _) = setup();
        let payload = json!({"data": {"type": "tasks", "attributes": {"description": 7}}});
        let err = JsonApiService::create(&state, "tasks", &payload).await.unwrap_err();
        assert_eq!(
            pointers(&err),
            vec![
                "/data/attributes/description",
                "/data/attributes/project_id",
                "/data/attributes/title"
            ]
        );
    }

    #[tokio::test]
    async fn belongs_to_linkage_and_related() {
        let (state, _) = setup();
        let project = create_project(&state, "Apollo").await;
        let task = create_task(&state, "Design", &project).await;

        let doc = to_json(JsonApiService::show(&state, "tasks", &task, Some("project")).await.unwrap());
        assert_eq!(doc["data"]["relationships"]["project"]["data"], json!({"type": "projects", "id": project}));
        assert_eq!(doc["data"]["relationships"]["creator"]["data"], Value::Null);
        assert_eq!(doc["included"][0]["attributes"]["name"], json!("Apollo"));

        let related = to_json(JsonApiService::show_related(&state, "projects", &project, "tasks").await.unwrap());
        assert_eq!(related["data"][0]["id"], json!(task));
    }

    #[tokio::test]
    async fn update_allows_keeping_own_unique_value() {
        let (state, _) = setup();
        let project = create_project(&state, "Apollo").await;
        let payload = json!({"data": {"type": "projects", "id": project, "attributes": {"name": "Apollo", "status": true}}});
        let doc = to_json(JsonApiService::update(&state, "projects", &project, &payload).await.unwrap());
        assert_eq!(doc["data"]["attributes"]["status"], json!(true));
    }

    #[tokio::test]
    async fn update_of_missing_resource_is_not_found() {
        let (state, _) = setup();
        let payload = json!({"data": {"type": "projects", "id": "42", "attributes": {}}});
        let err = JsonApiService::update(&state, "projects", "42", &payload).await.unwrap_err();
        assert_eq!(ErrorFormatter::status(&err), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_show_is_not_found() {
        let (state, _) = setup();
        let project = create_project(&state, "Apollo").await;
        JsonApiService::delete(&state, "projects", &project).await.unwrap();
        let err = JsonApiService::show(&state, "projects", &project, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(JsonApiService::delete(&state, "projects", &project).await.is_err());
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let (state, _) = setup();
        let err = JsonApiService::list(&state, "widgets", &ListParams::default()).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownResourceType(_)));
    }
}
