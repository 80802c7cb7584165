use bpr_data::model::modeling::{FullModelRepresentation, Model, ModelRepresentation};
use bpr_data::model::object_id;
use bpr_data::model::project::{Project, ProjectUser};
use bpr_data::model::team::Team;
use bpr_data::model::user::User;
use bpr_data::model::workspace::Workspace;
use bpr_data::store::document_id;
use bpr_data::{
    Collection, ConnectionConfig, Join, Mapping, ObjectId, Query, RepoError, Repository,
    StoreError,
};
use serde_json::{json, Value};

fn repo() -> Repository {
    Repository::new(ConnectionConfig::in_memory("bpr_test"))
}

fn mapping(value: Value) -> Mapping {
    value.as_object().cloned().unwrap()
}

fn insert_workspace(repo: &Repository, name: &str) -> ObjectId {
    let stored = repo
        .insert(Collection::Workspace, &Workspace::new(name))
        .unwrap()
        .unwrap();
    document_id(&stored).unwrap()
}

#[test]
fn acme_workspace_end_to_end() {
    let repo = repo();
    let id = insert_workspace(&repo, "Acme");

    let found = repo
        .find_one(Collection::Workspace, Query::new().with("id", id.to_hex()))
        .unwrap()
        .unwrap();
    assert_eq!(found["name"], json!("Acme"));

    let member = json!({ "userId": "u-1" });
    assert!(repo.push(Collection::Workspace, id, "users", &member).unwrap());
    assert!(!repo.push(Collection::Workspace, id, "users", &member).unwrap());

    let workspace = repo
        .find_one_as::<Workspace>(Collection::Workspace, Query::by_id(id))
        .unwrap()
        .unwrap();
    assert_eq!(workspace.users, Some(vec![member]));
}

#[test]
fn out_of_range_list_index_is_rejected_and_store_stays_usable() {
    let repo = repo();
    let id = insert_workspace(&repo, "Acme");

    for field in ["users.18446744073709551615", "users.4000000000"] {
        assert!(matches!(
            repo.push(Collection::Workspace, id, field, &json!(1)),
            Err(RepoError::Store(StoreError::InvalidQuery(_)))
        ));
    }

    let found = repo.find(Collection::Workspace, Query::new()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["users"], json!([]));
}

#[test]
fn insert_discards_client_identifier() {
    let repo = repo();
    let client_id = ObjectId::new();
    let mut workspace = Workspace::new("Acme");
    workspace.id = Some(client_id);

    let stored = repo
        .insert_as::<Workspace>(Collection::Workspace, &workspace)
        .unwrap()
        .unwrap();
    let assigned = stored.id.unwrap();
    assert_ne!(assigned, client_id);
    assert!(repo
        .find_one(Collection::Workspace, Query::by_id(client_id))
        .unwrap()
        .is_none());
}

#[test]
fn find_returns_every_match_and_empty_list_on_none() {
    let repo = repo();
    let workspace_id = ObjectId::new();
    for title in ["a", "b", "c"] {
        repo.insert(Collection::Project, &Project::new(title, workspace_id))
            .unwrap();
    }
    repo.insert(Collection::Project, &Project::new("other", ObjectId::new()))
        .unwrap();

    let projects = repo
        .find_as::<Project>(
            Collection::Project,
            Query::new().with("workspaceId", object_id::to_value(&workspace_id)),
        )
        .unwrap();
    assert_eq!(projects.len(), 3);

    let none = repo
        .find(Collection::Project, Query::new().with("title", "missing"))
        .unwrap();
    assert!(none.is_empty());
    assert!(repo
        .find_one(Collection::Project, Query::new().with("title", "missing"))
        .unwrap()
        .is_none());
}

#[test]
fn find_merges_nested_conditions() {
    let repo = repo();
    let user_id = ObjectId::new();
    let mut shared = Project::new("shared", ObjectId::new());
    shared.users = Some(vec![ProjectUser::new(user_id, true)]);
    repo.insert(Collection::Project, &shared).unwrap();
    repo.insert(Collection::Project, &Project::new("private", ObjectId::new()))
        .unwrap();

    let found = repo
        .find_as::<Project>(
            Collection::Project,
            Query::new().nested(mapping(json!({ "users.userId": user_id }))),
        )
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title.as_deref(), Some("shared"));
}

#[test]
fn non_native_underscore_id_is_an_identifier_type_error() {
    let repo = repo();
    let result = repo.find(
        Collection::Workspace,
        Query::new().with("_id", ObjectId::new().to_hex()),
    );
    assert!(matches!(result, Err(RepoError::IdentifierType(_))));
}

#[test]
fn delete_removes_first_match_only() {
    let repo = repo();
    insert_workspace(&repo, "dup");
    insert_workspace(&repo, "dup");

    assert!(repo
        .delete(Collection::Workspace, Query::new().with("name", "dup"))
        .unwrap());
    assert_eq!(
        repo.find(Collection::Workspace, Query::new().with("name", "dup"))
            .unwrap()
            .len(),
        1
    );
    assert!(!repo
        .delete(Collection::Workspace, Query::new().with("name", "gone"))
        .unwrap());
}

#[test]
fn update_replaces_fields_but_keeps_identifier() {
    let repo = repo();
    let stored = repo
        .insert_as::<User>(Collection::User, &User::new("Ada", "ada@example.com", "fb-1"))
        .unwrap()
        .unwrap();

    let mut changed = stored.clone();
    changed.email = Some("ada@lovelace.dev".to_string());
    changed.firebase_id = None;

    let updated = repo
        .update_as::<User>(Collection::User, &changed)
        .unwrap()
        .unwrap();
    assert_eq!(updated, changed);
    assert_eq!(updated.id, stored.id);
}

#[test]
fn update_without_identifier_yields_none() {
    let repo = repo();
    let user = User::new("Ada", "ada@example.com", "fb-1");
    assert!(repo.update(Collection::User, &user).unwrap().is_none());
}

#[test]
fn push_list_adds_missing_items_only() {
    let repo = repo();
    let id = insert_workspace(&repo, "Acme");
    let members = vec![json!({ "userId": "a" }), json!({ "userId": "b" })];

    assert_eq!(
        repo.push_list(Collection::Workspace, id, "users", &members)
            .unwrap(),
        Some(true)
    );
    assert_eq!(
        repo.push_list(Collection::Workspace, id, "users", &members[..1])
            .unwrap(),
        Some(false)
    );
    let empty: Vec<Value> = Vec::new();
    assert_eq!(
        repo.push_list(Collection::Workspace, id, "users", &empty)
            .unwrap(),
        None
    );

    let workspace = repo
        .find_one_as::<Workspace>(Collection::Workspace, Query::by_id(id))
        .unwrap()
        .unwrap();
    assert_eq!(workspace.users, Some(members));
}

#[test]
fn pull_removes_every_matching_element() {
    let repo = repo();
    let team = repo
        .insert_as::<Team>(Collection::Team, &Team::new("core", ObjectId::new()))
        .unwrap()
        .unwrap();
    let team_id = team.id.unwrap();

    repo.push_list(
        Collection::Team,
        team_id,
        "users",
        &[
            json!({ "userId": "a", "role": "lead" }),
            json!({ "userId": "b" }),
            json!({ "userId": "a", "role": "dev" }),
        ],
    )
    .unwrap();

    assert!(repo
        .pull(Collection::Team, team_id, "users", &json!({ "userId": "a" }))
        .unwrap());
    let team = repo
        .find_one_as::<Team>(Collection::Team, Query::by_id(team_id))
        .unwrap()
        .unwrap();
    assert_eq!(team.users, Some(vec![json!({ "userId": "b" })]));

    assert!(!repo
        .pull(Collection::Team, team_id, "users", &json!({ "userId": "a" }))
        .unwrap());
}

#[test]
fn update_list_item_replaces_first_matching_element() {
    let repo = repo();
    let id = insert_workspace(&repo, "Acme");
    repo.push_list(
        Collection::Workspace,
        id,
        "users",
        &[
            json!({ "userId": "a", "permissions": [] }),
            json!({ "userId": "b", "permissions": [] }),
        ],
    )
    .unwrap();

    let replacement = json!({ "userId": "b", "permissions": ["MANAGE_TEAMS"] });
    assert!(repo
        .update_list_item(
            Collection::Workspace,
            id,
            "users",
            mapping(json!({ "users.userId": "b" })),
            &replacement,
        )
        .unwrap());

    let workspace = repo
        .find_one_as::<Workspace>(Collection::Workspace, Query::by_id(id))
        .unwrap()
        .unwrap();
    assert_eq!(
        workspace.users,
        Some(vec![json!({ "userId": "a", "permissions": [] }), replacement])
    );
}

#[test]
fn join_attaches_foreign_documents_and_unwind_drops_unmatched() {
    let repo = repo();
    let diagram_id = ObjectId::new();

    let placed = repo
        .insert_as::<Model>(
            Collection::Model,
            &Model::new("class", ObjectId::new(), "/shapes"),
        )
        .unwrap()
        .unwrap();
    let placed_id = placed.id.unwrap();

    let representation = |model_id: ObjectId| ModelRepresentation {
        id: None,
        model_id: Some(model_id),
        diagram_id: Some(diagram_id),
        x: Some(1.0),
        y: Some(2.0),
        w: Some(10.0),
        h: Some(20.0),
    };
    repo.insert(Collection::ModelRepresentation, &representation(placed_id))
        .unwrap();
    repo.insert(Collection::ModelRepresentation, &representation(ObjectId::new()))
        .unwrap();

    let join = Join::new(
        Collection::ModelRepresentation,
        "modelId",
        Collection::Model,
        "_id",
        "model",
    );

    let joined = repo
        .join(&join, Query::new().with("diagramId", object_id::to_value(&diagram_id)))
        .unwrap();
    assert_eq!(joined.len(), 2);
    assert_eq!(joined[0]["model"].as_array().unwrap().len(), 1);
    assert_eq!(joined[1]["model"], json!([]));

    let unwound = repo
        .join_as::<FullModelRepresentation>(
            &join.clone().unwind(true),
            Query::new().with("diagramId", object_id::to_value(&diagram_id)),
        )
        .unwrap();
    assert_eq!(unwound.len(), 1);
    assert_eq!(unwound[0].model.as_ref().unwrap().id, Some(placed_id));
}

#[test]
fn aggregate_passes_pipeline_through() {
    let repo = repo();
    for name in ["b", "c", "a"] {
        insert_workspace(&repo, name);
    }
    let pipeline = vec![
        mapping(json!({ "$sort": { "name": 1 } })),
        mapping(json!({ "$limit": 2 })),
    ];
    let names = repo
        .aggregate_as::<Workspace>(Collection::Workspace, &pipeline)
        .unwrap()
        .into_iter()
        .map(|workspace| workspace.name.unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn cleanup_relations_pulls_from_every_affected_document() {
    let repo = repo();
    let removed_user = ObjectId::new();
    let kept_user = ObjectId::new();

    let mut ids = Vec::new();
    for title in ["one", "two"] {
        let mut project = Project::new(title, ObjectId::new());
        project.users = Some(vec![
            ProjectUser::new(removed_user, true),
            ProjectUser::new(kept_user, false),
        ]);
        let stored = repo
            .insert_as::<Project>(Collection::Project, &project)
            .unwrap()
            .unwrap();
        ids.push(stored.id.unwrap());
    }
    repo.insert(Collection::Project, &Project::new("untouched", ObjectId::new()))
        .unwrap();

    let modified = repo
        .cleanup_relations(
            Collection::Project,
            "users",
            mapping(json!({ "userId": removed_user })),
        )
        .unwrap();
    assert_eq!(modified, 2);

    for id in ids {
        let project = repo
            .find_one_as::<Project>(Collection::Project, Query::by_id(id))
            .unwrap()
            .unwrap();
        assert_eq!(project.users, Some(vec![ProjectUser::new(kept_user, false)]));
    }
}

#[test]
fn purge_empties_a_collection() {
    let repo = repo();
    insert_workspace(&repo, "a");
    insert_workspace(&repo, "b");
    assert_eq!(repo.purge(Collection::Workspace).unwrap(), 2);
    assert!(repo
        .find(Collection::Workspace, Query::new())
        .unwrap()
        .is_empty());
}
