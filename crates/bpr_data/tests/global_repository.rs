use bpr_data::{Collection, ConnectionConfig, Query, RepoError, Repository};

#[test]
fn global_repository_installs_once() {
    assert!(Repository::global().is_none());

    let installed = Repository::init_global(Repository::new(ConnectionConfig::in_memory("first")))
        .unwrap();
    assert_eq!(installed.config().default_db(), "first");

    let second = Repository::init_global(Repository::new(ConnectionConfig::in_memory("second")));
    assert!(matches!(second, Err(RepoError::AlreadyInitialized)));

    let global = Repository::global().unwrap();
    assert_eq!(global.config().default_db(), "first");
    assert!(global
        .find(Collection::Testing, Query::new())
        .unwrap()
        .is_empty());
}
