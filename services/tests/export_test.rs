mod common;

use common::{FULL_HEADER, csv_file, editor_context, group_service, valid_line};
use useradmin_services::directory::UserDirectory;
use useradmin_services::export::{ExportError, ExportOptions, UserExporter};
use useradmin_services::import::{CsvUserImportValidator, Delimiter};
use useradmin_services::users::{InMemoryUserStore, StoredUser};

#[tokio::test]
async fn test_imported_users_are_exported_in_uid_order() {
    let store = InMemoryUserStore::new();
    let validator = CsvUserImportValidator::new(store.clone());
    let alice = valid_line("alice");
    let bob = "bob,secret123,bob@example.com,1,0,6|5";
    let file = csv_file(&[FULL_HEADER, &alice, bob]);
    validator
        .validate(&file, Delimiter::Comma, &editor_context())
        .await
        .unwrap();

    let exporter = UserExporter::new(ExportOptions {
        email: true,
        titles: true,
        groups: true,
        ..ExportOptions::default()
    });
    let mut out = Vec::new();
    let written = exporter.export(&store, &group_service(), &mut out).await.unwrap();

    assert_eq!(written, 2);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "id,uname,email,groups\n\
         1,alice,alice@example.com,Users\n\
         2,bob,bob@example.com,Staff|Users\n"
    );
}

#[tokio::test]
async fn test_tab_delimited_export() {
    let store = InMemoryUserStore::new()
        .with_user(StoredUser::new(9, "zoe", "zoe@example.com"))
        .with_user(StoredUser::new(4, "max", "max@example.com"));
    let exporter = UserExporter::new(ExportOptions {
        delimiter: Delimiter::from_code(4).unwrap(),
        email: true,
        ..ExportOptions::default()
    });
    let mut out = Vec::new();
    exporter.export(&store, &group_service(), &mut out).await.unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "4\tmax\tmax@example.com\n9\tzoe\tzoe@example.com\n"
    );
}

#[tokio::test]
async fn test_group_service_is_only_asked_for_the_groups_column() {
    let store = InMemoryUserStore::with_accounts([("alice", "alice@example.com")]);
    let groups = group_service().unavailable();

    let plain = UserExporter::new(ExportOptions::default());
    assert_eq!(plain.export(&store, &groups, Vec::new()).await.unwrap(), 1);

    let with_groups = UserExporter::new(ExportOptions {
        groups: true,
        ..ExportOptions::default()
    });
    let error = with_groups.export(&store, &groups, Vec::new()).await.unwrap_err();
    assert!(matches!(error, ExportError::Groups(_)));
    assert!(error.to_string().contains("unavailable"));
}

#[tokio::test]
async fn test_directory_snapshot_feeds_import_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");

    let directory = UserDirectory::load(&path).unwrap();
    let store = directory.user_store();
    let validator = CsvUserImportValidator::new(store.clone());
    let alice = valid_line("alice");
    validator
        .validate(&csv_file(&[FULL_HEADER, &alice]), Delimiter::Comma, &editor_context())
        .await
        .unwrap();
    directory.with_users_from(&store).save(&path).unwrap();

    let reloaded = UserDirectory::load(&path).unwrap();
    assert_eq!(reloaded.users.len(), 1);

    let mut out = Vec::new();
    UserExporter::new(ExportOptions::default())
        .export(&reloaded.user_store(), &reloaded.group_service(), &mut out)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "1,alice\n");
}
