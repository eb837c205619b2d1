mod common;

use common::{MarkerInspector, TestStore};
use mailvault_core::keys::backup::{read_backup, write_backup};
use mailvault_core::keys::PRIMARY;
use mailvault_core::{KeyVault, VaultError};

#[test]
fn test_backup_restore_into_fresh_store() {
    let source = TestStore::new();
    let vault = KeyVault::new(&source.store, &MarkerInspector);
    vault.add("me@x.com", "PRIVATE KEY:ABCDEF0123456789").unwrap();
    vault.add("me@x.com", "PRIVATE KEY:0123456789ABCDEF").unwrap();
    vault.set_primary("me@x.com", "0123456789ABCDEF").unwrap();

    let backup = source.dir.path().join("me.age");
    write_backup(&backup, &vault.list("me@x.com").unwrap(), "correct horse battery")
        .expect("backup should be written");
    let on_disk = std::fs::read(&backup).unwrap();
    assert!(!String::from_utf8_lossy(&on_disk).contains("PRIVATE KEY"));

    let target = TestStore::new();
    let restored_vault = KeyVault::new(&target.store, &MarkerInspector);
    for key in read_backup(&backup, "correct horse battery").unwrap() {
        restored_vault.add("me@x.com", &key.private).unwrap();
    }

    let restored = restored_vault.list("me@x.com").unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(
        restored_vault.get("me@x.com", PRIMARY).unwrap().unwrap().longid,
        "ABCDEF0123456789",
        "restoring into an empty vault makes the first key primary"
    );
}

#[test]
fn test_backup_wrong_passphrase_fails() {
    let test = TestStore::new();
    let vault = KeyVault::new(&test.store, &MarkerInspector);
    vault.add("me@x.com", "PRIVATE KEY:ABCDEF0123456789").unwrap();

    let backup = test.dir.path().join("me.age");
    write_backup(&backup, &vault.list("me@x.com").unwrap(), "correct horse battery").unwrap();

    let result = read_backup(&backup, "incorrect horse battery");
    assert!(matches!(result, Err(VaultError::Crypto(_))));
}
