#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use mailvault_core::keys::KeyInspector;
use mailvault_core::{ErrorReporter, LocalStore, TracingReporter, VaultError};

/// Reads `KEY:<LONGID>` markers out of test key material.
pub struct MarkerInspector;

impl KeyInspector for MarkerInspector {
    fn longid(&self, armored: &str) -> Option<String> {
        let (_, rest) = armored.split_once("KEY:")?;
        let id: String = rest.chars().take(16).collect();
        mailvault_core::keys::is_longid(&id).then_some(id)
    }

    fn fingerprint(&self, armored: &str) -> Option<String> {
        self.longid(armored).map(|id| format!("FP{:0>38}", id))
    }

    fn public_armor(&self, armored_private: &str) -> Option<String> {
        self.longid(armored_private).map(|id| format!("PUBLIC KEY:{}", id))
    }
}

/// Keeps the kind of every reported error.
#[derive(Default)]
pub struct CountingReporter {
    kinds: Mutex<Vec<String>>,
}

impl CountingReporter {
    pub fn kinds(&self) -> Vec<String> {
        self.kinds.lock().unwrap().clone()
    }
}

impl ErrorReporter for CountingReporter {
    fn report(&self, error: &VaultError) {
        self.kinds.lock().unwrap().push(error.kind().to_string());
    }
}

pub struct TestStore {
    pub dir: tempfile::TempDir,
    pub store: LocalStore,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = LocalStore::open(
            &dir.path().join("mailvault.db"),
            Arc::new(MarkerInspector),
            Arc::new(TracingReporter),
        )
        .expect("store should open");
        Self { dir, store }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("mailvault.db")
    }
}
