//! Context relay.
//!
//! A context that cannot open the store sends `{operation_name, args}` to a
//! privileged context, which runs the named operation against its
//! [`LocalStore`](crate::storage::LocalStore) and sends back either the
//! result or a wire error. The relay is generic: every [`StoreBackend`]
//! operation goes through [`dispatch`], none has its own message type.

pub mod channel;
#[cfg(unix)]
pub mod server;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, VaultError, WireError};
use crate::storage::{ContactQuery, ContactUpdate, NewContact, StoreBackend};

pub use channel::{InProcessChannel, RelayChannel, RelayedStore};
#[cfg(unix)]
pub use channel::SocketChannel;
#[cfg(unix)]
pub use server::RelayServer;

/// One relayed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub operation_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl RelayRequest {
    pub fn new(operation: Operation, args: Vec<Value>) -> Self {
        Self {
            operation_name: operation.as_str().to_string(),
            args,
        }
    }
}

/// What the target operation resolved or failed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayResponse {
    Ok(Value),
    Err(WireError),
}

impl RelayResponse {
    pub fn into_result(self) -> Result<Value> {
        match self {
            RelayResponse::Ok(value) => Ok(value),
            RelayResponse::Err(wire) => Err(VaultError::from(wire)),
        }
    }
}

impl From<Result<Value>> for RelayResponse {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(value) => RelayResponse::Ok(value),
            Err(err) => RelayResponse::Err(WireError::from(&err)),
        }
    }
}

/// Operations reachable through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ContactSave,
    ContactUpdate,
    ContactGet,
    ContactSearch,
    ContactRemoveByLongid,
    ContactPendingLookups,
    SettingsSet,
    SettingsGet,
    SettingsRemove,
    SessionSet,
    SessionGet,
    Ping,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Operation::ContactSave,
        Operation::ContactUpdate,
        Operation::ContactGet,
        Operation::ContactSearch,
        Operation::ContactRemoveByLongid,
        Operation::ContactPendingLookups,
        Operation::SettingsSet,
        Operation::SettingsGet,
        Operation::SettingsRemove,
        Operation::SessionSet,
        Operation::SessionGet,
        Operation::Ping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ContactSave => "contact_save",
            Operation::ContactUpdate => "contact_update",
            Operation::ContactGet => "contact_get",
            Operation::ContactSearch => "contact_search",
            Operation::ContactRemoveByLongid => "contact_remove_by_longid",
            Operation::ContactPendingLookups => "contact_pending_lookups",
            Operation::SettingsSet => "settings_set",
            Operation::SettingsGet => "settings_get",
            Operation::SettingsRemove => "settings_remove",
            Operation::SessionSet => "session_set",
            Operation::SessionGet => "session_get",
            Operation::Ping => "ping",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| VaultError::InvalidInput(format!("unknown operation: {}", s)))
    }
}

/// Reply sent to `ping`.
pub const PONG: &str = "pong";

// Single values and arrays are both accepted wherever the local API takes
// either shape.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

fn arg<T: DeserializeOwned>(args: &[Value], index: usize, name: &str) -> Result<T> {
    let value = args.get(index).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| VaultError::InvalidInput(format!("argument {} ({}): {}", index, name, e)))
}

/// Run one relayed request against a backend.
pub fn dispatch(backend: &dyn StoreBackend, request: &RelayRequest) -> RelayResponse {
    tracing::debug!(operation = %request.operation_name, args = request.args.len(), "relay dispatch");
    let result = request
        .operation_name
        .parse::<Operation>()
        .and_then(|operation| execute(backend, operation, &request.args));
    if let Err(ref err) = result {
        tracing::debug!(operation = %request.operation_name, kind = err.kind(), "relay call failed");
    }
    RelayResponse::from(result)
}

fn execute(backend: &dyn StoreBackend, operation: Operation, args: &[Value]) -> Result<Value> {
    let unit = |value: Result<()>| value.map(|_| Value::Null);

    match operation {
        Operation::ContactSave => {
            let contacts: OneOrMany<NewContact> = arg(args, 0, "contacts")?;
            unit(backend.contact_save(&contacts.into_vec()))
        }
        Operation::ContactUpdate => {
            let emails: OneOrMany<String> = arg(args, 0, "emails")?;
            let update: ContactUpdate = arg(args, 1, "update")?;
            unit(backend.contact_update(&emails.into_vec(), &update))
        }
        Operation::ContactGet => match arg::<OneOrMany<String>>(args, 0, "ids")? {
            OneOrMany::One(id) => {
                let mut found = backend.contact_get(&[id])?;
                Ok(serde_json::to_value(found.pop().flatten())?)
            }
            OneOrMany::Many(ids) => Ok(serde_json::to_value(backend.contact_get(&ids)?)?),
        },
        Operation::ContactSearch => {
            let raw = match args.first() {
                None | Some(Value::Null) => Value::Object(Map::new()),
                Some(value) => value.clone(),
            };
            let query = ContactQuery::from_value(raw)?;
            Ok(serde_json::to_value(backend.contact_search(&query)?)?)
        }
        Operation::ContactRemoveByLongid => {
            let longid: String = arg(args, 0, "longid")?;
            Ok(Value::from(backend.contact_remove_by_longid(&longid)?))
        }
        Operation::ContactPendingLookups => {
            let limit: Option<usize> = arg(args, 0, "limit")?;
            Ok(serde_json::to_value(backend.contact_pending_lookups(limit)?)?)
        }
        Operation::SettingsSet => {
            let account: Option<String> = arg(args, 0, "account")?;
            let values: Map<String, Value> = arg(args, 1, "values")?;
            unit(backend.settings_set(account.as_deref(), &values))
        }
        Operation::SettingsGet => {
            let account: Option<String> = arg(args, 0, "account")?;
            let keys: OneOrMany<String> = arg(args, 1, "keys")?;
            let values = backend.settings_get(account.as_deref(), &keys.into_vec())?;
            Ok(Value::Object(values))
        }
        Operation::SettingsRemove => {
            let account: Option<String> = arg(args, 0, "account")?;
            let keys: OneOrMany<String> = arg(args, 1, "keys")?;
            unit(backend.settings_remove(account.as_deref(), &keys.into_vec()))
        }
        Operation::SessionSet => {
            let account: String = arg(args, 0, "account")?;
            let key: String = arg(args, 1, "key")?;
            let value: Option<String> = arg(args, 2, "value")?;
            unit(backend.session_set(&account, &key, value.as_deref()))
        }
        Operation::SessionGet => {
            let account: String = arg(args, 0, "account")?;
            let key: String = arg(args, 1, "key")?;
            Ok(serde_json::to_value(backend.session_get(&account, &key)?)?)
        }
        Operation::Ping => Ok(Value::String(PONG.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::keys::testing::MarkerInspector;
    use crate::report::TracingReporter;
    use crate::storage::LocalStore;

    fn backend() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(
            &dir.path().join("vault.db"),
            Arc::new(MarkerInspector),
            Arc::new(TracingReporter),
        )
        .unwrap();
        (dir, store)
    }

    fn call(store: &LocalStore, operation: &str, args: Value) -> RelayResponse {
        let args = match args {
            Value::Array(items) => items,
            other => vec![other],
        };
        dispatch(
            store,
            &RelayRequest {
                operation_name: operation.to_string(),
                args,
            },
        )
    }

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert!(matches!("drop_tables".parse::<Operation>(), Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_operation_is_invalid_input() {
        let (_dir, store) = backend();
        let response = call(&store, "contact_delete", json!([]));
        match response {
            RelayResponse::Err(wire) => assert_eq!(wire.kind, "invalid_input"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_get_shape_follows_input() {
        let (_dir, store) = backend();
        call(&store, "contact_save", json!([{"email": "a@x.com", "name": "Ann"}]))
            .into_result()
            .unwrap();

        let single = call(&store, "contact_get", json!(["a@x.com"])).into_result().unwrap();
        assert_eq!(single["email"], "a@x.com");

        let many = call(&store, "contact_get", json!([["a@x.com", "nobody@x.com"]]))
            .into_result()
            .unwrap();
        assert_eq!(many.as_array().unwrap().len(), 2);
        assert!(many[1].is_null());

        let missing = call(&store, "contact_get", json!(["nobody@x.com"])).into_result().unwrap();
        assert!(missing.is_null());
    }

    #[test]
    fn test_search_rejects_unknown_key() {
        let (_dir, store) = backend();
        let err = call(&store, "contact_search", json!({"substring": "a", "order": "desc"}))
            .into_result()
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidQuery(_)));
    }

    #[test]
    fn test_malformed_argument_is_invalid_input() {
        let (_dir, store) = backend();
        let err = call(&store, "contact_remove_by_longid", json!([42]))
            .into_result()
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidInput(_)));
    }

    #[test]
    fn test_settings_and_session_ops() {
        let (_dir, store) = backend();
        call(&store, "settings_set", json!([null, {"setup_done": true}]))
            .into_result()
            .unwrap();
        let values = call(&store, "settings_get", json!([null, ["setup_done"]]))
            .into_result()
            .unwrap();
        assert_eq!(values, json!({"setup_done": true}));

        call(&store, "session_set", json!(["a@x.com", "k", "v"])).into_result().unwrap();
        let value = call(&store, "session_get", json!(["a@x.com", "k"])).into_result().unwrap();
        assert_eq!(value, json!("v"));

        assert_eq!(call(&store, "ping", json!([])).into_result().unwrap(), json!(PONG));
    }
}
