//! Relay transports and the relayed store backend.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use super::{dispatch, Operation, RelayRequest, RelayResponse, PONG};
use crate::error::{Result, VaultError};
use crate::storage::{Contact, ContactQuery, ContactUpdate, NewContact, StoreBackend};

/// Transport carrying one request to the privileged context and its
/// response back.
pub trait RelayChannel: Send + Sync {
    /// # Errors
    ///
    /// Returns `VaultError::RelayUnavailable` if the privileged context
    /// cannot be reached or does not answer in time.
    fn send(&self, request: &RelayRequest) -> Result<RelayResponse>;
}

/// Channel to a backend in the same process.
///
/// Requests and responses still pass through their JSON encoding, so the
/// behavior matches a real transport.
pub struct InProcessChannel<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> InProcessChannel<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: StoreBackend> RelayChannel for InProcessChannel<B> {
    fn send(&self, request: &RelayRequest) -> Result<RelayResponse> {
        let request: RelayRequest = serde_json::from_str(&serde_json::to_string(request)?)?;
        let response = dispatch(&self.backend, &request);
        Ok(serde_json::from_str(&serde_json::to_string(&response)?)?)
    }
}

#[cfg(unix)]
pub use socket::SocketChannel;

#[cfg(unix)]
mod socket {
    use std::io::{BufRead, BufReader, ErrorKind, Write};
    use std::os::unix::net::UnixStream;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use super::RelayChannel;
    use crate::error::{Result, VaultError};
    use crate::relay::{RelayRequest, RelayResponse};

    /// One JSON line per request over a Unix socket, one connection per call.
    pub struct SocketChannel {
        path: PathBuf,
        timeout: Duration,
    }

    impl SocketChannel {
        pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
            Self {
                path: path.into(),
                timeout,
            }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    fn unavailable(context: &str, err: std::io::Error) -> VaultError {
        match err.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                VaultError::RelayUnavailable(format!("{}: timed out", context))
            }
            _ => VaultError::RelayUnavailable(format!("{}: {}", context, err)),
        }
    }

    impl RelayChannel for SocketChannel {
        fn send(&self, request: &RelayRequest) -> Result<RelayResponse> {
            let mut stream = UnixStream::connect(&self.path)
                .map_err(|e| unavailable(&format!("connect {}", self.path.display()), e))?;
            stream
                .set_read_timeout(Some(self.timeout))
                .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
                .map_err(|e| unavailable("configure socket", e))?;

            let mut line = serde_json::to_string(request)?;
            line.push('\n');
            stream
                .write_all(line.as_bytes())
                .and_then(|_| stream.flush())
                .map_err(|e| unavailable("send request", e))?;

            let mut response = String::new();
            let read = BufReader::new(&stream)
                .read_line(&mut response)
                .map_err(|e| unavailable("read response", e))?;
            if read == 0 {
                return Err(VaultError::RelayUnavailable(
                    "relay closed the connection without answering".to_string(),
                ));
            }
            decode_response(response.trim_end())
        }
    }

    /// A reply that is not a response envelope means the relay is broken.
    fn decode_response(line: &str) -> Result<RelayResponse> {
        serde_json::from_str(line).map_err(|e| {
            VaultError::RelayUnavailable(format!("malformed relay response: {}", e))
        })
    }
}

/// Store backend that forwards every operation through a [`RelayChannel`].
pub struct RelayedStore<C: RelayChannel> {
    channel: C,
}

impl<C: RelayChannel> RelayedStore<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Check that the privileged context answers.
    pub fn ping(&self) -> Result<()> {
        let reply: String = self.call(Operation::Ping, Vec::new())?;
        if reply == PONG {
            Ok(())
        } else {
            Err(VaultError::RelayUnavailable(format!(
                "unexpected ping reply: {}",
                reply
            )))
        }
    }

    fn call<T: DeserializeOwned>(&self, operation: Operation, args: Vec<Value>) -> Result<T> {
        let response = self.channel.send(&RelayRequest::new(operation, args))?;
        let value = response.into_result()?;
        Ok(serde_json::from_value(value)?)
    }

    fn call_unit(&self, operation: Operation, args: Vec<Value>) -> Result<()> {
        self.call::<Value>(operation, args).map(|_| ())
    }
}

impl<C: RelayChannel> StoreBackend for RelayedStore<C> {
    fn contact_save(&self, contacts: &[NewContact]) -> Result<()> {
        if contacts.is_empty() {
            return Ok(());
        }
        self.call_unit(Operation::ContactSave, vec![serde_json::to_value(contacts)?])
    }

    fn contact_update(&self, emails: &[String], update: &ContactUpdate) -> Result<()> {
        self.call_unit(
            Operation::ContactUpdate,
            vec![json!(emails), serde_json::to_value(update)?],
        )
    }

    fn contact_get(&self, ids: &[String]) -> Result<Vec<Option<Contact>>> {
        self.call(Operation::ContactGet, vec![json!(ids)])
    }

    fn contact_search(&self, query: &ContactQuery) -> Result<Vec<Contact>> {
        self.call(Operation::ContactSearch, vec![serde_json::to_value(query)?])
    }

    fn contact_remove_by_longid(&self, longid: &str) -> Result<usize> {
        self.call(Operation::ContactRemoveByLongid, vec![json!(longid)])
    }

    fn contact_pending_lookups(&self, limit: Option<usize>) -> Result<Vec<Contact>> {
        self.call(Operation::ContactPendingLookups, vec![json!(limit)])
    }

    fn settings_set(&self, account: Option<&str>, values: &Map<String, Value>) -> Result<()> {
        self.call_unit(
            Operation::SettingsSet,
            vec![json!(account), Value::Object(values.clone())],
        )
    }

    fn settings_get(&self, account: Option<&str>, keys: &[String]) -> Result<Map<String, Value>> {
        self.call(Operation::SettingsGet, vec![json!(account), json!(keys)])
    }

    fn settings_remove(&self, account: Option<&str>, keys: &[String]) -> Result<()> {
        self.call_unit(Operation::SettingsRemove, vec![json!(account), json!(keys)])
    }

    fn session_set(&self, account: &str, key: &str, value: Option<&str>) -> Result<()> {
        self.call_unit(
            Operation::SessionSet,
            vec![json!(account), json!(key), json!(value)],
        )
    }

    fn session_get(&self, account: &str, key: &str) -> Result<Option<String>> {
        self.call(Operation::SessionGet, vec![json!(account), json!(key)])
    }
}
