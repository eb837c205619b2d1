//! Privileged relay server.
//!
//! Owns a [`LocalStore`] and answers relay requests on a Unix socket, one
//! connection at a time. Each connection may carry several request lines.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{dispatch, RelayRequest, RelayResponse};
use crate::error::{Result, VaultError, WireError};
use crate::storage::LocalStore;

/// How long the accept loop sleeps when no client is waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a connected client may stay silent before it is dropped.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RelayServer {
    store: LocalStore,
    listener: UnixListener,
    socket_path: PathBuf,
    idle_exit: Option<Duration>,
}

impl RelayServer {
    /// Bind the socket, replacing a stale socket file.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Io` if the socket directory cannot be created or
    /// the socket cannot be bound.
    pub fn bind(store: LocalStore, socket_path: &Path) -> Result<Self> {
        let parent = socket_path.parent().ok_or_else(|| {
            VaultError::InvalidInput(format!(
                "Relay socket path has no parent directory: {}",
                socket_path.display()
            ))
        })?;
        std::fs::create_dir_all(parent)?;
        if socket_path.exists() {
            let _ = std::fs::remove_file(socket_path);
        }

        let listener = UnixListener::bind(socket_path)?;
        set_socket_permissions(socket_path)?;
        listener.set_nonblocking(true)?;
        tracing::info!(socket = %socket_path.display(), "relay listening");

        Ok(Self {
            store,
            listener,
            socket_path: socket_path.to_path_buf(),
            idle_exit: None,
        })
    }

    /// Stop serving after this long without a client.
    pub fn with_idle_exit(mut self, idle: Duration) -> Self {
        self.idle_exit = Some(idle);
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Serve until `shutdown` is set or the idle timeout passes.
    pub fn serve(&self, shutdown: &AtomicBool) -> Result<()> {
        let mut last_activity = Instant::now();

        while !shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, _addr)) => {
                    last_activity = Instant::now();
                    if let Err(err) = self.handle_connection(stream) {
                        tracing::warn!("relay connection failed: {}", err);
                    }
                    continue;
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {}
                Err(err) => return Err(err.into()),
            }

            if let Some(idle) = self.idle_exit {
                if last_activity.elapsed() >= idle {
                    tracing::info!("relay idle, exiting");
                    break;
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        Ok(())
    }

    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
        stream.set_write_timeout(Some(CLIENT_TIMEOUT))?;

        let mut writer = stream.try_clone()?;
        for line in BufReader::new(stream).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut reply = serde_json::to_string(&self.handle_line(&line))?;
            reply.push('\n');
            writer.write_all(reply.as_bytes())?;
            writer.flush()?;
        }
        Ok(())
    }

    fn handle_line(&self, line: &str) -> RelayResponse {
        match serde_json::from_str::<RelayRequest>(line) {
            Ok(request) => dispatch(&self.store, &request),
            Err(err) => RelayResponse::Err(WireError::from(&VaultError::InvalidInput(format!(
                "malformed relay request: {}",
                err
            )))),
        }
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

fn set_socket_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}
