pub mod accounts;
pub mod contacts;
pub mod error_log;
pub mod init;
pub mod keys;
pub mod misc;
pub mod passphrase;
#[cfg(unix)]
pub mod serve;
