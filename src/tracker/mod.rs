//! Application core: the expense book a client drives, with local-only
//! storage for anonymous sessions and remote storage once signed in.

pub mod book;
pub mod local;
pub mod remote;

pub use book::ExpenseBook;
pub use local::LocalStorage;
pub use remote::{DbApi, RemoteApi};

use thiserror::Error;

use crate::error::AppError;

/// A failed expense book operation, carrying the message to show the user
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TrackerError {
    pub message: String,
    #[source]
    pub source: Option<AppError>,
}

impl TrackerError {
    pub fn new(message: impl Into<String>, source: Option<AppError>) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }
}
