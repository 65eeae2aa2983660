//! Row-level CRUD over the redb tables, scoped by owner id.
//!
//! Every function here is synchronous and runs a single redb transaction;
//! async callers go through [`run_blocking`].

pub mod budget_limits;
pub mod expenses;
pub mod profiles;

use redb::{Database, ReadableTable, Table};

use crate::db::{decode, encode, Db};
use crate::error::Result;

/// Run a database closure on the blocking thread pool
pub async fn run_blocking<T, F>(db: &Db, f: F) -> Result<T>
where
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db)).await?
}

/// Read a per-user id index (USER_EXPENSES, USER_BUDGET_LIMITS)
fn read_ids<T>(index: &T, user_id: &str) -> Result<Vec<String>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    match index.get(user_id)? {
        Some(bytes) => decode(bytes.value()),
        None => Ok(Vec::new()),
    }
}

fn push_id(
    index: &mut Table<'_, &'static str, &'static [u8]>,
    user_id: &str,
    id: &str,
) -> Result<()> {
    let mut ids = read_ids(&*index, user_id)?;
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
        let bytes = encode(&ids)?;
        index.insert(user_id, bytes.as_slice())?;
    }
    Ok(())
}

fn remove_id(
    index: &mut Table<'_, &'static str, &'static [u8]>,
    user_id: &str,
    id: &str,
) -> Result<()> {
    let mut ids = read_ids(&*index, user_id)?;
    ids.retain(|existing| existing != id);
    if ids.is_empty() {
        index.remove(user_id)?;
    } else {
        let bytes = encode(&ids)?;
        index.insert(user_id, bytes.as_slice())?;
    }
    Ok(())
}
