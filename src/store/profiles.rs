use redb::{Database, ReadableTable};

use crate::db::{decode, tables};
use crate::error::Result;
use crate::models::{Profile, ProfileRecord};

/// Look up a user's profile; `None` when the user has none
pub fn fetch_profile(db: &Database, user_id: &str) -> Result<Option<Profile>> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(tables::PROFILES)?;

    let profile = table
        .get(user_id)?
        .map(|bytes| decode::<ProfileRecord>(bytes.value()))
        .transpose()?
        .map(|record| record.into_profile(user_id.to_string()));

    Ok(profile)
}
