use chrono::Utc;
use redb::{Database, ReadableTable};
use uuid::Uuid;

use crate::db::{decode, encode, tables};
use crate::error::{AppError, Result};
use crate::models::{BudgetLimit, BudgetLimitRecord, BudgetLimitUpdate, NewBudgetLimit};
use crate::store::{push_id, read_ids, remove_id};

/// Fetch all budget limits owned by a user, ordered by category then period
pub fn fetch_user_budget_limits(db: &Database, user_id: &str) -> Result<Vec<BudgetLimit>> {
    let read_txn = db.begin_read()?;
    let index = read_txn.open_table(tables::USER_BUDGET_LIMITS)?;
    let table = read_txn.open_table(tables::BUDGET_LIMITS)?;

    let mut limits = Vec::new();
    for id in read_ids(&index, user_id)? {
        if let Some(bytes) = table.get(id.as_str())? {
            let record: BudgetLimitRecord = decode(bytes.value())?;
            limits.push(record.into_budget_limit(id));
        }
    }

    limits.sort_by(|a, b| {
        a.category
            .as_str()
            .cmp(b.category.as_str())
            .then(a.period.cmp(&b.period))
    });
    Ok(limits)
}

/// Insert a budget limit, rejecting a second limit for the same category and period
pub fn add_budget_limit(
    db: &Database,
    user_id: &str,
    limit: NewBudgetLimit,
) -> Result<BudgetLimit> {
    limit
        .validate()
        .map_err(|msg| AppError::InvalidInput(msg.to_string()))?;

    let id = Uuid::new_v4().to_string();
    let record = BudgetLimitRecord {
        user_id: user_id.to_string(),
        category: limit.category,
        amount: limit.amount,
        period: limit.period,
        created_at: Utc::now().timestamp_millis(),
    };

    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(tables::BUDGET_LIMITS)?;
        let mut index = write_txn.open_table(tables::USER_BUDGET_LIMITS)?;

        ensure_slot_free(&table, &index, &record, None)?;

        let bytes = encode(&record)?;
        table.insert(id.as_str(), bytes.as_slice())?;
        push_id(&mut index, user_id, &id)?;
    }
    write_txn.commit()?;

    tracing::info!(
        "Budget limit {} added for user {}: {} {}",
        id,
        user_id,
        record.period,
        record.category
    );
    Ok(record.into_budget_limit(id))
}

/// Change the amount and period of a budget limit the user owns
pub fn update_budget_limit(
    db: &Database,
    user_id: &str,
    limit_id: &str,
    update: BudgetLimitUpdate,
) -> Result<BudgetLimit> {
    update
        .validate()
        .map_err(|msg| AppError::InvalidInput(msg.to_string()))?;

    let write_txn = db.begin_write()?;
    let record = {
        let mut table = write_txn.open_table(tables::BUDGET_LIMITS)?;
        let index = write_txn.open_table(tables::USER_BUDGET_LIMITS)?;

        let mut record = owned_record(&table, user_id, limit_id)?;
        record.amount = update.amount;
        record.period = update.period;

        ensure_slot_free(&table, &index, &record, Some(limit_id))?;

        let bytes = encode(&record)?;
        table.insert(limit_id, bytes.as_slice())?;
        record
    };
    write_txn.commit()?;

    tracing::info!("Budget limit {} updated for user {}", limit_id, user_id);
    Ok(record.into_budget_limit(limit_id.to_string()))
}

/// Delete a budget limit the user owns
pub fn delete_budget_limit(db: &Database, user_id: &str, limit_id: &str) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(tables::BUDGET_LIMITS)?;
        owned_record(&table, user_id, limit_id)?;
        table.remove(limit_id)?;

        let mut index = write_txn.open_table(tables::USER_BUDGET_LIMITS)?;
        remove_id(&mut index, user_id, limit_id)?;
    }
    write_txn.commit()?;

    tracing::info!("Budget limit {} deleted for user {}", limit_id, user_id);
    Ok(())
}

/// At most one limit per (owner, category, period)
fn ensure_slot_free<T, I>(
    table: &T,
    index: &I,
    candidate: &BudgetLimitRecord,
    ignore_id: Option<&str>,
) -> Result<()>
where
    T: ReadableTable<&'static str, &'static [u8]>,
    I: ReadableTable<&'static str, &'static [u8]>,
{
    for id in read_ids(index, &candidate.user_id)? {
        if Some(id.as_str()) == ignore_id {
            continue;
        }
        let Some(bytes) = table.get(id.as_str())? else {
            continue;
        };
        let existing: BudgetLimitRecord = decode(bytes.value())?;
        if existing.occupies(&candidate.user_id, candidate.category, candidate.period) {
            tracing::info!(
                "Rejected duplicate {} budget limit for {} (user {})",
                candidate.period,
                candidate.category,
                candidate.user_id
            );
            return Err(AppError::DuplicateBudgetLimit {
                category: candidate.category,
                period: candidate.period,
            });
        }
    }
    Ok(())
}

fn owned_record<T>(table: &T, user_id: &str, limit_id: &str) -> Result<BudgetLimitRecord>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let record: BudgetLimitRecord = table
        .get(limit_id)?
        .map(|bytes| decode(bytes.value()))
        .transpose()?
        .ok_or(AppError::BudgetLimitNotFound)?;

    if record.user_id != user_id {
        tracing::warn!("User {} attempted to access budget limit {}", user_id, limit_id);
        return Err(AppError::BudgetLimitNotFound);
    }

    Ok(record)
}
