use chrono::Utc;
use redb::{Database, ReadableTable};
use uuid::Uuid;

use crate::db::{decode, encode, tables};
use crate::error::{AppError, Result};
use crate::models::{Expense, ExpenseRecord, NewExpense};
use crate::store::{push_id, read_ids, remove_id};

/// Fetch all expenses owned by a user, newest first
pub fn fetch_user_expenses(db: &Database, user_id: &str) -> Result<Vec<Expense>> {
    let read_txn = db.begin_read()?;
    let index = read_txn.open_table(tables::USER_EXPENSES)?;
    let table = read_txn.open_table(tables::EXPENSES)?;

    let mut expenses = Vec::new();
    for id in read_ids(&index, user_id)? {
        match table.get(id.as_str())? {
            Some(bytes) => {
                let record: ExpenseRecord = decode(bytes.value())?;
                expenses.push(record.into_expense(id));
            }
            None => tracing::warn!("Expense index for {} references missing row {}", user_id, id),
        }
    }

    expenses.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(expenses)
}

/// Insert a new expense for a user and return the stored row
pub fn add_expense(db: &Database, user_id: &str, expense: NewExpense) -> Result<Expense> {
    validate(&expense)?;

    let id = Uuid::new_v4().to_string();
    let record = ExpenseRecord {
        user_id: user_id.to_string(),
        amount: expense.amount,
        category: expense.category,
        description: expense.description,
        date: expense.date,
        created_at: Utc::now().timestamp_millis(),
    };

    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(tables::EXPENSES)?;
        let bytes = encode(&record)?;
        table.insert(id.as_str(), bytes.as_slice())?;

        let mut index = write_txn.open_table(tables::USER_EXPENSES)?;
        push_id(&mut index, user_id, &id)?;
    }
    write_txn.commit()?;

    tracing::info!("Expense {} added for user {}", id, user_id);
    Ok(record.into_expense(id))
}

/// Replace the editable fields of an expense the user owns
pub fn update_expense(
    db: &Database,
    user_id: &str,
    expense_id: &str,
    fields: NewExpense,
) -> Result<Expense> {
    validate(&fields)?;

    let write_txn = db.begin_write()?;
    let record = {
        let mut table = write_txn.open_table(tables::EXPENSES)?;
        let mut record = owned_record(&table, user_id, expense_id)?;

        record.amount = fields.amount;
        record.category = fields.category;
        record.description = fields.description;
        record.date = fields.date;

        let bytes = encode(&record)?;
        table.insert(expense_id, bytes.as_slice())?;
        record
    };
    write_txn.commit()?;

    tracing::info!("Expense {} updated for user {}", expense_id, user_id);
    Ok(record.into_expense(expense_id.to_string()))
}

/// Delete an expense the user owns
pub fn delete_expense(db: &Database, user_id: &str, expense_id: &str) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(tables::EXPENSES)?;
        owned_record(&table, user_id, expense_id)?;
        table.remove(expense_id)?;

        let mut index = write_txn.open_table(tables::USER_EXPENSES)?;
        remove_id(&mut index, user_id, expense_id)?;
    }
    write_txn.commit()?;

    tracing::info!("Expense {} deleted for user {}", expense_id, user_id);
    Ok(())
}

fn validate(expense: &NewExpense) -> Result<()> {
    expense
        .validate()
        .map_err(|msg| AppError::InvalidInput(msg.to_string()))
}

/// Load a row, treating rows of other users as missing
fn owned_record<T>(table: &T, user_id: &str, expense_id: &str) -> Result<ExpenseRecord>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let record: ExpenseRecord = table
        .get(expense_id)?
        .map(|bytes| decode(bytes.value()))
        .transpose()?
        .ok_or(AppError::ExpenseNotFound)?;

    if record.user_id != user_id {
        tracing::warn!("User {} attempted to access expense {}", user_id, expense_id);
        return Err(AppError::ExpenseNotFound);
    }

    Ok(record)
}
