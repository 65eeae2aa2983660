use redb::TableDefinition;

/// Users table: user_id -> UserRecord (serialized)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Email index: normalized email -> user_id
pub const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Sessions table: SHA-256 of session id -> SessionRecord (serialized)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Profiles table: user_id -> ProfileRecord (serialized)
pub const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");

/// Expenses table: expense_id -> ExpenseRecord (serialized)
pub const EXPENSES: TableDefinition<&str, &[u8]> = TableDefinition::new("expenses");

/// User expenses index: user_id -> Vec<expense_id>
pub const USER_EXPENSES: TableDefinition<&str, &[u8]> = TableDefinition::new("user_expenses");

/// Budget limits table: limit_id -> BudgetLimitRecord (serialized)
pub const BUDGET_LIMITS: TableDefinition<&str, &[u8]> = TableDefinition::new("budget_limits");

/// User budget limits index: user_id -> Vec<limit_id>
pub const USER_BUDGET_LIMITS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("user_budget_limits");
