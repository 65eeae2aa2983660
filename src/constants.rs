/// Maximum length of an expense description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum username length accepted at sign-up
pub const MAX_USERNAME_LEN: usize = 50;

/// Largest amount accepted for an expense or a budget limit
pub const MAX_AMOUNT: i64 = 1_000_000_000;

/// Spend percentage at which a budget is "near limit"
pub const WARNING_THRESHOLD_PERCENT: u32 = 80;

/// Spend percentage at which a budget is exceeded
pub const DANGER_THRESHOLD_PERCENT: u32 = 100;

/// Local storage key holding the serialized expense list
pub const EXPENSES_STORAGE_KEY: &str = "expenses";

/// Capacity of the auth change notification channel
pub const AUTH_EVENT_CAPACITY: usize = 16;

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_INVALID_AMOUNT: &str =
    "Amount must be a non-negative value with at most two decimal places";

pub const ERR_INVALID_LIMIT_AMOUNT: &str =
    "Budget limit must be a positive value with at most two decimal places";

pub const ERR_AMOUNT_TOO_LARGE: &str = "Amount must not exceed 1,000,000,000";

pub const ERR_DESCRIPTION_TOO_LONG: &str = "Description must be at most 500 characters";

pub const ERR_INVALID_EMAIL: &str = "Invalid email address";

pub const ERR_PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

pub const ERR_INVALID_USERNAME: &str = "Username must be between 1 and 50 characters";

// =============================================================================
// User-facing failure messages of the expense book
// =============================================================================

pub const MSG_LOAD_EXPENSES: &str = "Failed to load expenses";
pub const MSG_ADD_EXPENSE: &str = "Failed to add expense";
pub const MSG_UPDATE_EXPENSE: &str = "Failed to update expense";
pub const MSG_DELETE_EXPENSE: &str = "Failed to delete expense";
pub const MSG_LOAD_BUDGET_LIMITS: &str = "Failed to load budget limits";
pub const MSG_ADD_BUDGET_LIMIT: &str = "Failed to add budget limit";
pub const MSG_UPDATE_BUDGET_LIMIT: &str = "Failed to update budget limit";
pub const MSG_DELETE_BUDGET_LIMIT: &str = "Failed to delete budget limit";
pub const MSG_SIGN_IN_REQUIRED: &str = "Please sign in to manage budget limits";
