pub mod category;
pub mod period;
pub mod report;
pub mod transaction;

pub use category::{Category, CategoryMatch, FALLBACK_CATEGORY};
pub use period::DateRange;
pub use report::{BalanceImpact, DuplicateMatch, Field, TransactionStats, ValidationError};
pub use transaction::{
    CandidateTransaction, ExistingTransaction, TransactionType, DESCRIPTION_PLACEHOLDER,
    INVALID_DATE,
};
