//! Institution classification.
//!
//! Some institutions cap historical transaction availability to a short
//! fixed window regardless of the requested range, and institution families
//! differ in how far a first statement trails the account-open date. Both
//! the chunked fetcher and the field-extraction cascade consult this single
//! declarative table; institution-name string checks must not appear
//! anywhere else.

use crate::constants::{DEFAULT_CHUNK_DAYS, MAX_RESTRICTED_HISTORY_DAYS};

/// Sync policy for an institution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstitutionPolicy {
    /// True when the institution caps history to
    /// [`MAX_RESTRICTED_HISTORY_DAYS`] and chunking buys nothing.
    pub restricted_history: bool,
    /// Date-range size per transactions call for standard institutions.
    pub chunk_days: i64,
    /// Months between a first statement issue date and the estimated
    /// account-open date for this family.
    pub origination_offset_months: u32,
}

/// Policy for institutions not present in the table.
pub const DEFAULT_POLICY: InstitutionPolicy = InstitutionPolicy {
    restricted_history: false,
    chunk_days: DEFAULT_CHUNK_DAYS,
    origination_offset_months: 12,
};

struct PolicyEntry {
    /// Case-insensitive tokens matched against institution and account names.
    tokens: &'static [&'static str],
    policy: InstitutionPolicy,
}

/// One row per institution family. Tokens include card-product names
/// because the institution name is missing for some items and only the
/// account name identifies the issuer.
const POLICY_TABLE: &[PolicyEntry] = &[
    PolicyEntry {
        tokens: &["american express", "amex", "platinum card", "gold card", "blue cash"],
        policy: InstitutionPolicy {
            restricted_history: true,
            chunk_days: MAX_RESTRICTED_HISTORY_DAYS,
            origination_offset_months: 6,
        },
    },
    PolicyEntry {
        tokens: &["capital one", "quicksilver", "venture", "savor"],
        policy: InstitutionPolicy {
            restricted_history: true,
            chunk_days: MAX_RESTRICTED_HISTORY_DAYS,
            origination_offset_months: 6,
        },
    },
    PolicyEntry {
        tokens: &["chase", "sapphire", "freedom unlimited"],
        policy: InstitutionPolicy {
            restricted_history: false,
            chunk_days: 90,
            origination_offset_months: 12,
        },
    },
    PolicyEntry {
        tokens: &["discover"],
        policy: InstitutionPolicy {
            restricted_history: false,
            chunk_days: 60,
            origination_offset_months: 12,
        },
    },
    PolicyEntry {
        tokens: &["citi", "citibank", "double cash"],
        policy: InstitutionPolicy {
            restricted_history: false,
            chunk_days: 60,
            origination_offset_months: 12,
        },
    },
];

/// Classify an account by institution and account name.
///
/// Matching is case-insensitive substring containment against the token
/// table; the first matching row wins. Unknown institutions get
/// [`DEFAULT_POLICY`].
pub fn classify(institution_name: &str, account_name: &str) -> &'static InstitutionPolicy {
    let haystack = format!("{} {}", institution_name, account_name).to_lowercase();

    for entry in POLICY_TABLE {
        if entry.tokens.iter().any(|t| haystack.contains(t)) {
            return &entry.policy;
        }
    }

    &DEFAULT_POLICY
}
