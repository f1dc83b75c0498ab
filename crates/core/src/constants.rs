/// Longest history a restricted-history institution will return, in days.
pub const MAX_RESTRICTED_HISTORY_DAYS: i64 = 90;

/// Default chunk size for standard institutions, in days.
pub const DEFAULT_CHUNK_DAYS: i64 = 90;

/// Maximum lookback for a first full-history fetch, in months.
pub const DEFAULT_LOOKBACK_MONTHS: u32 = 24;

/// Overlap added before the last successful sync when computing an
/// incremental fetch window, in days. Covers late-posting transactions.
pub const SYNC_OVERLAP_DAYS: i64 = 7;

/// Transactions with an absolute amount above this are treated as malformed.
pub const AMOUNT_SANITY_CEILING: i64 = 1_000_000;

/// Margin subtracted from the earliest known transaction when estimating an
/// open date from observed activity, in days.
pub const OPEN_DATE_TRANSACTION_MARGIN_DAYS: i64 = 21;

/// An existing stored open date is preserved only if it is no older than
/// this, in months.
pub const OPEN_DATE_PLAUSIBILITY_MONTHS: u32 = 24;

/// An open date may precede the earliest known transaction by at most this
/// many days.
pub const OPEN_DATE_MAX_DAYS_BEFORE_FIRST_TRANSACTION: i64 = 45;

/// Ultimate open-date fallback when no transactions exist yet, in months.
pub const OPEN_DATE_DEFAULT_LOOKBACK_MONTHS: u32 = 12;

/// Pause between chunked transaction fetches, in milliseconds.
pub const INTER_CHUNK_DELAY_MS: u64 = 250;

/// How long a sync lease is valid before it can be reclaimed, in minutes.
pub const SYNC_LEASE_TTL_MINUTES: i64 = 10;
