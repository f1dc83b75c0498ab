//! Field extraction cascades - normalized bundle plus ordered pure
//! strategies for credit limit and account-open date.

mod bundle;
mod limit;
mod open_date;


// Re-export the public interface
pub use bundle::AccountBundle;
pub use limit::{extract_credit_limit, ExtractionOutcome};
pub use open_date::{extract_open_date, OpenDateInputs};
