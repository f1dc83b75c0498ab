//! Institution classification - policy table and lookup.

mod policy;

pub use policy::{classify, InstitutionPolicy, DEFAULT_POLICY};
