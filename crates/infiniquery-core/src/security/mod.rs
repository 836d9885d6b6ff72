//! Access control for Infiniquery.
//!
//! Every entity and attribute carries a role set. A caller is admitted when
//! the role set is unrestricted or shares at least one role with the caller.
//! Attributes additionally inherit their owning entity's restriction.
//!
//! The gate runs twice per query: once over the logical tokens before
//! compilation, and again per attribute while materializing results.

pub mod context;
pub mod error;
pub mod gate;

pub use context::CallerContext;
pub use error::{AccessDenied, SubjectKind};
pub use gate::AccessGate;
