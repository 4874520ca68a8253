pub mod crypto;
pub mod error;
pub mod paths;
pub mod project;
pub mod relocate;

pub use crypto::SecurityKey;
pub use relocate::{KeySource, RelocationSummary, Relocator};
