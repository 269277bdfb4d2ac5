pub mod decimal;
pub mod error;
pub mod mortgage;
pub mod rules;
pub mod types;

#[cfg(feature = "transfer_tax")]
pub mod tax;

#[cfg(feature = "insurance")]
pub mod insurance;

#[cfg(feature = "heloc")]
pub mod heloc;

#[cfg(feature = "stress_test")]
pub mod stress;

#[cfg(feature = "brrrr")]
pub mod brrrr;

pub use error::PlexError;
pub use rules::RuleSet;
pub use types::*;

/// Standard result type for all engine operations
pub type PlexResult<T> = Result<T, PlexError>;
