pub mod clock;
pub mod config;
pub mod error;
pub mod policy;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LinkVaultConfig;
pub use error::{LinkVaultError, Result};
pub use policy::{RetentionPolicy, TierTtl};
pub use types::*;
