//! Idempotency primitives for mutating requests.
//!
//! - [`IdempotencyKey`]: validated token sent by clients in the
//!   `Idempotency-Key` HTTP header.
//! - [`IdempotencyConfig`]: how long a consumed key rejects replays.
//! - [`IdempotencyGuard`]: runs a delegate at most once per key.

mod config;
mod guard;
mod key;

pub use config::IdempotencyConfig;
pub use guard::{IDEMPOTENCY_KEY_REPLAYED, IdempotencyGuard};
pub use key::{IdempotencyKey, IdempotencyKeyValidationError, MAX_IDEMPOTENCY_KEY_LEN};

#[cfg(test)]
mod tests;
