//! Password-reset tokens

use chrono::Duration;
use rand::RngCore;

/// How long a reset token stays valid after it is issued
pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

/// 32 random bytes, hex encoded
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
