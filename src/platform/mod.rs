//! Platform abstraction layer
//!
//! The only thing the core needs from the platform is a millisecond clock,
//! which hosts read here and pass in.

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> u64 {
    js_sys::Date::now().max(0.0) as u64
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Seed for a new session when the caller does not supply one
#[cfg(target_arch = "wasm32")]
pub fn random_seed() -> u64 {
    let mut bytes = [0u8; 8];
    if let Err(e) = getrandom::fill(&mut bytes) {
        log::warn!("getrandom failed ({}), seeding from the clock", e);
        return now_ms();
    }
    u64::from_le_bytes(bytes)
}

/// Seed for a new session when the caller does not supply one
#[cfg(not(target_arch = "wasm32"))]
pub fn random_seed() -> u64 {
    rand::random()
}
