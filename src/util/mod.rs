use chrono::{DateTime, Utc};

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn now_ms() -> i64 {
    now().timestamp_millis()
}

/// Random bits for provisional ids. Falls back to zero if the platform RNG is unavailable.
pub(crate) fn random_u64() -> u64 {
    let mut buf = [0u8; 8];
    if getrandom::getrandom(&mut buf).is_err() {
        return 0;
    }
    u64::from_le_bytes(buf)
}

/// Trims a user-entered title, substituting `fallback` when nothing is left.
pub(crate) fn normalize_title(raw: &str, fallback: &str) -> String {
    let t = raw.trim();
    if t.is_empty() {
        fallback.to_string()
    } else {
        t.to_string()
    }
}
