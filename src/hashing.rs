use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Text form of a float as stored in existing hashes: shortest round-trip
/// digits, always with a fractional part, exponent form outside
/// `[1e-4, 1e16)`.
pub fn float_text(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let abs = value.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let sci = format!("{value:e}");
        let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }
    let s = value.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

/// Deduplication key: SHA-256 over `account|date|payee|amount|currency`.
pub fn tx_hash(account: &str, date: NaiveDate, payee: &str, amount: f64, currency: &str) -> String {
    let key = format!(
        "{account}|{}|{payee}|{}|{currency}",
        date.format("%Y-%m-%d"),
        float_text(amount)
    );
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
