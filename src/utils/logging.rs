//! Structured Logging with Sensitive Data Redaction
//!
//! All log lines go to stderr so stdout stays reserved for results.
//! Fields are redacted by key name:
//! - Private keys are never printed
//! - Addresses keep a short prefix and suffix
//! - Hashes and signatures keep a short prefix and suffix

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable or disable debug lines
pub fn set_debug(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// How a field value is shown in the log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Redaction {
    Full,
    Address,
    Hash,
    Plain,
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, redacted according to its key
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        let shown = match classify_key(key) {
            Redaction::Full => redact_value(&value),
            Redaction::Address => redact_address(&value),
            Redaction::Hash => redact_hash(&value),
            Redaction::Plain => value,
        };
        self.fields.push((key, shown));
        self
    }

    /// Render the line without the timestamp prefix
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        if !self.fields.is_empty() {
            let fields = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ");
            line.push_str(" | ");
            line.push_str(&fields);
        }
        line
    }

    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

fn classify_key(key: &str) -> Redaction {
    let key = key.to_lowercase();

    const SECRET_KEYS: [&str; 6] = ["private", "secret", "key_hex", "signing_key", "password", "seed"];
    if SECRET_KEYS.iter().any(|k| key.contains(k)) {
        return Redaction::Full;
    }

    const ADDRESS_KEYS: [&str; 6] = ["address", "owner", "spender", "signer", "contract", "token"];
    if ADDRESS_KEYS.iter().any(|k| key.contains(k)) {
        return Redaction::Address;
    }

    const HASH_KEYS: [&str; 4] = ["hash", "digest", "separator", "signature"];
    if HASH_KEYS.iter().any(|k| key.contains(k)) {
        return Redaction::Hash;
    }

    Redaction::Plain
}

fn redact_value(value: &str) -> String {
    if value.is_empty() {
        return "[EMPTY]".to_string();
    }

    if value.len() <= 4 {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED:{}chars]", value.len())
    }
}

/// Show the first 6 and last 4 hex chars of an address
fn redact_address(address: &str) -> String {
    let trimmed = address.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 8 } else { 6 };
    let suffix_len = 4;

    if trimmed.len() <= prefix_len + suffix_len + 3 {
        return redact_value(trimmed);
    }

    format!(
        "{}...{}",
        &trimmed[..prefix_len],
        &trimmed[trimmed.len() - suffix_len..]
    )
}

/// Show the first 10 and last 6 hex chars of a hash
fn redact_hash(hash: &str) -> String {
    let trimmed = hash.trim();

    if trimmed.len() <= 20 {
        return trimmed.to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 12 } else { 10 };
    let suffix_len = 6;

    format!(
        "{}...{}",
        &trimmed[..prefix_len],
        &trimmed[trimmed.len() - suffix_len..]
    )
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log_at!(Debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log_at!(Info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log_at!(Warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log_at!(Error, $($arg)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_value() {
        assert_eq!(redact_value(""), "[EMPTY]");
        assert_eq!(redact_value("abc"), "[REDACTED]");
        assert_eq!(redact_value("secret_key_12345"), "[REDACTED:16chars]");
    }

    #[test]
    fn test_redact_address() {
        let redacted = redact_address("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        assert_eq!(redacted, "0xd8dA6B...6045");
    }

    #[test]
    fn test_redact_hash() {
        let hash = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        assert_eq!(redact_hash(hash), "0x1234567890...abcdef");
        assert_eq!(redact_hash("0x00"), "0x00");
    }

    #[test]
    fn test_classify_key() {
        assert_eq!(classify_key("private_key"), Redaction::Full);
        assert_eq!(classify_key("owner"), Redaction::Address);
        assert_eq!(classify_key("verifying_contract"), Redaction::Address);
        assert_eq!(classify_key("digest"), Redaction::Hash);
        assert_eq!(classify_key("nonce"), Redaction::Plain);
    }

    #[test]
    fn test_log_entry_never_shows_private_key() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let entry = LogEntry::new(LogLevel::Info, "permit", "Signing permit")
            .field("private_key", key)
            .field("spender", "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")
            .field("nonce", 7);

        let line = entry.render();
        assert!(!line.contains(key));
        assert!(line.contains("private_key=[REDACTED:64chars]"));
        assert!(line.contains("spender=0xd8dA6B...6045"));
        assert!(line.ends_with("nonce=7"));
        assert!(line.starts_with("INFO [permit] Signing permit | "));
    }
}
