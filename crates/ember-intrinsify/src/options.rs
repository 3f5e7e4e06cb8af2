// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Intrinsification settings.

/// Settings shared by the pass and the adaptive engine that drives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrinsifyOptions {
    /// Global switch. Constructing the pass while this is off is a bug.
    pub intrinsify_builtin_calls: bool,
    /// Executions of a call site before the engine tries the pass on it.
    pub hot_call_threshold: u32,
    /// Print the report line for each transformation to stdout.
    pub trace: bool,
}

impl Default for IntrinsifyOptions {
    fn default() -> Self {
        Self {
            intrinsify_builtin_calls: true,
            hot_call_threshold: 2,
            trace: true,
        }
    }
}

impl IntrinsifyOptions {
    /// Defaults overridden by `EMBER_INTRINSIFY`, `EMBER_HOT_THRESHOLD` and
    /// `EMBER_TRACE`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut opts = Self::default();
        if let Some(v) = get("EMBER_INTRINSIFY") {
            opts.intrinsify_builtin_calls = parse_flag(&v).unwrap_or(opts.intrinsify_builtin_calls);
        }
        if let Some(v) = get("EMBER_HOT_THRESHOLD") {
            match v.trim().parse::<u32>() {
                Ok(n) if n > 0 => opts.hot_call_threshold = n,
                _ => tracing::warn!(value = %v, "ignoring invalid EMBER_HOT_THRESHOLD"),
            }
        }
        if let Some(v) = get("EMBER_TRACE") {
            opts.trace = parse_flag(&v).unwrap_or(opts.trace);
        }
        opts
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        other => {
            tracing::warn!(value = other, "ignoring unrecognised boolean setting");
            None
        }
    }
}
