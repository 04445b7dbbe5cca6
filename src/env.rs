use toml::{Table, Value};

use crate::merge::is_constant_key;

/// Build a `toml::Table` from environment variables matching `{PREFIX}__*`.
///
/// Everything after the `__` separator is the config key, uppercased:
/// `BLOG__SECRET_KEY` sets `SECRET_KEY`. Keys that are not constants after
/// uppercasing (e.g. `BLOG__42`) are skipped.
///
/// Values are parsed heuristically: bool > integer > float > string.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}__");
    let mut table = Table::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        let key = rest.to_uppercase();
        if !is_constant_key(&key) {
            continue;
        }
        table.insert(key, parse_env_value(&value));
    }

    table
}

/// Parse an env var value into a typed TOML value.
/// Tries: bool → integer → float → string.
pub(crate) fn parse_env_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    // Only a dotted literal is a float, so "NaN" and "inf" stay strings.
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::String(s.to_string())
}
