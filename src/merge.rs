use toml::Table;

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a Table for the same key, recurse.
/// Otherwise, `overlay`'s value wins.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_val) in overlay {
        match (base.remove(&key), overlay_val) {
            (Some(toml::Value::Table(base_tbl)), toml::Value::Table(overlay_tbl)) => {
                base.insert(key, toml::Value::Table(deep_merge(base_tbl, overlay_tbl)));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}

/// Copy every constant key of `defaults` into `target` unless `target`
/// already has it. Returns the keys that were filled, in `defaults` order.
///
/// Existing values are never replaced, so applying the same defaults twice
/// leaves `target` unchanged the second time.
pub fn fill_absent(target: &mut Table, defaults: Table) -> Vec<String> {
    let mut filled = Vec::new();
    for (key, value) in defaults {
        if !is_constant_key(&key) || target.contains_key(&key) {
            continue;
        }
        filled.push(key.clone());
        target.insert(key, value);
    }
    filled
}

/// A key looks like a constant when it has at least one uppercase letter and
/// no lowercase letter: `SECRET_KEY`, `API2_URL`. `_private`, `debug` and keys
/// made only of uncased characters do not.
pub fn is_constant_key(key: &str) -> bool {
    key.chars().any(char::is_uppercase) && !key.chars().any(char::is_lowercase)
}
