use serde::Serialize;

/// Keep only the last four characters of `value` visible.
pub fn mask_tail(value: &str) -> String {
    let len = value.chars().count();
    if len > 4 {
        "*".repeat(len - 4) + &value.chars().skip(len - 4).collect::<String>()
    } else {
        value.to_string()
    }
}

/// Keep only the first `visible` characters of `value`, e.g. `abcdefgh...`
pub fn prefix(value: &str, visible: usize) -> String {
    match value.char_indices().nth(visible) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

/// Return true if a key name likely holds a phone number.
fn is_phone_key(key: &str) -> bool {
    let k = key.to_lowercase();
    k.contains("phone") || k.contains("mobile")
}

/// Return true if a key name likely holds a secret or a checksum.
fn is_secret_key(key: &str) -> bool {
    let k = key.to_lowercase();
    k.contains("salt") || k.contains("secret") || k.contains("verify") || k.contains("checksum")
}

pub fn secure_serializable(v: impl Serialize) -> serde_json::Value {
    match serde_json::to_value(v) {
        Ok(value) => secure_value(&value),
        Err(_) => serde_json::Value::Null,
    }
}

pub fn secure_value(v: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match v {
        Value::Object(map) => {
            let mut new = serde_json::Map::with_capacity(map.len());
            for (k, val) in map {
                let new_val = match val {
                    Value::String(s) if is_secret_key(k) => Value::String(prefix(s, 8)),
                    Value::String(s) if is_phone_key(k) => Value::String(mask_tail(s)),
                    Value::Number(n) if is_phone_key(k) => {
                        Value::String(mask_tail(&n.to_string()))
                    }
                    _ => secure_value(val),
                };
                new.insert(k.clone(), new_val);
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(secure_value).collect()),
        other => other.clone(),
    }
}
