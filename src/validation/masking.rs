use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub const REDACTED: &str = "[REDACTED]";

/// Redacts secret values before a body or header map is logged.
///
/// A key is secret when its lower-cased name contains one of the configured
/// markers, so `Authorization`, `password` and `accessToken` are all hidden.
#[derive(Debug, Clone)]
pub struct SecretMasker {
    markers: Vec<String>,
}

impl Default for SecretMasker {
    fn default() -> Self {
        Self {
            markers: vec![
                "password".to_string(),
                "authorization".to_string(),
                "token".to_string(),
            ],
        }
    }
}

impl SecretMasker {
    pub fn with_marker(mut self, marker: &str) -> Self {
        self.markers.push(marker.to_ascii_lowercase());
        self
    }

    fn is_secret(&self, key: &str) -> bool {
        let key = key.to_ascii_lowercase();
        self.markers.iter().any(|m| key.contains(m.as_str()))
    }

    pub fn mask(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        let v = if self.is_secret(k) {
                            Value::String(REDACTED.to_string())
                        } else {
                            self.mask(v)
                        };
                        (k.clone(), v)
                    })
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.mask(v)).collect()),
            other => other.clone(),
        }
    }

    /// Sorted copy of the headers with secret values replaced.
    pub fn mask_headers(&self, headers: &HashMap<String, String>) -> BTreeMap<String, String> {
        headers
            .iter()
            .map(|(k, v)| {
                let v = if self.is_secret(k) { REDACTED.to_string() } else { v.clone() };
                (k.clone(), v)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_nested_secrets() {
        let masked = SecretMasker::default().mask(&json!({
            "username": "admin",
            "Password": "hunter2",
            "sessions": [{"accessToken": "abc", "id": 1}]
        }));

        assert_eq!(masked["username"], "admin");
        assert_eq!(masked["Password"], REDACTED);
        assert_eq!(masked["sessions"][0]["accessToken"], REDACTED);
        assert_eq!(masked["sessions"][0]["id"], 1);
        assert!(!masked.to_string().contains("hunter2"));
    }

    #[test]
    fn masks_authorization_header() {
        let headers = HashMap::from([
            ("authorization".to_string(), "Bearer xyz".to_string()),
            ("content-type".to_string(), "application/json".to_string()),
        ]);
        let masked = SecretMasker::default().mask_headers(&headers);
        assert_eq!(masked["authorization"], REDACTED);
        assert_eq!(masked["content-type"], "application/json");
    }
}
