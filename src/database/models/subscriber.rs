//! Subscriber document stored in MongoDB.

use serde::{Deserialize, Serialize};

/// A user eligible to receive broadcasts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscriber {
    /// Telegram user ID.
    pub user_id: i64,
    /// Display name at enrollment time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unix timestamp of enrollment.
    pub joined_at: i64,
}

impl Subscriber {
    pub fn new(user_id: u64, name: Option<&str>) -> Self {
        Self {
            user_id: user_id as i64,
            name: name.map(str::to_owned),
            joined_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_skips_missing_name() {
        let sub = Subscriber::new(99, None);
        let json = serde_json::to_value(&sub).unwrap();

        assert_eq!(json["user_id"], 99);
        assert!(json.get("name").is_none());
        assert!(json["joined_at"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_new_keeps_name() {
        let sub = Subscriber::new(7_000_000_000, Some("Ann Lee"));
        assert_eq!(sub.user_id, 7_000_000_000);
        assert_eq!(sub.name.as_deref(), Some("Ann Lee"));
    }
}
