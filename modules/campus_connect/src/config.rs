use std::time::Duration;

use serde::{Deserialize, Serialize};

/// `modules.campus_connect` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CampusConnectConfig {
    /// HS256 signing secret. Required; an empty secret fails module init.
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub token_ttl: Duration,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
    #[serde(default = "default_max_comment_length")]
    pub max_comment_length: usize,
    /// Admin account created at startup when its email is not taken yet.
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for CampusConnectConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl: default_token_ttl(),
            issuer: default_issuer(),
            min_password_length: default_min_password_length(),
            max_title_length: default_max_title_length(),
            max_comment_length: default_max_comment_length(),
            bootstrap_admin: None,
        }
    }
}

fn default_token_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_issuer() -> String {
    "campus-connect".to_string()
}

fn default_min_password_length() -> usize {
    6
}

fn default_max_title_length() -> usize {
    200
}

fn default_max_comment_length() -> usize {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let cfg: CampusConnectConfig =
            serde_json::from_value(json!({ "jwt_secret": "s" })).unwrap();
        assert_eq!(cfg.jwt_secret, "s");
        assert_eq!(cfg.token_ttl, Duration::from_secs(86_400));
        assert_eq!(cfg.issuer, "campus-connect");
        assert_eq!(cfg.min_password_length, 6);
        assert!(cfg.bootstrap_admin.is_none());
    }

    #[test]
    fn humantime_ttl_and_admin_section_parse() {
        let cfg: CampusConnectConfig = serde_json::from_value(json!({
            "jwt_secret": "s",
            "token_ttl": "90m",
            "bootstrap_admin": { "name": "Admin", "email": "admin@campus.local", "password": "hunter22" }
        }))
        .unwrap();
        assert_eq!(cfg.token_ttl, Duration::from_secs(90 * 60));
        assert_eq!(cfg.bootstrap_admin.unwrap().email, "admin@campus.local");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<CampusConnectConfig, _> =
            serde_json::from_value(json!({ "jwt_secret": "s", "jwt_algo": "none" }));
        assert!(res.is_err());
    }
}
