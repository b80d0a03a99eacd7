use serde::{Deserialize, Serialize};

/// Payload of one desired-state file: the options passed to the enable call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnableAuthOptions {
    #[serde(rename = "type")]
    pub auth_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: AuthConfigInput,
}

/// Backend tuning options as written in configuration files. The service
/// accepts TTLs as strings here ("1h", "5400", or "" for unset), which is
/// why this shape is not directly comparable to [`AuthConfigOutput`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfigInput {
    #[serde(default)]
    pub default_lease_ttl: String,
    #[serde(default)]
    pub max_lease_ttl: String,
    #[serde(default)]
    pub plugin_name: String,
    #[serde(default)]
    pub audit_non_hmac_request_keys: Vec<String>,
    #[serde(default)]
    pub audit_non_hmac_response_keys: Vec<String>,
    #[serde(default)]
    pub passthrough_request_headers: Vec<String>,
    #[serde(default)]
    pub listing_visibility: String,
}

/// The same options as reported back by the service: TTLs are whole seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfigOutput {
    #[serde(default)]
    pub default_lease_ttl: u64,
    #[serde(default)]
    pub max_lease_ttl: u64,
    #[serde(default)]
    pub plugin_name: String,
    #[serde(default)]
    pub audit_non_hmac_request_keys: Vec<String>,
    #[serde(default)]
    pub audit_non_hmac_response_keys: Vec<String>,
    #[serde(default)]
    pub passthrough_request_headers: Vec<String>,
    #[serde(default)]
    pub listing_visibility: String,
}

/// One entry of the live mount table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthMount {
    #[serde(rename = "type")]
    pub auth_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: AuthConfigOutput,
}

/// A mount declared by the configuration tree, keyed by the file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredMount {
    pub path: String,
    pub options: EnableAuthOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_options_parse_from_json() {
        let raw = r#"{
            "type": "approle",
            "config": {
                "default_lease_ttl": "1h",
                "max_lease_ttl": "24h",
                "listing_visibility": "unauth"
            }
        }"#;
        let opts: EnableAuthOptions = serde_json::from_str(raw).unwrap();
        assert_eq!(opts.auth_type, "approle");
        assert_eq!(opts.config.default_lease_ttl, "1h");
        assert_eq!(opts.config.listing_visibility, "unauth");
        assert!(opts.config.plugin_name.is_empty());
    }

    #[test]
    fn auth_mount_parses_service_shape() {
        let raw = r#"{
            "type": "token",
            "description": "token based credentials",
            "config": {"default_lease_ttl": 0, "max_lease_ttl": 0}
        }"#;
        let mount: AuthMount = serde_json::from_str(raw).unwrap();
        assert_eq!(mount.auth_type, "token");
        assert_eq!(mount.config.max_lease_ttl, 0);
    }
}
