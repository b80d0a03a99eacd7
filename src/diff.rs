use crate::config::{AuthConfigInput, AuthConfigOutput};
use crate::error::Result;
use crate::normalize;

/// Returns true when the desired options are already reflected in the live
/// config. Exact equality across every field; a live mount with extra or
/// missing settings is "not applied" and will be re-enabled.
///
/// The comparison is spelled out field by field rather than derived so the
/// contract stays auditable: adding a field to the config shapes without
/// updating this function is a compile error.
pub fn is_applied(desired: &AuthConfigInput, live: &AuthConfigOutput) -> Result<bool> {
    let desired = normalize::to_output(desired)?;
    let AuthConfigOutput {
        default_lease_ttl,
        max_lease_ttl,
        plugin_name,
        audit_non_hmac_request_keys,
        audit_non_hmac_response_keys,
        passthrough_request_headers,
        listing_visibility,
    } = &desired;

    Ok(default_lease_ttl == &live.default_lease_ttl
        && max_lease_ttl == &live.max_lease_ttl
        && plugin_name == &live.plugin_name
        && audit_non_hmac_request_keys == &live.audit_non_hmac_request_keys
        && audit_non_hmac_response_keys == &live.audit_non_hmac_response_keys
        && passthrough_request_headers == &live.passthrough_request_headers
        && listing_visibility == &live.listing_visibility)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired() -> AuthConfigInput {
        AuthConfigInput {
            default_lease_ttl: "1h".into(),
            max_lease_ttl: "24h".into(),
            listing_visibility: "unauth".into(),
            ..Default::default()
        }
    }

    fn live() -> AuthConfigOutput {
        AuthConfigOutput {
            default_lease_ttl: 3600,
            max_lease_ttl: 86400,
            listing_visibility: "unauth".into(),
            ..Default::default()
        }
    }

    #[test]
    fn equal_configs_are_applied() {
        assert!(is_applied(&desired(), &live()).unwrap());
    }

    #[test]
    fn ttl_mismatch_is_not_applied() {
        let mut live = live();
        live.default_lease_ttl = 1800;
        assert!(!is_applied(&desired(), &live).unwrap());
    }

    #[test]
    fn header_list_mismatch_is_not_applied() {
        let mut live = live();
        live.passthrough_request_headers = vec!["X-Request-Id".into()];
        assert!(!is_applied(&desired(), &live).unwrap());
    }

    #[test]
    fn unset_ttl_matches_zero() {
        let mut desired = desired();
        desired.default_lease_ttl = String::new();
        let mut live = live();
        live.default_lease_ttl = 0;
        assert!(is_applied(&desired, &live).unwrap());
    }

    #[test]
    fn unparsable_desired_ttl_is_an_error() {
        let mut desired = desired();
        desired.max_lease_ttl = "soon".into();
        assert!(is_applied(&desired, &live()).is_err());
    }
}
