//! Conversion between the two representations of backend options.
//!
//! Files carry TTLs as strings because that is what the enable endpoint
//! accepts; the live mount table reports them as integer seconds. Comparing
//! desired against live therefore goes through [`to_output`] first. The
//! parsing here is not the service's own, but `humantime` accepts the same
//! `1h`/`5m30s` forms, and bare second counts pass through verbatim.

use crate::config::{AuthConfigInput, AuthConfigOutput};
use crate::error::{Error, Result};

/// Convert the string-typed input shape to the integer-typed output shape.
///
/// Empty TTL strings mean "unset" and map to 0. Any other unparsable TTL is
/// an error naming the field and the offending value.
pub fn to_output(input: &AuthConfigInput) -> Result<AuthConfigOutput> {
    Ok(AuthConfigOutput {
        default_lease_ttl: ttl_seconds("default_lease_ttl", &input.default_lease_ttl)?,
        max_lease_ttl: ttl_seconds("max_lease_ttl", &input.max_lease_ttl)?,
        plugin_name: input.plugin_name.clone(),
        audit_non_hmac_request_keys: input.audit_non_hmac_request_keys.clone(),
        audit_non_hmac_response_keys: input.audit_non_hmac_response_keys.clone(),
        passthrough_request_headers: input.passthrough_request_headers.clone(),
        listing_visibility: input.listing_visibility.clone(),
    })
}

/// Convert the output shape back to the input shape. Total: integer seconds
/// are always valid TTL strings. Not a parsing inverse ("90m" comes back as
/// "5400").
pub fn to_input(output: &AuthConfigOutput) -> AuthConfigInput {
    AuthConfigInput {
        default_lease_ttl: output.default_lease_ttl.to_string(),
        max_lease_ttl: output.max_lease_ttl.to_string(),
        plugin_name: output.plugin_name.clone(),
        audit_non_hmac_request_keys: output.audit_non_hmac_request_keys.clone(),
        audit_non_hmac_response_keys: output.audit_non_hmac_response_keys.clone(),
        passthrough_request_headers: output.passthrough_request_headers.clone(),
        listing_visibility: output.listing_visibility.clone(),
    }
}

fn ttl_seconds(field: &'static str, value: &str) -> Result<u64> {
    if value.is_empty() {
        return Ok(0);
    }
    // Bare digits are already seconds; the service accepts them as-is.
    if let Ok(secs) = value.parse::<u64>() {
        return Ok(secs);
    }
    match humantime::parse_duration(value) {
        Ok(duration) => Ok(duration.as_secs()),
        Err(source) => Err(Error::InvalidDuration {
            field,
            value: value.to_string(),
            source,
        }),
    }
}
