use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong during a reconciliation run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Could not open or read a desired-state file
    #[error("error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A desired-state file is not valid JSON for the expected shape
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A TTL string is non-empty but not a parsable duration
    #[error("could not parse {field} value {value:?} as a duration: {source}")]
    InvalidDuration {
        field: &'static str,
        value: String,
        source: humantime::DurationError,
    },

    /// A client call failed for a specific mount path
    #[error("could not {op} {path}: {source}")]
    Remote {
        op: &'static str,
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// Transport-level HTTP failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("vault returned {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    /// The service answered 200 but with a body we cannot make sense of
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Login succeeded but the response carried no client token
    #[error("no auth data returned from vault")]
    NoAuthData,

    #[error("invalid vault address: {0}")]
    Address(#[from] url::ParseError),

    /// Aggregate outcome of a best-effort run with at least one failure
    #[error("{} operation(s) failed:\n{}", .0.len(), format_failures(.0))]
    Failures(Vec<Error>),
}

fn format_failures(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_lists_each_error() {
        let err = Error::Failures(vec![
            Error::NoAuthData,
            Error::Api {
                status: reqwest::StatusCode::BAD_REQUEST,
                message: "cannot disable".into(),
            },
        ]);
        let text = err.to_string();
        assert!(text.starts_with("2 operation(s) failed:"));
        assert!(text.contains("no auth data returned from vault"));
        assert!(text.contains("400"));
    }
}
