use std::fmt;

use crate::{FredError, Result};

/// A FRED API key. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Resolve the API key from the process environment.
///
/// Called once per operation, so a key changed in the environment is picked up
/// by the next call.
#[inline]
pub fn authenticate(var_name: &str) -> Result<ApiKey> {
    authenticate_with(var_name, |name| std::env::var(name).ok())
}

/// Resolve the API key through `lookup`, which maps a variable name to its value
#[inline]
pub fn authenticate_with<F>(var_name: &str, lookup: F) -> Result<ApiKey>
where
    F: FnOnce(&str) -> Option<String>,
{
    match lookup(var_name) {
        Some(value) if !value.trim().is_empty() => Ok(ApiKey(value.trim().to_string())),
        _ => Err(FredError::Config(format!(
            "{var_name} environment variable not set. Please set it to use this server."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_key_is_returned_trimmed() {
        let key = authenticate_with("FRED_API_KEY", |_| Some(" abc123 \n".to_string()))
            .expect("key should resolve");
        assert_eq!(key.expose(), "abc123");
    }

    #[test]
    fn missing_or_blank_key_is_a_configuration_error() {
        for value in [None, Some(String::new()), Some("   ".to_string())] {
            let err = authenticate_with("FRED_API_KEY", |_| value).expect_err("should fail");
            assert!(matches!(err, FredError::Config(_)));
            assert!(err.to_string().contains("FRED_API_KEY environment variable not set"));
        }
    }

    #[test]
    fn lookup_uses_configured_variable_name() {
        let key = authenticate_with("ALT_KEY", |name| {
            (name == "ALT_KEY").then(|| "from-alt".to_string())
        })
        .expect("key should resolve");
        assert_eq!(key.expose(), "from-alt");
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = ApiKey("super-secret".to_string());
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
    }

    #[test]
    fn unset_environment_variable_fails() {
        let result = authenticate("FRED_MCP_AUTH_TEST_NEVER_SET");
        assert!(matches!(result, Err(FredError::Config(_))));
    }
}
