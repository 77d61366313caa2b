//! `${VAR}` and `${VAR:-default}` expansion for string settings.

use crate::ConfigError;

/// Expand environment variable references in a configuration value.
///
/// `${VAR}` requires VAR to be set; `${VAR:-default}` falls back to the
/// default. Values without `${` are returned as-is, so a bare `$` in a path or
/// URL is never touched.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    if let Some(var) = required_vars(value).find(|var| std::env::var(var).is_err()) {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{var}}} not set"),
        });
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, std::env::VarError> {
        Ok(std::env::var(var).ok())
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|err| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}}: {}", err.var_name, err.cause),
    })
}

/// Names of `${VAR}` references that carry no default.
fn required_vars(value: &str) -> impl Iterator<Item = &str> {
    value.split("${").skip(1).filter_map(|rest| {
        let body = &rest[..rest.find('}')?];
        (!body.contains(":-")).then_some(body)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_vars() {
        let vars: Vec<_> = required_vars("${A}/${B:-x}/${C}").collect();
        assert_eq!(vars, ["A", "C"]);
    }

    #[test]
    fn test_expand_set_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("FOLIO_TEST_ASSETS", "https://cdn.example.com");
        }
        let result = expand_env("${FOLIO_TEST_ASSETS}/emoji/", "emoji.image_root").unwrap();
        assert_eq!(result, "https://cdn.example.com/emoji/");
        unsafe {
            std::env::remove_var("FOLIO_TEST_ASSETS");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FOLIO_TEST_UNSET_ROOT");
        }
        let result = expand_env("${FOLIO_TEST_UNSET_ROOT:-/issues/}", "issues.root").unwrap();
        assert_eq!(result, "/issues/");
    }

    #[test]
    fn test_expand_missing_var_is_an_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FOLIO_TEST_MISSING");
        }
        let err = expand_env("${FOLIO_TEST_MISSING}", "issues.root").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("FOLIO_TEST_MISSING"));
        assert!(err.to_string().contains("issues.root"));
    }

    #[test]
    fn test_plain_values_are_untouched() {
        assert_eq!(expand_env("/img/", "emoji.image_root").unwrap(), "/img/");
        assert_eq!(expand_env("/a/$b", "emoji.image_root").unwrap(), "/a/$b");
    }
}
