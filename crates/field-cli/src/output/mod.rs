use field_core::AppError;
use serde::Serialize;

use crate::cli::OutputFormat;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// Serializable view of a classified failure.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub code: Option<String>,
    pub message: String,
    pub user_message: String,
    pub retry_after_secs: Option<u64>,
    pub retryable: bool,
    pub forces_logout: bool,
}

impl From<&AppError> for ErrorReport {
    fn from(error: &AppError) -> Self {
        let code = match &error.kind {
            field_core::ErrorKind::Validation { code } => code.clone(),
            _ => None,
        };
        Self {
            kind: error.kind.as_str(),
            code,
            message: error.message.clone(),
            user_message: error.user_message(),
            retry_after_secs: error.retry_after_secs(),
            retryable: error.is_retryable(),
            forces_logout: error.forces_logout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_core::ErrorKind;
    use pretty_assertions::assert_eq;

    #[derive(Serialize)]
    struct Sample {
        route: &'static str,
    }

    #[test]
    fn raw_is_single_line() {
        let rendered = render(&Sample { route: "main" }, OutputFormat::Raw).unwrap();
        assert_eq!(rendered, r#"{"route":"main"}"#);
    }

    #[test]
    fn json_is_pretty() {
        let rendered = render(&Sample { route: "auth" }, OutputFormat::Json).unwrap();
        assert_eq!(rendered, "{\n  \"route\": \"auth\"\n}");
    }

    #[test]
    fn error_report_carries_retry_timing() {
        let error = AppError::new(
            ErrorKind::RateLimited {
                retry_after_secs: Some(30),
            },
            "slow down",
        );
        let report = ErrorReport::from(&error);
        assert_eq!(report.retry_after_secs, Some(30));
        assert!(report.retryable);
        assert!(!report.forces_logout);
        assert!(report.user_message.contains("30"));
    }

    #[test]
    fn error_report_keeps_conflict_code() {
        let error = AppError::validation(Some("409".into()), "Visit already closed");
        let report = ErrorReport::from(&error);
        assert_eq!(report.code.as_deref(), Some("409"));
        assert_eq!(report.user_message, "Visit already closed");
    }
}
