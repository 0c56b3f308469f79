//! Compact rendering of MongoDB driver errors

use std::fmt;

/// Structured error information extracted from MongoDB driver errors.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub error_type: Option<String>,
    pub code: Option<i32>,
    pub name: Option<String>,
    pub message: Option<String>,
}

/// Render a driver error as a single line: `MongoDB <type> [<name> <code>]: <message>`.
pub fn format_mongodb_error(
    f: &mut fmt::Formatter<'_>,
    error: &mongodb::error::Error,
) -> fmt::Result {
    let info = extract_error_info(error);

    write!(f, "MongoDB")?;
    if let Some(kind) = &info.error_type {
        write!(f, " {kind}")?;
    }
    match (&info.name, info.code) {
        (Some(name), Some(code)) => write!(f, " [{name} {code}]")?,
        (None, Some(code)) => write!(f, " [{code}]")?,
        _ => {}
    }
    write!(f, ": {}", info.message.as_deref().unwrap_or("unknown error"))
}

/// Extract structured information from a MongoDB error using the driver API.
pub fn extract_error_info(error: &mongodb::error::Error) -> ErrorInfo {
    use mongodb::error::{ErrorKind, WriteFailure};

    let mut info = ErrorInfo::default();

    match error.kind.as_ref() {
        ErrorKind::Write(write_failure) => {
            info.error_type = Some("write_error".to_string());

            match write_failure {
                WriteFailure::WriteError(write_error) => {
                    info.code = Some(write_error.code);
                    info.message = Some(write_error.message.clone());
                }
                WriteFailure::WriteConcernError(wc_error) => {
                    info.code = Some(wc_error.code);
                    info.message = Some(wc_error.message.clone());
                }
                _ => {}
            }
        }
        ErrorKind::Command(command_error) => {
            info.error_type = Some("command_error".to_string());
            info.code = Some(command_error.code);
            info.message = Some(command_error.message.clone());
        }
        ErrorKind::Authentication { message, .. } => {
            info.error_type = Some("authentication_error".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::InvalidArgument { message, .. } => {
            info.error_type = Some("invalid_argument".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::ServerSelection { message, .. } => {
            info.error_type = Some("server_selection_error".to_string());
            info.message = Some(message.clone());
        }
        _ => {
            info.message = Some(error.to_string());
        }
    }

    info.name = info.code.and_then(error_name);

    info
}

/// Get a human-readable error name from a MongoDB error code.
fn error_name(code: i32) -> Option<String> {
    let name = match code {
        11000 | 11001 => "DuplicateKey",
        13 => "Unauthorized",
        18 => "AuthenticationFailed",
        26 => "NamespaceNotFound",
        50 => "MaxTimeMSExpired",
        121 => "DocumentValidationFailure",
        _ => return None,
    };

    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_name_lookup() {
        assert_eq!(error_name(11000).as_deref(), Some("DuplicateKey"));
        assert_eq!(error_name(121).as_deref(), Some("DocumentValidationFailure"));
        assert_eq!(error_name(9999), None);
    }
}
