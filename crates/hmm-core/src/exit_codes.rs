//! Exit codes for the hmm-core CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/input errors (fixable by changing arguments or the model)
//! - 20-29: Internal errors

use hmm_common::Error;

/// Exit codes for hmm-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Clean = 0,

    /// Invalid arguments or step script.
    ArgsError = 10,

    /// Model missing, unreadable as a definition, or invalid.
    ConfigError = 11,

    /// A state, action, or perception outside the model.
    DomainError = 12,

    /// Observation with zero likelihood under the current belief.
    DegenerateError = 13,

    /// Internal error (bug - please report).
    InternalError = 20,

    /// I/O error.
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Codes 10-19.
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Codes 20-29.
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::DomainError => "ERR_DOMAIN",
            ExitCode::DegenerateError => "ERR_DEGENERATE",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidStep(_) => ExitCode::ArgsError,
            Error::Config(_) | Error::InvalidModel(_) | Error::DuplicateId { .. } => {
                ExitCode::ConfigError
            }
            Error::Domain { .. } => ExitCode::DomainError,
            Error::DegenerateDistribution { .. } => ExitCode::DegenerateError,
            Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmm_common::DomainKind;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::ConfigError.as_i32(), 11);
        assert_eq!(ExitCode::DomainError.as_i32(), 12);
        assert_eq!(ExitCode::DegenerateError.as_i32(), 13);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
        assert_eq!(ExitCode::IoError.as_i32(), 21);
    }

    #[test]
    fn error_mapping() {
        assert_eq!(
            ExitCode::from(&Error::domain(DomainKind::Perception, "Hat")),
            ExitCode::DomainError
        );
        assert_eq!(
            ExitCode::from(&Error::DegenerateDistribution { total: 0.0 }),
            ExitCode::DegenerateError
        );
        assert_eq!(
            ExitCode::from(&Error::InvalidStep("x".into())),
            ExitCode::ArgsError
        );
        assert_eq!(
            ExitCode::from(&Error::InvalidModel("x".into())),
            ExitCode::ConfigError
        );
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(ExitCode::from(&io), ExitCode::IoError);
    }

    #[test]
    fn ranges() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::DomainError.is_user_error());
        assert!(!ExitCode::IoError.is_user_error());
        assert!(ExitCode::IoError.is_internal_error());
        assert_eq!(ExitCode::DomainError.to_string(), "ERR_DOMAIN (12)");
    }
}
