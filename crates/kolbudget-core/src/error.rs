use std::fmt;

/// Machine-readable error codes surfaced alongside user notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    EmptyName,
    InvalidLevel,
    StorageReadFailed,
    StorageCorrupt,
    StorageWriteFailed,
    InvalidStorageKey,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::EmptyName => "E2001",
            Self::InvalidLevel => "E2002",
            Self::StorageReadFailed => "E3001",
            Self::StorageCorrupt => "E3002",
            Self::StorageWriteFailed => "E5001",
            Self::InvalidStorageKey => "E5002",
            Self::LockContention => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and notifications.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::EmptyName => "Calculation name is empty",
            Self::InvalidLevel => "Invalid KOL level",
            Self::StorageReadFailed => "Storage read failed",
            Self::StorageCorrupt => "Stored calculations are corrupt",
            Self::StorageWriteFailed => "Storage write failed",
            Self::InvalidStorageKey => "Invalid storage key",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint for the presentation layer.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in kolbudget/config.toml and retry."),
            Self::EmptyName => Some("Provide a name for the calculation."),
            Self::InvalidLevel => Some("Give the level a name and a count of at least 1."),
            Self::StorageReadFailed => Some("Check that the data directory is readable."),
            Self::StorageCorrupt => {
                Some("The unreadable blob was kept under the `.corrupt` key for inspection.")
            }
            Self::StorageWriteFailed => Some("Check disk space and write permissions."),
            Self::InvalidStorageKey => Some("Use only letters, digits, `.`, `_` and `-` in keys."),
            Self::LockContention => Some("Retry after the other process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 9] = [
        ErrorCode::ConfigParseError,
        ErrorCode::EmptyName,
        ErrorCode::InvalidLevel,
        ErrorCode::StorageReadFailed,
        ErrorCode::StorageCorrupt,
        ErrorCode::StorageWriteFailed,
        ErrorCode::InvalidStorageKey,
        ErrorCode::LockContention,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::EmptyName.to_string(), "E2001");
    }
}
