//! Interface name validation.

/// Size of the kernel's interface name buffer, NUL included.
pub const IFNAMSIZ: usize = 16;

/// Error type for interface name checks.
#[derive(Debug, thiserror::Error)]
pub enum IfError {
    #[error("invalid interface name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, IfError>;

/// Check a name against the kernel's `dev_valid_name` rules.
pub fn validate(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("empty")
    } else if name.len() >= IFNAMSIZ {
        Some("too long")
    } else if matches!(name, "." | "..") {
        Some("reserved")
    } else if name
        .chars()
        .any(|c| c == '/' || c == ':' || c == '\0' || c.is_whitespace())
    {
        Some("forbidden character")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(IfError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        for good in ["eth0", "lo", "ib0.8001", "br-lan", "abcdefghijklmno"] {
            assert!(validate(good).is_ok(), "{:?}", good);
        }
        for bad in ["", "abcdefghijklmnop", "eth/0", "eth0:1", "eth 0", ".."] {
            assert!(validate(bad).is_err(), "{:?}", bad);
        }
    }

    #[test]
    fn test_error_message() {
        let err = validate("eth/0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid interface name \"eth/0\": forbidden character"
        );
    }
}
