//! Error types for the types library

use thiserror::Error;

/// Address parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid hex in address: {input}")]
    InvalidHex { input: String },

    #[error("Invalid address length: expected 20 bytes, got {len}")]
    InvalidLength { len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_error_display() {
        let err = AddressError::InvalidLength { len: 3 };
        assert_eq!(
            err.to_string(),
            "Invalid address length: expected 20 bytes, got 3"
        );
    }
}
