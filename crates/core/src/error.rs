use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount overflows 256 bits")]
    AmountOverflow,

    #[error("Amount has {scale} fractional digits but the token supports {decimals}")]
    ExcessPrecision { scale: u32, decimals: u32 },

    #[error("Invalid hash: {0}")]
    InvalidHash(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_address() {
        let err = CoreError::InvalidAddress("0x12".to_string());
        assert_eq!(err.to_string(), "Invalid address: 0x12");
    }

    #[test]
    fn test_error_display_excess_precision() {
        let err = CoreError::ExcessPrecision { scale: 7, decimals: 6 };
        assert_eq!(
            err.to_string(),
            "Amount has 7 fractional digits but the token supports 6"
        );
    }

    #[test]
    fn test_error_display_overflow() {
        assert_eq!(CoreError::AmountOverflow.to_string(), "Amount overflows 256 bits");
    }
}
