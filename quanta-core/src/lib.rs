//! Quanta Core - numeric representations
//!
//! This crate provides the numeric layer used throughout Quanta:
//! - `Number`: one value in `Integer`, `Float` or `Decimal` form
//! - `NumberError`: failures of numeric operations (division by zero, overflow)

mod number;

pub use number::{Number, NumberError, DECIMAL_PRECISION, MAX_DECIMAL_EXPONENT};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Number, NumberError};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_across_representations_keeps_integral_total() {
        let total = Number::from(10)
            .add(&Number::from(12.5))
            .add(&Number::from(2.5))
            .add(&Number::from(5));
        assert_eq!(total, Number::from(30));
        assert_eq!(total.to_i64(), Ok(30));
    }

    #[test]
    fn test_number_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Number>();
        assert_send_sync::<NumberError>();
    }

    #[test]
    fn test_overflow_message() {
        let err = Number::from_str("9223372036854775808").unwrap().to_i64().unwrap_err();
        assert_eq!(err.to_string(), "Overflow: 9223372036854775808 does not fit in i64");
    }
}
