//! Wire codec for tidepool values
//!
//! Values are stored as JSON text. JSON numbers cannot carry integers of
//! arbitrary size, so big integer leaves are written as strings made of
//! their decimal digits followed by a literal `n` (`12345678901234567890n`),
//! and such strings are read back as big integers.
//!
//! # Example
//! ```
//! use num_bigint::BigInt;
//! use tidepool_codec::{decode, encode, Value};
//!
//! let big: BigInt = "123456789012345678901234567890".parse().unwrap();
//! let value = Value::List(vec![Value::from(big.clone()), Value::from("x")]);
//!
//! let text = encode(&value).unwrap();
//! assert_eq!(text, r#"["123456789012345678901234567890n","x"]"#);
//! assert_eq!(decode(&text).unwrap(), value);
//! ```

mod codec;
mod error;
mod value;

pub use codec::{decode, decode_slice, encode, encode_to_vec, is_bigint_token, BIGINT_MARKER};
pub use error::CodecError;
pub use value::Value;

// Re-exported so callers can build big integer leaves without a direct dependency
pub use num_bigint::BigInt;
