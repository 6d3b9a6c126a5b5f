//! Macro for implementing Display and FromStr for status enums
//!
//! Persistence and logging both need stable string forms for the small
//! status enums (repeat units, statistic kinds). This macro provides one
//! implementation for both traits with case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use chime_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum RingState {
//!     Idle,
//!     Ringing,
//! }
//!
//! impl_domain_status_conversions!(RingState {
//!     Idle => "idle",
//!     Ringing => "ringing",
//! });
//! ```

/// Implements Display and FromStr traits for status enums
///
/// Generated behaviour:
/// - Display: converts enum variants to their lowercase strings
/// - FromStr: parses case-insensitive strings back to variants, with a
///   descriptive error naming the enum on mismatch
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, "{}", $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::ChimeError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    other => Err($crate::ChimeError::InvalidInput(format!(
                        "Unknown {} value: {}",
                        stringify!($enum_name),
                        other
                    ))),
                }
            }
        }
    };
}
