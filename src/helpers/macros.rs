//! Helper macros used throughout the crate.

/// Macro to generate a forwarding [`From`] implementation.
///
/// Generates an `impl From<$source> for $target` that goes through an intermediate
/// `$via` type, for cases where both conversions exist but the direct one doesn't.
///
/// # Examples
///
/// ```ignore
/// use boosterdex_rs::forward_from;
///
/// forward_from!(diesel_async::pooled_connection::PoolError => PoolError => Error);
/// ```
#[macro_export]
macro_rules! forward_from {
    ( $source:ty => $via:ty => $target:ty ) => {
        impl ::std::convert::From<$source> for $target {
            /// Converts the source error into our error type, going through an
            /// intermediate conversion.
            fn from(value: $source) -> Self {
                ::std::convert::Into::<$via>::into(value).into()
            }
        }
    };
}
