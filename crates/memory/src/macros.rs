//! Internal and public macros for buddy-memory

/// Reports a programmer error through [`crate::error::fatal`]
macro_rules! fatal {
    ($($arg:tt)*) => {
        $crate::error::fatal(::core::format_args!($($arg)*))
    };
}

/// Builds a non-owning [`ByteString`](crate::string::ByteString) view over a
/// string literal or byte slice
///
/// # Examples
/// ```
/// use buddy_memory::bstr;
///
/// let s = bstr!("Hello world!");
/// assert_eq!(s.len(), 12);
/// assert_eq!(s, "Hello world!");
/// ```
#[macro_export]
macro_rules! bstr {
    ($s:expr) => {
        $crate::string::ByteString::borrowed(::core::convert::AsRef::<[u8]>::as_ref($s))
    };
}

/// Builds a [`PoolConfig`](crate::allocator::pool::PoolConfig) from field
/// overrides on top of the defaults
///
/// # Examples
/// ```
/// use buddy_memory::pool_config;
///
/// let config = pool_config! {
///     initial_capacity: 4096,
///     growth_factor: 4,
/// };
/// assert_eq!(config.growth_factor, 4);
/// ```
#[macro_export]
macro_rules! pool_config {
    ($($field:ident: $value:expr),* $(,)?) => {{
        $crate::allocator::pool::PoolConfig {
            $($field: $value,)*
            ..::core::default::Default::default()
        }
    }};
}
