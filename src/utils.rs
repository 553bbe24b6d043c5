//! # Utility Functions Module
//!
//! Small helpers for building external command lines.

/// Converts any iterable of string-like items to `Vec<String>`.
///
/// Used to build ffmpeg argument lists without repeating `.to_string()`
/// on every literal.
///
/// # Example
/// ```rust
/// use flac_batch_converter::utils::to_string_vec;
///
/// let bitrate = "320k";
/// let args = to_string_vec(["-c:a", "libmp3lame", "-b:a", bitrate]);
/// assert_eq!(args.len(), 4);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Build a `Vec<String>` of command arguments.
///
/// # Example
/// ```rust
/// use flac_batch_converter::args;
///
/// let args = args!["-c:a", "alac"];
/// assert_eq!(args, vec!["-c:a".to_string(), "alac".to_string()]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        $crate::utils::to_string_vec([$($item),*])
    };
}
