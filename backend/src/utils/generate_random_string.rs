use rand::{Rng, distributions::Alphanumeric};

/// Generates a random alphanumeric string of the specified length.
///
/// Used to name spooled uploads and stored media objects so that client
/// supplied file names never decide where bytes land on disk.
///
/// # Examples
///
/// ```rust,ignore
/// let name = generate_random_string(16);
/// assert_eq!(name.len(), 16);
/// ```
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Returns a lowercase alphanumeric extension (with leading dot) taken from
/// a client file name, or an empty string when there is none.
pub fn safe_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 8
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}
