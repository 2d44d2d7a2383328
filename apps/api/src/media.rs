/// Maps a stored media path to a displayable URL.
///
/// Absolute http(s) values are returned unchanged; relative paths are joined
/// onto the configured media base URL. Image storage itself is external.
pub fn to_public_url(base: &str, path: Option<&str>) -> Option<String> {
    let path = path?.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }
    Some(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_joined() {
        assert_eq!(
            to_public_url("http://localhost:8080/uploads", Some("imgs/a.png")),
            Some("http://localhost:8080/uploads/imgs/a.png".to_string())
        );
    }

    #[test]
    fn test_absolute_url_passthrough() {
        assert_eq!(
            to_public_url("http://localhost:8080/uploads", Some("https://cdn.example.com/x.png")),
            Some("https://cdn.example.com/x.png".to_string())
        );
    }

    #[test]
    fn test_slashes_normalized() {
        assert_eq!(
            to_public_url("http://h/uploads/", Some("/a.png")),
            Some("http://h/uploads/a.png".to_string())
        );
    }

    #[test]
    fn test_missing_or_empty() {
        assert_eq!(to_public_url("http://h", None), None);
        assert_eq!(to_public_url("http://h", Some("  ")), None);
    }
}
