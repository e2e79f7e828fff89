//! URL list loading

use crate::error::{Error, Result};
use std::path::Path;
use tracing::{debug, info};

/// Read a newline-delimited URL list.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. `limit`
/// keeps only the first N remaining URLs.
pub fn load_urls(path: &Path, limit: Option<usize>) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("cannot read URL list {}: {}", path.display(), e)))?;
    let urls = parse_urls(&raw, limit);
    info!("Loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// Parse URL list text; see [`load_urls`]
pub fn parse_urls(raw: &str, limit: Option<usize>) -> Vec<String> {
    let urls = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from);

    match limit {
        Some(n) => {
            debug!("Limiting URL list to {}", n);
            urls.take(n).collect()
        }
        None => urls.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LIST: &str = "https://a.example/p/1/\n\n  https://a.example/p/2/  \n# skipped\nhttps://a.example/p/3/\n";

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        assert_eq!(
            parse_urls(LIST, None),
            vec![
                "https://a.example/p/1/",
                "https://a.example/p/2/",
                "https://a.example/p/3/"
            ]
        );
    }

    #[test]
    fn test_limit_applies_after_filtering() {
        assert_eq!(
            parse_urls(LIST, Some(2)),
            vec!["https://a.example/p/1/", "https://a.example/p/2/"]
        );
        assert!(parse_urls(LIST, Some(0)).is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LIST.as_bytes()).unwrap();
        assert_eq!(load_urls(file.path(), Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_urls(Path::new("/no/such/urls.txt"), None).unwrap_err();
        assert!(err.is_fatal());
    }
}
