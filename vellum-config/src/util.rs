use std::net::IpAddr;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use url::{Host, Url};

/// Split a comma separated list, trimming entries and dropping blanks.
pub fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Parse a humantime duration such as `1s` or `250ms`.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    humantime::parse_duration(raw.trim()).map_err(|err| err.to_string())
}

/// Parse an integer that must be at least one.
pub fn parse_positive<T>(raw: &str) -> Result<T, String>
where
    T: FromStr + PartialOrd + From<u8>,
    T::Err: std::fmt::Display,
{
    let value = raw.trim().parse::<T>().map_err(|err| err.to_string())?;
    if value < T::from(1) {
        return Err("must be at least 1".into());
    }
    Ok(value)
}

pub fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => IpAddr::V4(addr).is_loopback(),
        Some(Host::Ipv6(addr)) => IpAddr::V6(addr).is_loopback(),
        None => false,
    }
}

/// Normalize `path` lexically, then resolve symlinks for its longest
/// existing prefix, so paths that do not exist yet can still be compared.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other.as_os_str()),
        }
    }

    let mut existing = lexical.as_path();
    let mut remainder = Vec::new();
    let mut resolved = loop {
        if let Ok(canonical) = existing.canonicalize() {
            break canonical;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                remainder.push(name.to_os_string());
                existing = parent;
            }
            _ => break existing.to_path_buf(),
        }
    };

    for part in remainder.into_iter().rev() {
        resolved.push(part);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_entries_are_trimmed() {
        assert_eq!(parse_csv(" /a , ,/b,"), vec!["/a", "/b"]);
        assert!(parse_csv(" , ").is_empty());
    }

    #[test]
    fn durations_use_humantime() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration(" 2s ").unwrap(), Duration::from_secs(2));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn positive_integers() {
        assert_eq!(parse_positive::<u32>("3").unwrap(), 3);
        assert!(parse_positive::<u32>("0").is_err());
        assert!(parse_positive::<usize>("-1").is_err());
        assert!(parse_positive::<usize>("many").is_err());
    }

    #[test]
    fn loopback_hosts() {
        for url in [
            "http://localhost/a",
            "http://127.0.0.1:8080/a",
            "http://[::1]/a",
        ] {
            assert!(is_loopback(&Url::parse(url).unwrap()), "{url}");
        }
        assert!(!is_loopback(&Url::parse("http://archive.example/a").unwrap()));
    }

    #[test]
    fn normalize_handles_missing_tail() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();

        let missing = dir.path().join("not/yet/../here");

        assert_eq!(normalize_path(&missing), canonical.join("not/here"));
        assert_eq!(normalize_path(dir.path()), canonical);
    }
}
