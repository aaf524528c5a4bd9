//! Storage keys, canonical URLs and display titles
//!
//! Keys follow the bucket layout `<Kind>/<Category_Name>/<file>`; the
//! companion thumbnail lives under the same key with a `.jpg` extension in
//! the public bucket.

use crate::category::CategoryKind;
use crate::{BJJCoreError, Result};
use regex::Regex;
use std::path::{Component, Path};
use std::sync::OnceLock;

/// Folder for uploads without any category
pub const UNCATEGORIZED_FOLDER: &str = "Uncategorized";

fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9/_.\-]").expect("static regex"))
}

/// Make a key storage-safe: anything but `[a-zA-Z0-9/_.-]` becomes `_`.
pub fn sanitize_path(path: &str) -> String {
    unsafe_chars().replace_all(path, "_").into_owned()
}

/// Key for a file under an optional category folder.
pub fn storage_key(category: Option<(CategoryKind, &str)>, filename: &str) -> Result<String> {
    let filename = file_name_only(filename)?;
    let key = match category {
        Some((kind, name)) => format!("{}/{}/{}", kind.folder(), name.trim(), filename),
        None => format!("{}/{}", UNCATEGORIZED_FOLDER, filename),
    };
    Ok(sanitize_path(&key))
}

/// Key for a file found at `relative` inside an import folder.
pub fn key_from_relative_path(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(BJJCoreError::InvalidInput(format!(
                    "Path escapes the import folder: {}",
                    relative.display()
                )))
            }
        }
    }
    if parts.is_empty() {
        return Err(BJJCoreError::InvalidInput("Empty relative path".to_string()));
    }
    Ok(sanitize_path(&parts.join("/")))
}

/// Public thumbnail key for a video key (`a/b.mp4` → `a/b.jpg`)
pub fn thumbnail_key(video_key: &str) -> String {
    let video_key = video_key.trim_start_matches('/');
    let (dir, file) = match video_key.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, video_key),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    match dir {
        Some(dir) => format!("{}/{}.jpg", dir, stem),
        None => format!("{}.jpg", stem),
    }
}

/// `https://{domain}/{key}`, the de-duplicated URL a video row is keyed by
pub fn canonical_url(domain: &str, key: &str) -> String {
    format!(
        "https://{}/{}",
        crate::signing::normalize_domain(domain),
        key.trim_start_matches('/')
    )
}

/// Object key of a canonical URL on `domain`, without any query string.
///
/// URLs on another host fall back to their path.
pub fn key_from_url(domain: &str, url: &str) -> Result<String> {
    let url = url.trim();
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let marker = format!("{}/", crate::signing::normalize_domain(domain));

    let key = match without_query.rsplit_once(&marker) {
        Some((_, key)) => key.to_string(),
        None => url::Url::parse(without_query)
            .map(|parsed| parsed.path().to_string())
            .map_err(|e| BJJCoreError::InvalidInput(format!("Invalid video URL {}: {}", url, e)))?,
    };

    Ok(crate::signing::normalize_key(&key)?.to_string())
}

/// Category folder of a key (`Guard/Closed_Guard/x.mp4` → Guard, "Closed Guard")
pub fn category_from_key(key: &str) -> Option<(CategoryKind, String)> {
    let mut parts = key.trim_start_matches('/').split('/');
    let kind = parts.next()?.parse::<CategoryKind>().ok()?;
    let name = parts.next()?;
    // the category folder must be followed by a file name
    parts.next()?;

    let name = name.replace('_', " ").split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return None;
    }
    Some((kind, name))
}

/// Display title from a file name: extension dropped, `_`/`-` become
/// spaces, words capitalized (`Closed_Guard_Armbar.mp4` → "Closed Guard Armbar").
pub fn title_from_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    let spaced = name.replace(['_', '-'], " ");
    let mut titled = String::with_capacity(spaced.len());
    let mut previous_is_letter = false;
    for c in spaced.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            titled.push(c);
            previous_is_letter = false;
        }
    }

    titled.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn file_name_only(filename: &str) -> Result<&str> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .unwrap_or_default();
    if name.is_empty() {
        return Err(BJJCoreError::InvalidInput("File name is empty".to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("Guard/Closed Guard/arm bar (v2).mp4"), "Guard/Closed_Guard/arm_bar__v2_.mp4");
        assert_eq!(sanitize_path("Guard/x-guard_1.mp4"), "Guard/x-guard_1.mp4");
    }

    #[test]
    fn test_storage_key_with_category() {
        let key = storage_key(Some((CategoryKind::Guard, "Closed Guard")), "Closed_Guard_Armbar.mp4").unwrap();
        assert_eq!(key, "Guard/Closed_Guard/Closed_Guard_Armbar.mp4");
    }

    #[test]
    fn test_storage_key_uncategorized() {
        assert_eq!(storage_key(None, "clip one.mp4").unwrap(), "Uncategorized/clip_one.mp4");
        assert!(storage_key(None, "  ").is_err());
    }

    #[test]
    fn test_storage_key_drops_client_directories() {
        assert_eq!(storage_key(None, "C:\\videos\\clip.mp4").unwrap(), "Uncategorized/clip.mp4");
    }

    #[test]
    fn test_key_from_url() {
        let domain = "d111111abcdef8.cloudfront.net";
        assert_eq!(
            key_from_url(domain, "https://d111111abcdef8.cloudfront.net/Guard/Closed_Guard/a.mp4?x=1").unwrap(),
            "Guard/Closed_Guard/a.mp4"
        );
        assert_eq!(
            key_from_url(domain, "https://old-bucket.s3.amazonaws.com/Position/Mount/b.mp4").unwrap(),
            "Position/Mount/b.mp4"
        );
        assert!(key_from_url(domain, "not a url").is_err());
    }

    #[test]
    fn test_key_from_relative_path() {
        let key = key_from_relative_path(Path::new("Guard/Closed Guard/Armbar.mp4")).unwrap();
        assert_eq!(key, "Guard/Closed_Guard/Armbar.mp4");
        assert!(key_from_relative_path(Path::new("../secret.mp4")).is_err());
    }

    #[test]
    fn test_thumbnail_key() {
        assert_eq!(
            thumbnail_key("Guard/Closed_Guard/Closed_Guard_Armbar.mp4"),
            "Guard/Closed_Guard/Closed_Guard_Armbar.jpg"
        );
        assert_eq!(thumbnail_key("clip"), "clip.jpg");
        assert_eq!(thumbnail_key("dir.v2/clip"), "dir.v2/clip.jpg");
    }

    #[test]
    fn test_canonical_url() {
        assert_eq!(
            canonical_url("https://d1.cloudfront.net/", "/Guard/a.mp4"),
            "https://d1.cloudfront.net/Guard/a.mp4"
        );
    }

    #[test]
    fn test_category_from_key() {
        assert_eq!(
            category_from_key("Guard/Closed_Guard/Closed_Guard_Armbar.mp4"),
            Some((CategoryKind::Guard, "Closed Guard".to_string()))
        );
        assert_eq!(category_from_key("Uncategorized/a.mp4"), None);
        assert_eq!(category_from_key("Guard/a.mp4"), None);
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("Closed_Guard_Armbar.mp4"), "Closed Guard Armbar");
        assert_eq!(title_from_filename("-no-gi_KIMURA trap.mp4"), "No Gi Kimura Trap");
        assert_eq!(title_from_filename("50_50_heel_hook.mp4"), "50 50 Heel Hook");
    }
}
