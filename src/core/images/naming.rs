use chrono::{DateTime, Local};
use url::Url;

/// Extension (with leading dot) for the file behind `url`, judged by the
/// MIME type its path suggests. Empty when nothing can be inferred.
pub fn extension_for_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };

    let path = parsed.path();
    let Some(mime) = mime_guess::from_path(path).first() else {
        return String::new();
    };

    if mime == mime_guess::mime::IMAGE_JPEG {
        return ".jpg".to_string();
    }

    // Keep the spelling the server used for any other recognised type
    match std::path::Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!(".{}", ext.to_ascii_lowercase()),
        None => String::new(),
    }
}

/// Filename for the `index`-th (1-based) result of a run.
///
/// The index makes names unique within a run; the timestamp, down to the
/// millisecond and with the local UTC offset, separates runs that write
/// into the same directory.
pub fn image_filename(index: usize, url: &str, now: DateTime<Local>) -> String {
    format!(
        "{}_{}{}",
        index,
        now.format("%Y%m%d_%H%M%S%3f%z"),
        extension_for_url(url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_extension_inference() {
        assert_eq!(extension_for_url("https://example.com/cat.jpeg"), ".jpg");
        assert_eq!(extension_for_url("https://example.com/cat.JPG?w=200"), ".jpg");
        assert_eq!(extension_for_url("https://example.com/a/b/dog.png"), ".png");
        assert_eq!(extension_for_url("https://example.com/anim.gif#frag"), ".gif");
        assert_eq!(extension_for_url("https://example.com/image"), "");
        assert_eq!(extension_for_url("https://example.com/file.notatype"), "");
        assert_eq!(extension_for_url("not a url"), "");
    }

    #[test]
    fn test_filenames_unique_within_same_instant() {
        let now = Local::now();
        let names: HashSet<_> = (1..=500)
            .map(|i| image_filename(i, "https://example.com/x.png", now))
            .collect();
        assert_eq!(names.len(), 500);
    }

    #[test]
    fn test_filename_shape() {
        let now = Local::now();
        let name = image_filename(7, "https://example.com/x.webp", now);
        assert!(name.starts_with("7_"));
        assert!(name.ends_with(".webp"));
        assert!(name.contains(&now.format("%Y%m%d").to_string()));
    }
}
