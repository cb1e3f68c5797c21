//! Destination path derivation: capture-date directories, MIME-driven
//! extensions, and filename cleaning.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, FixedOffset};

/// MIME type → file extension for the formats the provider serves.
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/heic", "heic"),
    ("image/heif", "heif"),
    ("image/bmp", "bmp"),
    ("image/tiff", "tif"),
    ("video/mp4", "mp4"),
    ("video/quicktime", "mov"),
    ("video/x-msvideo", "avi"),
    ("video/webm", "webm"),
    ("video/x-matroska", "mkv"),
    ("video/mpeg", "mpg"),
    ("video/3gpp", "3gp"),
];

/// Look up the extension for a MIME type. Unmapped types fall back by media
/// class: `.mp4` for anything video-shaped, `.jpg` otherwise.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    MIME_EXTENSIONS
        .iter()
        .find(|(key, _)| *key == mime_type)
        .map(|(_, ext)| *ext)
        .unwrap_or(if mime_type.contains("video") { "mp4" } else { "jpg" })
}

/// Directory for a capture date: zero-padded `YYYY/MM/DD` under `output`.
/// The date comes from the timestamp as reported, with no timezone shift,
/// so the layout is deterministic across machines.
pub fn date_dir(output: &Path, created: &DateTime<FixedOffset>) -> PathBuf {
    output
        .join(format!("{:04}", created.year()))
        .join(format!("{:02}", created.month()))
        .join(format!("{:02}", created.day()))
}

/// Clean a filename by removing characters that are invalid on common
/// filesystems: `/`, `\`, `:`, `*`, `?`, `"`, `<`, `>`, `|`.
pub fn clean_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect()
}

/// The reported filename minus its extension, cleaned. A leading dot is not
/// treated as an extension separator.
pub fn basename(filename: &str) -> String {
    let clean = clean_filename(filename);
    match clean.rfind('.') {
        Some(dot) if dot > 0 => clean[..dot].to_string(),
        _ => clean,
    }
}

/// Full destination path for one derived asset.
pub fn destination(dir: &Path, filename: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}.{}", basename(filename), ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_extension_known_types() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/heic"), "heic");
        assert_eq!(extension_for_mime("video/mp4"), "mp4");
        assert_eq!(extension_for_mime("video/quicktime"), "mov");
        assert_eq!(extension_for_mime("video/x-matroska"), "mkv");
    }

    #[test]
    fn test_extension_fallback_video() {
        assert_eq!(extension_for_mime("video/x-unheard-of"), "mp4");
        assert_eq!(extension_for_mime("video"), "mp4");
    }

    #[test]
    fn test_extension_fallback_image() {
        assert_eq!(extension_for_mime("image/x-unheard-of"), "jpg");
        assert_eq!(extension_for_mime(""), "jpg");
    }

    #[test]
    fn test_date_dir_zero_padded() {
        let dir = date_dir(Path::new("/photos"), &ts("2019-03-06T09:12:41Z"));
        assert_eq!(dir, PathBuf::from("/photos/2019/03/06"));
    }

    #[test]
    fn test_date_dir_uses_reported_date_not_local() {
        // A timestamp with an offset keeps its own calendar date.
        let dir = date_dir(Path::new("out"), &ts("2021-12-31T23:30:00+11:00"));
        assert_eq!(dir, PathBuf::from("out/2021/12/31"));
    }

    #[test]
    fn test_clean_filename() {
        assert_eq!(clean_filename("photo:1.jpg"), "photo1.jpg");
        assert_eq!(clean_filename("a/b\\c*d?e\"f<g>h|i"), "abcdefghi");
        assert_eq!(clean_filename("normal.jpg"), "normal.jpg");
    }

    #[test]
    fn test_basename_strips_extension() {
        assert_eq!(basename("IMG_0001.JPG"), "IMG_0001");
        assert_eq!(basename("my.photo.png"), "my.photo");
        assert_eq!(basename("noext"), "noext");
    }

    #[test]
    fn test_basename_keeps_leading_dot() {
        assert_eq!(basename(".hidden"), ".hidden");
    }

    #[test]
    fn test_destination_joins_dir_and_extension() {
        let dest = destination(Path::new("/photos/2019/03/06"), "IMG_0001.JPG", "jpg");
        assert_eq!(dest, PathBuf::from("/photos/2019/03/06/IMG_0001.jpg"));
    }

    #[test]
    fn test_destination_live_photo_pair_shares_basename() {
        let dir = Path::new("out/2020/01/01");
        let image = destination(dir, "IMG_5526.HEIC", "heic");
        let video = destination(dir, "IMG_5526.HEIC", "mp4");
        assert_eq!(image, PathBuf::from("out/2020/01/01/IMG_5526.heic"));
        assert_eq!(video, PathBuf::from("out/2020/01/01/IMG_5526.mp4"));
    }
}
