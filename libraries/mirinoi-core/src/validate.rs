//! Input validation for URLs and names

use url::Url;

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "youtu.be", "music.youtube.com"];

/// Whether `input` is a YouTube or YouTube Music URL with a non-empty path
///
/// The scheme is optional (`youtu.be/abc` is accepted).
pub fn is_youtube_url(input: &str) -> bool {
    let input = input.trim();
    let parsed = if input.starts_with("http://") || input.starts_with("https://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("https://{input}"))
    };

    let Ok(url) = parsed else {
        return false;
    };

    let host_ok = url
        .host_str()
        .is_some_and(|host| YOUTUBE_HOSTS.contains(&host));
    let has_path = url.path().len() > 1 || url.query().is_some();

    host_ok && has_path
}

/// Whether `value` contains anything besides whitespace
pub fn is_non_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

/// URL validation used for playlist and track sources
pub fn is_valid_url(input: &str) -> bool {
    is_youtube_url(input)
}
