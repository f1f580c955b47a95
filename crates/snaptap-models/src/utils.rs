//! URL helpers: submission parsing and YouTube link normalization.

use url::Url;

/// Split a raw submission into individual URLs.
///
/// URLs may be separated by any mix of whitespace and newlines; empty
/// tokens are discarded. Order is preserved.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Strip tracking parameters from YouTube watch URLs.
///
/// For youtube.com/youtu.be links with a `v=` parameter, everything except
/// the video id is dropped (playlist ids, timestamps, share trackers all
/// confuse yt-dlp's `--no-playlist` handling less this way). Any other URL
/// is returned unchanged, including ones that fail to parse.
pub fn normalize_url(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    let is_youtube = parsed
        .host_str()
        .map(|h| h.contains("youtube") || h.contains("youtu.be"))
        .unwrap_or(false);
    if !is_youtube {
        return raw.to_string();
    }

    let video_id = parsed
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned());

    match video_id {
        Some(id) => {
            let mut clean = parsed.clone();
            clean.set_fragment(None);
            clean.query_pairs_mut().clear().append_pair("v", &id);
            clean.to_string()
        }
        None => raw.to_string(),
    }
}
