use std::path::Path;

/// Sanitizes a client-supplied filename for use as a storage name.
///
/// Strips any path components, neutralizes reserved characters, drops
/// leading dots, and caps the length. Returns an empty string when
/// nothing usable remains.
pub fn sanitize_filename(filename: &str) -> String {
    // Get only the filename component (remove any path)
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || matches!(
                    c,
                    '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';'
                )
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // No hidden files in the storage directory
    let sanitized = sanitized.trim_start_matches('.').to_string();

    // Limit length safely for UTF-8
    if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    }
}

/// Whether the filename's inferred media type is in the audio category.
/// Judged by name alone; content problems surface later, from the decoder.
pub fn is_audio_filename(filename: &str) -> bool {
    mime_guess::from_path(filename)
        .first()
        .is_some_and(|m| m.type_() == mime::AUDIO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("song.mp3"), "song.mp3");
        assert_eq!(sanitize_filename("my song.wav"), "my song.wav");
        assert_eq!(sanitize_filename("mix<1>.mp3"), "mix_1_.mp3");
        assert_eq!(sanitize_filename("日本語.mp3"), "日本語.mp3");

        // Path traversal
        assert_eq!(sanitize_filename("../../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("a/b/c.mp3"), "c.mp3");

        // Reserved characters
        assert_eq!(sanitize_filename("so:ng?.mp3"), "so_ng_.mp3");

        // Hidden files lose their leading dots
        assert_eq!(sanitize_filename(".hidden.mp3"), "hidden.mp3");

        // Nothing usable
        assert_eq!(sanitize_filename(""), "");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn test_sanitize_filename_caps_length() {
        let long = format!("{}.mp3", "a".repeat(300));
        let sanitized = sanitize_filename(&long);
        assert!(sanitized.len() <= 255);
    }

    #[test]
    fn test_is_audio_filename() {
        assert!(is_audio_filename("song.mp3"));
        assert!(is_audio_filename("track.wav"));
        assert!(is_audio_filename("album.flac"));
        assert!(is_audio_filename("cast.ogg"));
        assert!(is_audio_filename("voice.m4a"));

        assert!(!is_audio_filename("notes.txt"));
        assert!(!is_audio_filename("clip.mp4"));
        assert!(!is_audio_filename("image.png"));
        assert!(!is_audio_filename("noextension"));
    }
}
