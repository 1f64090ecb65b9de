//! Final-content formatting ahead of dispatch.

/// Platform hard limit on message length, with a little headroom.
pub const MESSAGE_LIMIT: usize = 4000;

/// Insert a zero-width space after every `@` so webhook posts can never ping
/// anyone, even if the platform-side mention parsing is misconfigured.
pub fn defuse_mentions(content: &str) -> String {
    content.replace('@', "@\u{200B}")
}

/// Prepend a back-reference link to the original message, when one exists.
pub fn stitch_translation(original_link: Option<&str>, translated: &str) -> String {
    match original_link {
        Some(link) => format!("[\u{21A9} Original]({link})\n{translated}"),
        None => translated.to_string(),
    }
}

/// Truncate to the platform limit on a char boundary, marking the cut.
pub fn clamp_length(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let truncated: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defuses_every_at_sign() {
        assert_eq!(defuse_mentions("hi @everyone and @here"), "hi @\u{200B}everyone and @\u{200B}here");
        assert_eq!(defuse_mentions("no pings"), "no pings");
    }

    #[test]
    fn stitches_back_reference() {
        let out = stitch_translation(Some("https://chat.example/m/1"), "hola");
        assert_eq!(out, "[\u{21A9} Original](https://chat.example/m/1)\nhola");
        assert_eq!(stitch_translation(None, "hola"), "hola");
    }

    #[test]
    fn clamps_on_char_boundaries() {
        let short = "héllo";
        assert_eq!(clamp_length(short, 10), short);

        let long = "ü".repeat(50);
        let clamped = clamp_length(&long, 10);
        assert_eq!(clamped.chars().count(), 10);
        assert!(clamped.ends_with("..."));
    }
}
