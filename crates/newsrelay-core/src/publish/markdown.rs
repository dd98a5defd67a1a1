const RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape text for Telegram MarkdownV2
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render the channel post for one article
pub fn format_message(title: &str, summary: &str, link: &str) -> String {
    format!(
        "*{}*\n\n{}\n\n{}",
        escape_markdown(title),
        escape_markdown(summary),
        escape_markdown(link)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("plain text"), "plain text");
        assert_eq!(escape_markdown("v1.2 - done!"), "v1\\.2 \\- done\\!");
        assert_eq!(escape_markdown("a_b*c[d](e)"), "a\\_b\\*c\\[d\\]\\(e\\)");
        assert_eq!(escape_markdown("~`>#+=|{}"), "\\~\\`\\>\\#\\+\\=\\|\\{\\}");
        assert_eq!(escape_markdown("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_format_message() {
        let message = format_message("Hello.", "Line one\nLine two", "https://a.example/x");
        assert_eq!(
            message,
            "*Hello\\.*\n\nLine one\nLine two\n\nhttps://a\\.example/x"
        );
    }
}
