/// Reduces user-supplied display text (student names) to plain text.
///
/// Uses an ammonia builder with no allowed tags: markup is dropped and the text
/// content stays. The serializer escapes text nodes, so those escapes are undone
/// to get back the characters the user typed. The result is trimmed.
pub fn clean_text(input: &str) -> String {
    let stripped = ammonia::Builder::empty().clean(input).to_string();

    // `&amp;` last, so an escaped entity like `&amp;lt;` decodes only once.
    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
