/// Plain-text description derived from a markdown body. Stored next to
/// the raw markdown so list views never re-render it; clients are not
/// allowed to set it directly.
pub fn derive_description(markdown: &str) -> String {
    let stripped: String = markdown
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | '_' | '`' | '>'))
        .collect();

    let text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    text.chars().take(280).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_and_collapses_whitespace() {
        let md = "# Camp\n\nBring **tents** and `rope`.";
        assert_eq!(derive_description(md), "Camp Bring tents and rope.");
    }

    #[test]
    fn truncates_long_bodies() {
        let md = "word ".repeat(100);
        assert!(derive_description(&md).chars().count() <= 280);
    }
}
