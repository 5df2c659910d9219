/// First `words` whitespace-delimited tokens of `text`, joined by single
/// spaces. Text shorter than `words` tokens has no preview.
pub fn preview(text: &str, words: usize) -> String {
    let tokens: Vec<&str> = text.split_whitespace().take(words).collect();
    if tokens.len() < words {
        return String::new();
    }
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_takes_exactly_n_tokens() {
        let text = (1..=250).map(|i| format!("w{}", i)).collect::<Vec<_>>().join("\n\t ");
        let p = preview(&text, 200);
        let tokens: Vec<&str> = p.split(' ').collect();
        assert_eq!(tokens.len(), 200);
        assert_eq!(tokens[0], "w1");
        assert_eq!(tokens[199], "w200");
    }

    #[test]
    fn test_preview_exact_length_text() {
        let text = vec!["word"; 200].join(" ");
        assert_eq!(preview(&text, 200), text);
    }

    #[test]
    fn test_short_text_has_no_preview() {
        assert_eq!(preview("only a few words here", 200), "");
        assert_eq!(preview("", 200), "");
        assert_eq!(preview("one two three", 3), "one two three");
    }
}
