/// Strip HTML tags and decode common entities, returning visible text content.
///
/// Script and style bodies are dropped, block elements start a new line and
/// table cells are tab separated.
pub fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len() / 2);
    let mut last_was_whitespace = false;
    let mut rest = html;

    while let Some(ch) = rest.chars().next() {
        if ch == '<' {
            let lower: String = rest.chars().take(10).collect::<String>().to_ascii_lowercase();

            if lower.starts_with("<script") || lower.starts_with("<style") {
                let closing = if lower.starts_with("<script") {
                    "</script>"
                } else {
                    "</style>"
                };
                rest = match find_ascii_ci(rest, closing) {
                    Some(end) => &rest[end + closing.len()..],
                    None => "",
                };
                continue;
            }

            if lower.starts_with("<!--") {
                rest = match rest.find("-->") {
                    Some(end) => &rest[end + 3..],
                    None => "",
                };
                continue;
            }

            const BLOCK_TAGS: [&str; 14] = [
                "<p", "<div", "<br", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6", "<li", "<tr",
                "</p", "</div", "</tr",
            ];
            if BLOCK_TAGS.iter().any(|t| lower.starts_with(t))
                && !result.is_empty()
                && !result.ends_with('\n')
            {
                result.push('\n');
                last_was_whitespace = true;
            }

            if (lower.starts_with("<td") || lower.starts_with("<th"))
                && !result.is_empty()
                && !result.ends_with('\n')
                && !result.ends_with('\t')
            {
                result.push('\t');
            }

            rest = match rest.find('>') {
                Some(end) => &rest[end + 1..],
                None => "",
            };
            continue;
        }

        if ch == '&' {
            if let Some((decoded, len)) = decode_entity(rest) {
                result.push(decoded);
                last_was_whitespace = decoded == ' ';
                rest = &rest[len..];
                continue;
            }
        }

        if ch.is_whitespace() {
            if !last_was_whitespace && !result.is_empty() {
                result.push(if ch == '\n' { '\n' } else { ' ' });
                last_was_whitespace = true;
            }
        } else {
            result.push(ch);
            last_was_whitespace = false;
        }
        rest = &rest[ch.len_utf8()..];
    }

    // Collapse runs of blank lines and trim each line
    let mut cleaned = String::with_capacity(result.len());
    let mut blank_lines = 0;
    for line in result.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_lines += 1;
            if blank_lines <= 1 && !cleaned.is_empty() {
                cleaned.push('\n');
            }
        } else {
            blank_lines = 0;
            if !cleaned.is_empty() && !cleaned.ends_with('\n') {
                cleaned.push('\n');
            }
            cleaned.push_str(trimmed);
        }
    }

    cleaned.trim_end().to_string()
}

/// Pull the `<title>` of a page, if it has one.
pub fn html_title(html: &str) -> Option<String> {
    let start = find_ascii_ci(html, "<title")?;
    let open_end = html[start..].find('>')? + start + 1;
    let close = find_ascii_ci(&html[open_end..], "</title>")? + open_end;
    let title = strip_html_tags(&html[open_end..close]);
    (!title.is_empty()).then_some(title)
}

fn decode_entity(s: &str) -> Option<(char, usize)> {
    const ENTITIES: [(&str, char); 7] = [
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&amp;", '&'),
        ("&nbsp;", ' '),
        ("&quot;", '"'),
        ("&#39;", '\''),
        ("&apos;", '\''),
    ];
    ENTITIES
        .iter()
        .find(|(entity, _)| s.starts_with(entity))
        .map(|(entity, ch)| (*ch, entity.len()))
}

/// Byte offset of `needle` (ASCII) in `haystack`, ignoring ASCII case.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}
