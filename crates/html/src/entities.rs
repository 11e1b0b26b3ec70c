/// Decode the small set of entities that show up in server-rendered section markup.
///
/// Named: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
/// Numeric entities (`&#39;`, `&#x41;`) decode only when well-formed and semicolon-terminated.
/// Anything else is copied through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    const NAMED: &[(&str, char)] = &[
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&apos;", '\''),
        ("&nbsp;", '\u{00A0}'),
    ];
    const MAX_DIGITS: usize = 7;

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        if let Some((entity, ch)) = NAMED.iter().find(|(name, _)| tail.starts_with(name)) {
            out.push(*ch);
            rest = &tail[entity.len()..];
            continue;
        }

        if let Some((ch, consumed)) = decode_numeric(tail, MAX_DIGITS) {
            out.push(ch);
            rest = &tail[consumed..];
            continue;
        }

        out.push('&');
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

/// `tail` starts with `&`. Returns the decoded scalar and the byte length consumed.
fn decode_numeric(tail: &str, max_digits: usize) -> Option<(char, usize)> {
    let body = tail.strip_prefix("&#")?;
    let (digits_start, radix) = match body.as_bytes().first()? {
        b'x' | b'X' => (1, 16),
        _ => (0, 10),
    };
    let digits = &body[digits_start..];
    let end = digits.find(';')?;
    if end == 0 || end > max_digits {
        return None;
    }
    let value = u32::from_str_radix(&digits[..end], radix).ok()?;
    let ch = char::from_u32(value)?;
    Some((ch, 2 + digits_start + end + 1))
}

pub(crate) fn escape_text(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

pub(crate) fn escape_attr(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::decode_entities;

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#39;x&#x41;"), "'xA");
    }

    #[test]
    fn leaves_malformed_entities_untouched() {
        assert_eq!(decode_entities("&unknown; &#12 &#x;"), "&unknown; &#12 &#x;");
        assert_eq!(decode_entities("R&D"), "R&D");
    }
}
