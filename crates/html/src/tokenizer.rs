//! Simplified HTML tokenizer for server-rendered section markup.
//!
//! Tag and attribute names are ASCII `[A-Za-z0-9:_-]` and are lowercased on the way out.
//! This is not an HTML5 state machine: there is no parse-error recovery beyond skipping
//! bytes that cannot start a token. `<script>` and `<style>` bodies are kept as raw text.
use crate::entities::decode_entities;
use crate::types::Token;
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

pub(crate) fn is_rawtext_element(name: &str) -> bool {
    name == "script" || name == "style"
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack
        .get(start..start + needle.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(needle))
}

/// Finds `</name` followed by optional whitespace and `>`; returns (start, end-after-`>`).
fn find_rawtext_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        i += memchr(b'<', &bytes[i..])?;
        if bytes.get(i + 1) == Some(&b'/')
            && starts_with_ignore_ascii_case_at(bytes, i + 2, name.as_bytes())
        {
            let mut k = i + 2 + name.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if bytes.get(k) == Some(&b'>') {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    // Slice endpoints are only ever taken at ASCII structural bytes, so they stay on
    // UTF-8 boundaries.
    while i < len {
        if bytes[i] != b'<' {
            let end = memchr(b'<', &bytes[i..]).map_or(len, |rel| i + rel);
            let text = decode_entities(&input[i..end]);
            if !text.is_empty() {
                out.push(Token::Text(text));
            }
            i = end;
            continue;
        }

        if input[i..].starts_with(COMMENT_START) {
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + COMMENT_END.len();
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    i = len;
                }
            }
            continue;
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let Some(end) = input[i..].find('>') else {
                break;
            };
            out.push(Token::Doctype(input[i + 2..i + end].trim().to_string()));
            i += end + 1;
            continue;
        }

        if bytes.get(i + 1) == Some(&b'/') {
            let start = i + 2;
            let mut j = start;
            while j < len && is_name_char(bytes[j]) {
                j += 1;
            }
            let name = input[start..j].to_ascii_lowercase();
            j = memchr(b'>', &bytes[j..]).map_or(len, |rel| j + rel + 1);
            if !name.is_empty() {
                out.push(Token::EndTag(name));
            }
            i = j;
            continue;
        }

        let start = i + 1;
        let mut j = start;
        while j < len && is_name_char(bytes[j]) {
            j += 1;
        }
        if j == start {
            // A bare `<` that does not open a tag is text.
            out.push(Token::Text("<".to_string()));
            i += 1;
            continue;
        }
        let name = input[start..j].to_ascii_lowercase();
        let (attributes, mut self_closing, after) = read_attributes(input, j);
        if is_void_element(&name) {
            self_closing = true;
        }
        let rawtext = is_rawtext_element(&name) && !self_closing;
        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });
        i = after;

        if rawtext {
            match find_rawtext_close_tag(&input[i..], &name) {
                Some((rel_start, rel_end)) => {
                    if rel_start > 0 {
                        out.push(Token::Text(input[i..i + rel_start].to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i += rel_end;
                }
                None => {
                    // Unterminated rawtext swallows the rest of the input.
                    if i < len {
                        out.push(Token::Text(input[i..].to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i = len;
                }
            }
        }
    }
    out
}

type Attributes = Vec<(String, Option<String>)>;

/// Reads attributes starting right after the tag name. Returns the attributes, whether the
/// tag was written self-closing, and the index just past the closing `>`.
fn read_attributes(input: &str, mut k: usize) -> (Attributes, bool, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut attributes = Vec::new();
    let mut self_closing = false;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        match bytes[k] {
            b'>' => {
                k += 1;
                break;
            }
            b'/' if bytes.get(k + 1) == Some(&b'>') => {
                self_closing = true;
                k += 2;
                break;
            }
            b'/' => {
                k += 1;
                continue;
            }
            _ => {}
        }

        let name_start = k;
        while k < len && is_name_char(bytes[k]) {
            k += 1;
        }
        if name_start == k {
            k += 1;
            continue;
        }
        let name = input[name_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        if k >= len || bytes[k] != b'=' {
            attributes.push((name, None));
            continue;
        }
        k += 1;
        skip_whitespace(&mut k);

        let value = if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
            let quote = bytes[k];
            let vstart = k + 1;
            let vend = memchr(quote, &bytes[vstart..]).map_or(len, |rel| vstart + rel);
            k = (vend + 1).min(len);
            decode_entities(&input[vstart..vend])
        } else {
            let vstart = k;
            while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                if bytes[k] == b'/' && bytes.get(k + 1) == Some(&b'>') {
                    break;
                }
                k += 1;
            }
            decode_entities(&input[vstart..k])
        };
        attributes.push((name, Some(value)));
    }

    (attributes, self_closing, k)
}
