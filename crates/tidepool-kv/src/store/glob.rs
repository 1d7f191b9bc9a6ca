//! Redis-style glob patterns (`*`, `?`, `[abc]`, `[^a-z]`, `\x`)

use regex::Regex;

/// Compile a SCAN MATCH pattern into an anchored regex
pub(crate) fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    let mut out = String::from("(?s)^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => push_literal(&mut out, escaped),
                None => push_literal(&mut out, '\\'),
            },
            '[' => {
                let negate = chars.peek() == Some(&'^');
                if negate {
                    chars.next();
                }

                // An unterminated class runs to the end of the pattern
                let mut class = String::new();
                while let Some(c) = chars.next() {
                    match c {
                        ']' => break,
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                push_class_char(&mut class, escaped);
                            }
                        }
                        '-' => class.push('-'),
                        other => push_class_char(&mut class, other),
                    }
                }

                match (class.is_empty(), negate) {
                    (true, false) => out.push_str(r"[^\s\S]"),
                    (true, true) => out.push_str(r"[\s\S]"),
                    (false, false) => {
                        out.push('[');
                        out.push_str(&class);
                        out.push(']');
                    }
                    (false, true) => {
                        out.push_str("[^");
                        out.push_str(&class);
                        out.push(']');
                    }
                }
            }
            other => push_literal(&mut out, other),
        }
    }

    out.push('$');
    Regex::new(&out)
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

fn push_class_char(class: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
        class.push('\\');
    }
    class.push(c);
}
