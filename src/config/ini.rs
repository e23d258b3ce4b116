//! Minimal reader for `[section]` / `key=value` text files.

/// Parse the given ini-formatted content, calling `handler` with the section,
/// key and value of every entry. The handler returns `false` when it does not
/// recognise the section, which is logged and otherwise ignored.
pub fn parse<F>(content: &str, mut handler: F)
where
    F: FnMut(&str, &str, &str) -> bool,
{
    let mut section = String::new();
    for (number, line) in content.lines().enumerate() {
        let line = strip_inline_comment(line).trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let Some(name) = rest.strip_suffix(']') else {
                log::debug!("Ignoring malformed section header on line {}", number + 1);
                continue;
            };
            section = name.trim().to_string();
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            log::debug!("Ignoring malformed entry on line {}", number + 1);
            continue;
        };

        if !handler(section.as_str(), key.trim(), value.trim()) {
            log::trace!("Unrecognized section `{section}` on line {}", number + 1);
        }
    }
}

/// Remove a trailing ` ;comment` from the line. Semicolons that are not
/// preceded by whitespace are part of the value.
fn strip_inline_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &byte) in bytes.iter().enumerate() {
        if byte == b';' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return &line[..i];
        }
    }
    line
}
