// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Small helpers shared by the client, the session monitor and the CLI.

use unicode_width::UnicodeWidthStr;

/// Mask a session token (or any secret) before it reaches a log line.
///
/// Only the first `visible_prefix` characters survive. Short inputs are still
/// suffixed so the log never reveals whether the whole token was printed.
///
/// ```
/// use optrack::utils::mask_sensitive;
///
/// assert_eq!(mask_sensitive("eyJhbGciOiJIUzI1NiJ9.payload", 6), "eyJhbG...");
/// ```
pub fn mask_sensitive(input: &str, visible_prefix: usize) -> String {
    let prefix: String = input.chars().take(visible_prefix).collect();
    format!("{}...", prefix)
}

/// Pad `s` with spaces up to `width` display columns.
///
/// Accented Spanish text ("Campaña", "Descripción") is common in OP data, so
/// width is measured in terminal columns rather than bytes.
pub fn pad_display(s: &str, width: usize) -> String {
    let current = UnicodeWidthStr::width(s);
    if current >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - current))
    }
}

/// Cut `s` to at most `max` display columns, ending with an ellipsis when cut.
pub fn truncate_display(s: &str, max: usize) -> String {
    if UnicodeWidthStr::width(s) <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Split a shell line into arguments, honouring double and single quotes.
///
/// `products search "camisa polo"` yields three arguments. An unterminated
/// quote swallows the rest of the line.
pub fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_arg = false;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_arg = true;
            }
            None if ch.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            None => {
                current.push(ch);
                in_arg = true;
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive() {
        assert_eq!(mask_sensitive("abcdef123456", 4), "abcd...");
        assert_eq!(mask_sensitive("ab", 4), "ab...");
        assert_eq!(mask_sensitive("", 4), "...");
    }

    #[test]
    fn test_pad_display_counts_columns() {
        assert_eq!(pad_display("Campaña", 9), "Campaña  ");
        assert_eq!(pad_display("toolongvalue", 4), "toolongvalue");
    }

    #[test]
    fn test_truncate_display() {
        assert_eq!(truncate_display("short", 10), "short");
        assert_eq!(truncate_display("Descripción larga", 8), "Descrip…");
    }

    #[test]
    fn test_split_args_quotes() {
        assert_eq!(
            split_args(r#"products list --search "camisa polo""#),
            vec!["products", "list", "--search", "camisa polo"]
        );
        assert_eq!(split_args("  login   --user ana "), vec!["login", "--user", "ana"]);
        assert_eq!(split_args("teams add --description ''"), vec!["teams", "add", "--description", ""]);
        assert!(split_args("   ").is_empty());
    }
}
