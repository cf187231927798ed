//! Helpers that keep user-supplied text (command arguments, GUI titles, item
//! names) on a single log line.

use std::fmt::Write;

const MAX_PREVIEW: usize = 200;
const MAX_ARGS: usize = 8;

/// Escape control characters and cap length so a value can be logged inline.
///
/// Backslash, `\n`, `\r` and `\t` get their usual escapes; other control
/// characters become `\xNN`. Anything past 200 chars is replaced by `…`.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Render an argument list for logs: `["a", "b c"]`, escaped, at most 8 entries.
pub fn preview_args(args: Option<&[String]>) -> String {
    let Some(args) = args else {
        return "<absent>".to_string();
    };
    let mut out = String::from("[");
    for (i, arg) in args.iter().take(MAX_ARGS).enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(&mut out, "\"{}\"", escape_log(arg));
    }
    if args.len() > MAX_ARGS {
        let _ = write!(&mut out, ", +{} more", args.len() - MAX_ARGS);
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape_log("a\nb\r\tc\\"), "a\\nb\\r\\tc\\\\");
        assert_eq!(escape_log("\u{7}"), "\\x07");
    }

    #[test]
    fn truncates_long_values() {
        let long = "x".repeat(500);
        let esc = escape_log(&long);
        assert!(esc.ends_with('…'));
        assert_eq!(esc.chars().count(), MAX_PREVIEW + 1);
    }

    #[test]
    fn previews_argument_lists() {
        assert_eq!(preview_args(None), "<absent>");
        let args: Vec<String> = vec!["a".into(), "b\nc".into()];
        assert_eq!(preview_args(Some(&args)), "[\"a\", \"b\\nc\"]");
        let many: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert!(preview_args(Some(&many)).ends_with(", +2 more]"));
    }
}
