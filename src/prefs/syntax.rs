//-
// Copyright (c) 2024, Jason Lingle
//
// This file is part of Profmig.
//
// Profmig is free software: you can redistribute it and/or modify it under the
// terms of  the GNU General Public  License as published by  the Free Software
// Foundation, either version  3 of the License, or (at  your option) any later
// version.
//
// Profmig is distributed in the hope that  it will be useful,  but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Profmig. If not, see <http://www.gnu.org/licenses/>.

//! The syntax of legacy `prefs.js` files.
//!
//! Each preference is a statement of the form
//!
//! ```text
//! user_pref("mail.server.server1.hostname", "imap.example.com");
//! ```
//!
//! on its own line. `pref(...)` and `sticky_pref(...)` are accepted as
//! synonyms. Values are double-quoted strings, `true`/`false`, or 32-bit
//! integers. The files also contain `//`, `#` and `/* */` comments.

use std::fmt::Write as _;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::value::PrefValue;

pub const FILE_HEADER: &str = "// Mozilla User Preferences\n\
    \n\
    /* Written during profile migration. Do not edit this file while the\n \
    * mail client is running; it rewrites it on exit. */\n\
    \n";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("line {0}: not a preference statement")]
    NotAStatement(usize),
    #[error("line {0}: invalid escape sequence")]
    InvalidEscape(usize),
    #[error("line {0}: integer out of range")]
    IntegerOutOfRange(usize),
}

/// Parse the full text of a preference file.
///
/// Returns the preferences in file order. Later duplicates are returned as
/// well; it is up to the caller to decide which one wins.
pub fn parse(text: &str) -> Result<Vec<(String, PrefValue)>, Error> {
    lazy_static! {
        static ref STATEMENT: Regex = Regex::new(
            r#"^(?:user_pref|pref|sticky_pref)\s*\(\s*"((?:[^"\\]|\\.)*)"\s*,\s*("(?:[^"\\]|\\.)*"|true|false|[-+]?[0-9]+)\s*\)\s*;(.*)$"#
        )
        .unwrap();
    }

    let mut prefs = Vec::new();
    let mut in_block_comment = false;

    for (ix, raw_line) in text.lines().enumerate() {
        let line_no = ix + 1;
        let line = strip_comments(raw_line, &mut in_block_comment);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let captures =
            STATEMENT.captures(line).ok_or(Error::NotAStatement(line_no))?;
        let key = unescape(captures.get(1).unwrap().as_str())
            .ok_or(Error::InvalidEscape(line_no))?;
        let value = parse_value(captures.get(2).unwrap().as_str(), line_no)?;

        let tail = captures.get(3).map_or("", |m| m.as_str());
        if !strip_comments(tail, &mut in_block_comment).is_empty() {
            return Err(Error::NotAStatement(line_no));
        }

        prefs.push((key, value));
    }

    Ok(prefs)
}

/// Skip leading whitespace and comments in `line`.
///
/// `in_block_comment` carries an unterminated `/*` over to the next line.
/// Returns what is left, which is empty if the rest of the line is comment.
fn strip_comments<'a>(
    mut line: &'a str,
    in_block_comment: &mut bool,
) -> &'a str {
    loop {
        if *in_block_comment {
            match line.find("*/") {
                Some(end) => {
                    *in_block_comment = false;
                    line = &line[end + 2..];
                },
                None => return "",
            }
        }

        line = line.trim_start();
        if let Some(rest) = line.strip_prefix("/*") {
            *in_block_comment = true;
            line = rest;
        } else if line.starts_with("//") {
            return "";
        } else {
            return line.trim_end();
        }
    }
}

fn parse_value(raw: &str, line_no: usize) -> Result<PrefValue, Error> {
    match raw {
        "true" => Ok(PrefValue::Bool(true)),
        "false" => Ok(PrefValue::Bool(false)),
        _ if raw.starts_with('"') => unescape(&raw[1..raw.len() - 1])
            .map(PrefValue::String)
            .ok_or(Error::InvalidEscape(line_no)),
        _ => raw
            .trim_start_matches('+')
            .parse::<i32>()
            .map(PrefValue::Int)
            .map_err(|_| Error::IntegerOutOfRange(line_no)),
    }
}

/// Decode the backslash escapes of a quoted string body.
///
/// Returns `None` if an escape is malformed.
fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if '\\' != c {
            out.push(c);
            continue;
        }

        match chars.next()? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'x' => {
                let code = take_hex(&mut chars, 2)?;
                out.push(char::from_u32(code)?);
            },
            'u' => {
                let mut code = take_hex(&mut chars, 4)?;
                if (0xD800..0xDC00).contains(&code) {
                    // High surrogate; the low half must follow as another
                    // \u escape.
                    if Some('\\') != chars.next() || Some('u') != chars.next()
                    {
                        return None;
                    }
                    let low = take_hex(&mut chars, 4)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return None;
                    }
                    code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                }
                out.push(char::from_u32(code)?);
            },
            // \\, \", \' and anything else stand for themselves
            other => out.push(other),
        }
    }

    Some(out)
}

fn take_hex(chars: &mut std::str::Chars, n: usize) -> Option<u32> {
    let mut code = 0u32;
    for _ in 0..n {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

/// Quote `s` as a preference string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c < ' ' || '\x7F' == c => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            },
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Format one preference as a `user_pref` statement, without the line
/// terminator.
pub fn format_statement(key: &str, value: &PrefValue) -> String {
    let value = match *value {
        PrefValue::String(ref s) => quote(s),
        PrefValue::Bool(b) => b.to_string(),
        PrefValue::Int(i) => i.to_string(),
    };
    format!("user_pref({}, {});", quote(key), value)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_parse() {
        let text = r#"# Mozilla User Preferences

/* Do not edit this file.
 *
 * If you make changes to this file while the application is running,
 * the changes will be overwritten when the application exits.
 */

user_pref("mail.server.server1.hostname", "imap.example.com");
user_pref("mail.server.server1.port", 993);
  user_pref( "mail.server.server1.login_at_startup" , true ) ;
pref("mail.biff.show_alert", false); // trailing comment
sticky_pref("mail.pane_config", -1);
user_pref("mail.identity.id1.sig_file", "C:\\Users\\joe\\sig.txt");
user_pref("mailnews.customHeaders", "X-Quote: \"hi\"\nX-Tab:\t\u00e9\x41");
/* inline */ user_pref("network.proxy.type", +2);
"#;

        assert_eq!(
            vec![
                (
                    "mail.server.server1.hostname".to_owned(),
                    PrefValue::from("imap.example.com"),
                ),
                ("mail.server.server1.port".to_owned(), PrefValue::Int(993)),
                (
                    "mail.server.server1.login_at_startup".to_owned(),
                    PrefValue::Bool(true),
                ),
                ("mail.biff.show_alert".to_owned(), PrefValue::Bool(false)),
                ("mail.pane_config".to_owned(), PrefValue::Int(-1)),
                (
                    "mail.identity.id1.sig_file".to_owned(),
                    PrefValue::from("C:\\Users\\joe\\sig.txt"),
                ),
                (
                    "mailnews.customHeaders".to_owned(),
                    PrefValue::from("X-Quote: \"hi\"\nX-Tab:\t\u{e9}A"),
                ),
                ("network.proxy.type".to_owned(), PrefValue::Int(2)),
            ],
            parse(text).unwrap()
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Err(Error::NotAStatement(2)),
            parse("// ok\nuser_pref(\"foo\", bar);\n")
        );
        assert_eq!(
            Err(Error::NotAStatement(1)),
            parse("user_pref(\"foo\", \"a); // b\n")
        );
        assert_eq!(
            Err(Error::IntegerOutOfRange(1)),
            parse("user_pref(\"foo\", 99999999999);")
        );
        assert_eq!(
            Err(Error::InvalidEscape(1)),
            parse("user_pref(\"foo\", \"\\xZZ\");")
        );
        // Unterminated block comment swallows the rest of the file
        assert_eq!(Ok(vec![]), parse("/* user_pref(\"foo\", 1);\n"));        assert_eq!(
            Err(Error::NotAStatement(1)),
            parse("user_pref(\"foo\", 1); user_pref(\"bar\", 2);\n")
        );
        assert_eq!(
            Err(Error::NotAStatement(1)),
            parse("user_pref(\"foo\", 1); /* note */ junk\n")
        );
    }

    #[test]
    fn test_trailing_block_comments() {
        assert_eq!(
            Ok(vec![("a".to_owned(), PrefValue::Int(1))]),
            parse("user_pref(\"a\", 1); /* note */\n")
        );
        assert_eq!(
            Ok(vec![
                ("a".to_owned(), PrefValue::Int(1)),
                ("b".to_owned(), PrefValue::Bool(true)),
            ]),
            parse(
                "user_pref(\"a\", 1); /* start\n\
                 user_pref(\"ignored\", 2);\n\
                 end */ user_pref(\"b\", true); /* x */ // y\n"
            )
        );
        // Comment markers inside strings are just text
        assert_eq!(
            Ok(vec![("c".to_owned(), PrefValue::from("/* not */"))]),
            parse("user_pref(\"c\", \"/* not */\"); /*/ still\n*/\n")
        );
    }

    #[test]
    fn test_surrogate_pairs() {
        assert_eq!(Some("\u{1F600}".to_owned()), unescape("\\ud83d\\ude00"));
        assert_eq!(None, unescape("\\ud83d"));
        assert_eq!(None, unescape("\\ud83d\\u0041"));
    }

    #[test]
    fn test_format_statement() {
        assert_eq!(
            "user_pref(\"mail.server.server1.directory\", \
             \"/home/joe/.thunderbird/x/ImapMail/host1\");",
            format_statement(
                "mail.server.server1.directory",
                &PrefValue::from("/home/joe/.thunderbird/x/ImapMail/host1"),
            )
        );
        assert_eq!(
            "user_pref(\"a\", true);",
            format_statement("a", &PrefValue::Bool(true))
        );
        assert_eq!(
            "user_pref(\"a\", -42);",
            format_statement("a", &PrefValue::Int(-42))
        );
        assert_eq!("\"a\\\\b\\\"c\\nd\\u0001\"", quote("a\\b\"c\nd\x01"));
    }

    proptest! {
        #[test]
        fn quoted_strings_parse_back(key in ".*", value in ".*") {
            let statement =
                format_statement(&key, &PrefValue::String(value.clone()));
            let parsed = parse(&statement).unwrap();
            prop_assert_eq!(vec![(key, PrefValue::String(value))], parsed);
        }
    }
}
