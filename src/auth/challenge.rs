//! WWW-Authenticate challenge parsing (RFC 7235 section 4.1)
//!
//! A single header value may carry several comma-separated challenges, and a
//! response may carry several header values. Each challenge is an auth-scheme
//! token followed by either a token68 or a list of auth-params whose values
//! are tokens or quoted strings.

use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};
use std::collections::BTreeMap;
use std::fmt;

/// One parsed authentication challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    scheme: String,
    realm: Option<String>,
    params: BTreeMap<String, String>,
    token68: Option<String>,
}

impl Challenge {
    /// Create a challenge from a scheme name, optional realm and parameters.
    /// Parameter names are stored lowercased; a `realm` entry in `params`
    /// is lifted into the realm field.
    pub fn new<I, K, V>(scheme: impl Into<String>, realm: Option<&str>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut challenge = Self {
            scheme: scheme.into(),
            realm: realm.map(String::from),
            params: BTreeMap::new(),
            token68: None,
        };
        for (key, value) in params {
            challenge.set_param(key.as_ref(), value.into());
        }
        challenge
    }

    /// Challenge carrying only a scheme and realm
    pub fn with_realm(scheme: impl Into<String>, realm: &str) -> Self {
        let mut challenge = Self::bare(scheme.into());
        challenge.realm = Some(realm.to_string());
        challenge
    }

    fn bare(scheme: String) -> Self {
        Self {
            scheme,
            realm: None,
            params: BTreeMap::new(),
            token68: None,
        }
    }

    fn set_param(&mut self, key: &str, value: String) {
        let key = key.to_ascii_lowercase();
        if key == "realm" {
            self.realm = Some(value);
        } else {
            self.params.insert(key, value);
        }
    }

    /// Scheme name as sent by the server
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Case-insensitive scheme name comparison
    pub fn is_scheme(&self, name: &str) -> bool {
        self.scheme.eq_ignore_ascii_case(name)
    }

    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    /// Look up an auth-param (case-insensitive name); `realm` is not included
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn token68(&self) -> Option<&str> {
        self.token68.as_deref()
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scheme)?;
        if let Some(ref token) = self.token68 {
            return write!(f, " {}", token);
        }
        let mut sep = " ";
        if let Some(ref realm) = self.realm {
            write!(f, "{}realm=\"{}\"", sep, quote_escape(realm))?;
            sep = ", ";
        }
        for (key, value) in &self.params {
            write!(f, "{}{}=\"{}\"", sep, key, quote_escape(value))?;
            sep = ", ";
        }
        Ok(())
    }
}

fn quote_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Parse every WWW-Authenticate header in a response, preserving order
pub fn parse_challenges(headers: &HeaderMap) -> Vec<Challenge> {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .flat_map(|value| parse_header_value(&String::from_utf8_lossy(value.as_bytes())))
        .collect()
}

/// Parse a single WWW-Authenticate header value into its challenges.
///
/// Parsing is lenient: unparseable fragments are skipped rather than
/// discarding the whole header.
pub fn parse_header_value(value: &str) -> Vec<Challenge> {
    let mut cursor = Cursor::new(value);
    let mut challenges = Vec::new();

    loop {
        cursor.skip_list_separators();
        if cursor.at_end() {
            break;
        }

        let scheme = cursor.read_token();
        if scheme.is_empty() {
            // Not a token start; drop everything up to the next comma
            cursor.skip_until_comma();
            continue;
        }

        let mut challenge = Challenge::bare(scheme);
        cursor.skip_ws();

        if let Some(token) = cursor.try_token68() {
            challenge.token68 = Some(token);
            challenges.push(challenge);
            continue;
        }

        // auth-params, possibly none
        loop {
            let mark = cursor.pos;
            cursor.skip_list_separators();
            match cursor.try_auth_param() {
                Some((key, value)) => challenge.set_param(&key, value),
                None => {
                    // Either the end or the start of the next challenge
                    cursor.pos = mark;
                    break;
                }
            }
        }
        challenges.push(challenge);
    }

    challenges
}

fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn is_token68_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-._~+/".contains(&b)
}

struct Cursor<'a> {
    s: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { s: s.as_bytes(), pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.s.len()
    }

    fn peek(&self) -> Option<u8> {
        self.s.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    fn skip_list_separators(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t') | Some(b',')) {
            self.pos += 1;
        }
    }

    fn skip_until_comma(&mut self) {
        while let Some(b) = self.peek() {
            if b == b',' {
                break;
            }
            self.pos += 1;
        }
    }

    fn read_token(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_tchar) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.s[start..self.pos]).into_owned()
    }

    /// token68 directly after the scheme: its characters, optional trailing
    /// '=' padding, then end of input or a comma.
    fn try_token68(&mut self) -> Option<String> {
        let start = self.pos;
        let mut end = start;
        while self.s.get(end).copied().is_some_and(is_token68_char) {
            end += 1;
        }
        if end == start {
            return None;
        }
        while self.s.get(end) == Some(&b'=') {
            end += 1;
        }
        let mut after = end;
        while matches!(self.s.get(after), Some(b' ') | Some(b'\t')) {
            after += 1;
        }
        // An auth-param always has a value after '=', so anything ending
        // here can only be a token68.
        if after < self.s.len() && self.s[after] != b',' {
            return None;
        }
        self.pos = after;
        Some(String::from_utf8_lossy(&self.s[start..end]).into_owned())
    }

    /// `token BWS "=" BWS ( token / quoted-string )`; restores the position
    /// and returns `None` when the input does not start with a parameter.
    fn try_auth_param(&mut self) -> Option<(String, String)> {
        let start = self.pos;
        let key = self.read_token();
        if key.is_empty() {
            self.pos = start;
            return None;
        }
        self.skip_ws();
        if self.peek() != Some(b'=') {
            self.pos = start;
            return None;
        }
        self.pos += 1;
        self.skip_ws();
        let value = if self.peek() == Some(b'"') {
            self.read_quoted()
        } else {
            self.read_token()
        };
        self.skip_ws();
        Some((key, value))
    }

    fn read_quoted(&mut self) -> String {
        // Opening quote
        self.pos += 1;
        let mut out = Vec::new();
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'"' => break,
                b'\\' => {
                    if let Some(escaped) = self.peek() {
                        out.push(escaped);
                        self.pos += 1;
                    }
                }
                _ => out.push(b),
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}
