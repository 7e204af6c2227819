//! Parameter serialization and URL escaping.
//!
//! GET parameters travel in the query string, each value escaped on its
//! own. POST parameters are serialized as an
//! `application/x-www-form-urlencoded` body where both keys and values
//! are escaped and space becomes `+`.
//!
//! All escaping works on the UTF-8 bytes of the input, one `%XX` per
//! escaped byte.

use std::fmt;

/// A scalar parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Text value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value, serialized as `true`/`false`.
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(v) => write!(f, "{}", v),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Key/value parameters sent with a request.
///
/// Entries keep their insertion order, which is also the order they are
/// serialized in. An entry whose value is `None` is kept in the mapping
/// but dropped from serialization, never sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Option<Scalar>)>,
}

impl Params {
    /// An empty parameter mapping.
    pub fn new() -> Params {
        Params::default()
    }

    /// Append an entry, chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Params {
        self.insert(key, Some(value.into()));
        self
    }

    /// Append an entry that may be absent, chaining.
    pub fn with_opt(
        mut self,
        key: impl Into<String>,
        value: Option<impl Into<Scalar>>,
    ) -> Params {
        self.insert(key, value.map(Into::into));
        self
    }

    /// Append an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<Scalar>) {
        self.entries.push((key.into(), value));
    }

    /// Whether serialization would produce any output.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// The entries that will be sent, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.as_str(), v)))
    }
}

// Bytes a full URL escape leaves alone: unreserved plus the URI
// delimiters `; , / ? : @ & = + $ #`.
fn is_uri_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'_'
                | b'.'
                | b'!'
                | b'~'
                | b'*'
                | b'\''
                | b'('
                | b')'
                | b';'
                | b','
                | b'/'
                | b'?'
                | b':'
                | b'@'
                | b'&'
                | b'='
                | b'+'
                | b'$'
                | b'#'
        )
}

// Bytes a component escape leaves alone: unreserved only.
fn is_component_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(b, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

// Bytes the form serializer leaves alone. Space is handled separately.
fn is_form_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'*' | b'-' | b'.' | b'_')
}

fn escape_into(out: &mut String, input: &str, keep: fn(u8) -> bool, space_as_plus: bool) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    for &b in input.as_bytes() {
        if b == b' ' && space_as_plus {
            out.push('+');
        } else if keep(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
}

/// Escape a whole URL once, preserving the URI delimiters.
pub(crate) fn encode_uri(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    escape_into(&mut out, url, is_uri_byte, false);
    out
}

/// Escape a single value for use inside a query string.
pub(crate) fn encode_uri_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    escape_into(&mut out, value, is_component_byte, false);
    out
}

/// Build the query string for GET: first entry prefixed with `?`, the
/// rest joined with `&`, keys verbatim, values escaped. Empty when no
/// entry serializes.
pub(crate) fn query_string(params: &Params) -> String {
    let mut out = String::new();

    for (key, value) in params.iter() {
        out.push(if out.is_empty() { '?' } else { '&' });
        out.push_str(key);
        out.push('=');
        escape_into(&mut out, &value.to_string(), is_component_byte, false);
    }

    out
}

/// Serialize parameters as an `application/x-www-form-urlencoded` body.
pub(crate) fn form_urlencode(params: &Params) -> String {
    let mut out = String::new();

    for (key, value) in params.iter() {
        if !out.is_empty() {
            out.push('&');
        }
        escape_into(&mut out, key, is_form_byte, true);
        out.push('=');
        escape_into(&mut out, &value.to_string(), is_form_byte, true);
    }

    out
}
