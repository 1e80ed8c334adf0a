use std::fmt;

use url::Url;

/// Resolves a `Location` header value against the URL of the request that
/// received it.
///
/// Returns `None` when the value is not UTF-8, or when either URL fails to
/// parse.
pub(crate) fn resolve_location(base: &str, location: &[u8]) -> Option<Url> {
    let location = std::str::from_utf8(location).ok()?.trim();
    if location.is_empty() {
        return None;
    }
    let base = match Url::parse(base) {
        Ok(base) => base,
        Err(e) => {
            log::trace!("request url is not absolute: {e}");
            return None;
        }
    };
    match base.join(location) {
        Ok(url) => Some(url),
        Err(e) => {
            log::debug!("Location header had invalid URI: {e:?}");
            None
        }
    }
}

/// Compares the host component of two URLs, ignoring scheme and port.
///
/// A URL that fails to parse, or that has no host, never matches anything.
pub(crate) fn same_host(a: &str, b: &str) -> bool {
    match (host_of(a), host_of(b)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(&b),
        _ => false,
    }
}

fn host_of(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.host_str().map(str::to_owned)
}

pub(crate) struct Escape<'a>(&'a [u8]);

impl<'a> Escape<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Escape(bytes)
    }
}

impl fmt::Debug for Escape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b\"{}\"", self)?;
        Ok(())
    }
}

impl fmt::Display for Escape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &c in self.0 {
            // https://doc.rust-lang.org/reference.html#byte-escapes
            if c == b'\n' {
                write!(f, "\\n")?;
            } else if c == b'\r' {
                write!(f, "\\r")?;
            } else if c == b'\t' {
                write!(f, "\\t")?;
            } else if c == b'\\' || c == b'"' {
                write!(f, "\\{}", c as char)?;
            } else if c == b'\0' {
                write!(f, "\\0")?;
            // ASCII printable
            } else if (0x20..0x7f).contains(&c) {
                write!(f, "{}", c as char)?;
            } else {
                write!(f, "\\x{c:02x}")?;
            }
        }
        Ok(())
    }
}
