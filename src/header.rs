//! Ordered header lists.
//!
//! Headers cross the service boundary as raw `(name, value)` byte pairs in
//! the order they were given. Names may repeat and keep whatever casing the
//! caller used; every lookup compares names ASCII case-insensitively.

use std::fmt;
use std::slice;

use bytes::Bytes;

use crate::util::Escape;

/// The `Location` header name.
pub const LOCATION: &str = "location";
/// The `Authorization` header name.
pub const AUTHORIZATION: &str = "authorization";
/// The `Cookie` header name.
pub const COOKIE: &str = "cookie";
/// The obsolete `Cookie2` header name.
pub const COOKIE2: &str = "cookie2";
/// The `Proxy-Authorization` header name.
pub const PROXY_AUTHORIZATION: &str = "proxy-authorization";
/// The `WWW-Authenticate` header name.
pub const WWW_AUTHENTICATE: &str = "www-authenticate";

/// An ordered sequence of header `(name, value)` pairs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(Bytes, Bytes)>,
}

impl HeaderList {
    /// Create an empty `HeaderList`.
    pub fn new() -> HeaderList {
        HeaderList::default()
    }

    /// Append a header, keeping any existing headers with the same name.
    pub fn push<K, V>(&mut self, name: K, value: V)
    where
        K: Into<Bytes>,
        V: Into<Bytes>,
    {
        self.entries.push((name.into(), value.into()));
    }

    /// Append a header and return the list, for chaining.
    pub fn with<K, V>(mut self, name: K, value: V) -> HeaderList
    where
        K: Into<Bytes>,
        V: Into<Bytes>,
    {
        self.push(name, value);
        self
    }

    /// Get the first value for `name`.
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&Bytes> {
        let name = name.as_ref();
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Get every value for `name`, in order.
    pub fn get_all<'a>(&'a self, name: impl AsRef<[u8]> + 'a) -> impl Iterator<Item = &'a Bytes> {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name.as_ref()))
            .map(|(_, v)| v)
    }

    /// Returns true if at least one header is named `name`.
    pub fn contains(&self, name: impl AsRef<[u8]>) -> bool {
        self.get(name).is_some()
    }

    /// Returns a new list without any header whose name matches one of
    /// `names`. The remaining headers keep their relative order.
    pub fn without<N>(&self, names: &[N]) -> HeaderList
    where
        N: AsRef<[u8]>,
    {
        if names.is_empty() {
            return self.clone();
        }
        self.entries
            .iter()
            .filter(|(k, _)| !names.iter().any(|n| k.eq_ignore_ascii_case(n.as_ref())))
            .cloned()
            .collect()
    }

    /// Iterate over the `(name, value)` pairs in order.
    pub fn iter(&self) -> slice::Iter<'_, (Bytes, Bytes)> {
        self.entries.iter()
    }

    /// Number of headers, counting repeats.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderList
where
    K: Into<Bytes>,
    V: Into<Bytes>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        HeaderList {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for HeaderList
where
    K: Into<Bytes>,
    V: Into<Bytes>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = &'a (Bytes, Bytes);
    type IntoIter = slice::Iter<'a, (Bytes, Bytes)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for HeaderList {
    type Item = (Bytes, Bytes);
    type IntoIter = std::vec::IntoIter<(Bytes, Bytes)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Debug for HeaderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|(k, v)| (Escape::new(k), Escape::new(v))),
            )
            .finish()
    }
}
