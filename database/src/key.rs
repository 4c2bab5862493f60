use std::{
    fmt::{Debug, Display},
    str,
};

pub const SEP: u8 = b'/';
pub const SEP_SIZE: usize = 1;

/// A full rocksdb key: `<prefix>/<key bytes>`
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DbKey {
    path: Vec<u8>,
    prefix_len: usize,
}

impl DbKey {
    pub fn new<TKey: AsRef<[u8]>>(prefix: &[u8], key: TKey) -> Self {
        let key = key.as_ref();
        let mut path = Vec::with_capacity(prefix.len() + SEP_SIZE + key.len());
        path.extend_from_slice(prefix);
        path.push(SEP);
        path.extend_from_slice(key);
        // `SEP` counts as part of the prefix
        Self { path, prefix_len: prefix.len() + SEP_SIZE }
    }

    pub fn prefix_only(prefix: &[u8]) -> Self {
        Self::new(prefix, [0u8; 0])
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// The key bytes following the prefix and separator
    pub fn key(&self) -> &[u8] {
        &self.path[self.prefix_len..]
    }
}

impl AsRef<[u8]> for DbKey {
    fn as_ref(&self) -> &[u8] {
        &self.path
    }
}

impl Display for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (prefix, key) = self.path.split_at(self.prefix_len);
        match str::from_utf8(prefix) {
            Ok(s) if s.chars().all(|c| !c.is_control()) => f.write_str(s)?,
            _ => {
                f.write_str(&faster_hex::hex_string(&prefix[..prefix.len() - SEP_SIZE]))?;
                f.write_str("/")?;
            }
        }
        f.write_str(&faster_hex::hex_string(key))
    }
}

impl Debug for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self, f)
    }
}
