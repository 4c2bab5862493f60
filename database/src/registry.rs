/// Single-byte prefixes partitioning the key space between stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DatabaseStorePrefixes {
    BlockNodes = 1,

    // ---- Reserved for tests ----
    Tests = 250,
}

impl DatabaseStorePrefixes {
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

impl AsRef<[u8]> for DatabaseStorePrefixes {
    fn as_ref(&self) -> &[u8] {
        match self {
            DatabaseStorePrefixes::BlockNodes => &[1],
            DatabaseStorePrefixes::Tests => &[250],
        }
    }
}

impl From<DatabaseStorePrefixes> for Vec<u8> {
    fn from(value: DatabaseStorePrefixes) -> Self {
        vec![value.byte()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_bytes_match_discriminants() {
        for prefix in [DatabaseStorePrefixes::BlockNodes, DatabaseStorePrefixes::Tests] {
            assert_eq!(prefix.as_ref(), &[prefix.byte()]);
            assert_eq!(Vec::<u8>::from(prefix), vec![prefix.byte()]);
        }
    }
}
