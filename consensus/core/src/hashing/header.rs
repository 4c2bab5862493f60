use super::HasherExtensions;
use crate::header::Header;
use blockdag_hashes::{Hash, HasherBase};

/// Returns the header hash using the provided nonce+timestamp instead of those in the header.
#[inline]
pub fn hash_override_nonce_time(header: &Header, nonce: u64, timestamp: i64) -> Hash {
    let mut hasher = blockdag_hashes::BlockHash::new();
    hasher.update(header.version.to_le_bytes()).write_var_array(&header.parents);

    hasher
        .update(header.hash_merkle_root)
        .update(header.accepted_id_merkle_root)
        .update(header.utxo_commitment)
        .update(timestamp.to_le_bytes())
        .update(header.bits.to_le_bytes())
        .update(nonce.to_le_bytes());

    hasher.finalize()
}

/// Returns the header hash.
pub fn hash(header: &Header) -> Hash {
    hash_override_nonce_time(header, header.nonce, header.timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockhash;

    #[test]
    fn test_header_hashing() {
        let header = Header::new_finalized(1, vec![1.into()], Default::default(), Default::default(), Default::default(), 234, 23, 567);
        assert_ne!(blockhash::NONE, header.hash);
        assert_eq!(hash(&header), header.hash);
    }

    #[test]
    fn test_every_field_is_committed() {
        let base = Header::new_finalized(1, vec![1.into(), 2.into()], 3.into(), 4.into(), 5.into(), 6, 7, 8);
        let mut variants = vec![];
        let mut h = base.clone();
        h.version = 2;
        variants.push(h);
        let mut h = base.clone();
        h.parents.reverse();
        variants.push(h);
        let mut h = base.clone();
        h.parents.push(9.into());
        variants.push(h);
        let mut h = base.clone();
        h.hash_merkle_root = 10.into();
        variants.push(h);
        let mut h = base.clone();
        h.accepted_id_merkle_root = 10.into();
        variants.push(h);
        let mut h = base.clone();
        h.utxo_commitment = 10.into();
        variants.push(h);
        let mut h = base.clone();
        h.timestamp += 1;
        variants.push(h);
        let mut h = base.clone();
        h.bits += 1;
        variants.push(h);

        for variant in variants {
            assert_ne!(hash(&variant), base.hash);
        }
        assert_ne!(hash_override_nonce_time(&base, 9, base.timestamp), base.hash);
    }
}
