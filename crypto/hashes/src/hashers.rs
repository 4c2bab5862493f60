use crate::Hash;
use blake2b_simd::{Params, State};

pub trait HasherBase {
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self;
}

pub trait Hasher: HasherBase + Clone + Default {
    fn finalize(self) -> Hash;
    fn reset(&mut self);
    #[inline(always)]
    fn hash<A: AsRef<[u8]>>(data: A) -> Hash {
        let mut hasher = Self::default();
        hasher.update(data);
        hasher.finalize()
    }
}

macro_rules! blake2b_hasher {
    ($(struct $name:ident => $domain_sep:literal),+ $(,)? ) => {$(
        #[derive(Clone)]
        pub struct $name(State);

        impl $name {
            #[inline(always)]
            pub fn new() -> Self {
                Self(Params::new().hash_length(32).key($domain_sep).to_state())
            }

            pub fn write<A: AsRef<[u8]>>(&mut self, data: A) {
                self.0.update(data.as_ref());
            }

            #[inline(always)]
            pub fn finalize(self) -> Hash {
                let mut out = [0u8; 32];
                out.copy_from_slice(self.0.finalize().as_bytes());
                Hash(out)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl HasherBase for $name {
            #[inline(always)]
            fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
                self.write(data);
                self
            }
        }

        impl Hasher for $name {
            #[inline(always)]
            fn finalize(self) -> Hash {
                // Call the method
                $name::finalize(self)
            }

            fn reset(&mut self) {
                *self = Self::new();
            }
        }
    )*};
}

blake2b_hasher! {
    struct BlockHash => b"BlockHash",
}
