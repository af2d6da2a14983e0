//! The Threefish tweakable block ciphers underlying Skein.
//!
//! Each cipher instance is built per block from a key (the UBI chaining
//! value) and a 128-bit tweak. The round function is pure ARX: W/2 MIX
//! operations per round, a word permutation folded into the MIX pair
//! schedule, and a subkey injection every four rounds.

/// Key schedule parity constant, `C240`.
pub(crate) const KS_PARITY: u64 = 0x1BD1_1BDA_A9FC_1A22;

/// Rotation amounts, indexed by round-within-period and MIX pair.
pub(crate) const ROT_256: [[u32; 2]; 8] = [
    [14, 16],
    [52, 57],
    [23, 40],
    [5, 37],
    [25, 33],
    [46, 12],
    [58, 22],
    [32, 32],
];

pub(crate) const ROT_512: [[u32; 4]; 8] = [
    [46, 36, 19, 37],
    [33, 27, 14, 42],
    [17, 49, 36, 39],
    [44, 9, 54, 56],
    [39, 30, 34, 24],
    [13, 50, 10, 17],
    [25, 29, 39, 43],
    [8, 35, 56, 22],
];

pub(crate) const ROT_1024: [[u32; 8]; 8] = [
    [24, 13, 8, 47, 8, 17, 22, 37],
    [38, 19, 10, 55, 49, 18, 23, 52],
    [33, 4, 51, 13, 34, 41, 59, 17],
    [5, 20, 48, 41, 47, 28, 16, 25],
    [41, 9, 37, 31, 12, 47, 44, 30],
    [16, 34, 56, 51, 4, 53, 42, 41],
    [31, 44, 47, 46, 19, 42, 44, 25],
    [9, 48, 35, 52, 23, 31, 37, 20],
];

/// MIX pair schedule: the word permutation between rounds has period 4, so
/// four tables of (a, b) index pairs cover every round. `ROT_*[d % 8][j]`
/// rotates pair `j` of `PAIRS_*[d % 4]`.
pub(crate) const PAIRS_256: [[(usize, usize); 2]; 4] = [
    [(0, 1), (2, 3)],
    [(0, 3), (2, 1)],
    [(0, 1), (2, 3)],
    [(0, 3), (2, 1)],
];

pub(crate) const PAIRS_512: [[(usize, usize); 4]; 4] = [
    [(0, 1), (2, 3), (4, 5), (6, 7)],
    [(2, 1), (4, 7), (6, 5), (0, 3)],
    [(4, 1), (6, 3), (0, 5), (2, 7)],
    [(6, 1), (0, 7), (2, 5), (4, 3)],
];

pub(crate) const PAIRS_1024: [[(usize, usize); 8]; 4] = [
    [(0, 1), (2, 3), (4, 5), (6, 7), (8, 9), (10, 11), (12, 13), (14, 15)],
    [(0, 9), (2, 13), (6, 11), (4, 15), (10, 7), (12, 3), (14, 5), (8, 1)],
    [(0, 7), (2, 5), (4, 3), (6, 1), (12, 15), (14, 13), (8, 11), (10, 9)],
    [(0, 15), (2, 11), (6, 13), (4, 9), (14, 1), (8, 5), (10, 3), (12, 7)],
];

macro_rules! define_threefish {
    ($name:ident, $words:expr, $rounds:expr, $rot:ident, $pairs:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone)]
        pub struct $name {
            ks: [u64; $words + 1],
            ts: [u64; 3],
        }

        impl $name {
            pub const BLOCK_WORDS: usize = $words;
            pub const BLOCK_BYTES: usize = $words * 8;

            /// Derives the key and tweak schedules for one block.
            pub fn new(key: &[u64; $words], tweak: [u64; 2]) -> Self {
                let mut ks = [KS_PARITY; $words + 1];
                for i in 0..$words {
                    ks[i] = key[i];
                    ks[$words] ^= key[i];
                }
                Self {
                    ks,
                    ts: [tweak[0], tweak[1], tweak[0] ^ tweak[1]],
                }
            }

            pub fn encrypt_block(&self, x: &mut [u64; $words]) {
                let ks = &self.ks;
                let ts = &self.ts;

                for i in 0..$words {
                    x[i] = x[i].wrapping_add(ks[i]);
                }
                x[$words - 3] = x[$words - 3].wrapping_add(ts[0]);
                x[$words - 2] = x[$words - 2].wrapping_add(ts[1]);

                let mut s = 0;
                for d in 0..$rounds {
                    let rot = &$rot[d % 8];
                    let pairs = &$pairs[d % 4];
                    for j in 0..$words / 2 {
                        let (a, b) = pairs[j];
                        x[a] = x[a].wrapping_add(x[b]);
                        x[b] = x[b].rotate_left(rot[j]) ^ x[a];
                    }
                    if d % 4 == 3 {
                        s += 1;
                        for i in 0..$words {
                            x[i] = x[i].wrapping_add(ks[(s + i) % ($words + 1)]);
                        }
                        x[$words - 3] = x[$words - 3].wrapping_add(ts[s % 3]);
                        x[$words - 2] = x[$words - 2].wrapping_add(ts[(s + 1) % 3]);
                        // the round counter in the schedule defeats slide attacks
                        x[$words - 1] = x[$words - 1].wrapping_add(s as u64);
                    }
                }
            }

            pub fn decrypt_block(&self, x: &mut [u64; $words]) {
                let ks = &self.ks;
                let ts = &self.ts;

                let mut s = $rounds / 4;
                for d in (0..$rounds).rev() {
                    if d % 4 == 3 {
                        for i in 0..$words {
                            x[i] = x[i].wrapping_sub(ks[(s + i) % ($words + 1)]);
                        }
                        x[$words - 3] = x[$words - 3].wrapping_sub(ts[s % 3]);
                        x[$words - 2] = x[$words - 2].wrapping_sub(ts[(s + 1) % 3]);
                        x[$words - 1] = x[$words - 1].wrapping_sub(s as u64);
                        s -= 1;
                    }
                    let rot = &$rot[d % 8];
                    let pairs = &$pairs[d % 4];
                    for j in 0..$words / 2 {
                        let (a, b) = pairs[j];
                        x[b] = (x[b] ^ x[a]).rotate_right(rot[j]);
                        x[a] = x[a].wrapping_sub(x[b]);
                    }
                }

                for i in 0..$words {
                    x[i] = x[i].wrapping_sub(ks[i]);
                }
                x[$words - 3] = x[$words - 3].wrapping_sub(ts[0]);
                x[$words - 2] = x[$words - 2].wrapping_sub(ts[1]);
            }
        }
    };
}

define_threefish!(Threefish256, 4, 72, ROT_256, PAIRS_256, "Threefish-256: 4 words, 72 rounds.");
define_threefish!(Threefish512, 8, 72, ROT_512, PAIRS_512, "Threefish-512: 8 words, 72 rounds.");
define_threefish!(Threefish1024, 16, 80, ROT_1024, PAIRS_1024, "Threefish-1024: 16 words, 80 rounds.");

#[cfg(test)]
mod test {
    use super::*;

    fn splitmix(seed: &mut u64) -> u64 {
        *seed = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = *seed;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    macro_rules! roundtrip {
        ($name:ident, $cipher:ident, $words:expr) => {
            #[test]
            fn $name() {
                let mut seed = 0x0123_4567_89AB_CDEF;
                for _ in 0..64 {
                    let mut key = [0u64; $words];
                    for k in key.iter_mut() {
                        *k = splitmix(&mut seed);
                    }
                    let tweak = [splitmix(&mut seed), splitmix(&mut seed)];
                    let mut block = [0u64; $words];
                    for b in block.iter_mut() {
                        *b = splitmix(&mut seed);
                    }

                    let cipher = $cipher::new(&key, tweak);
                    let plain = block;
                    cipher.encrypt_block(&mut block);
                    assert_ne!(block, plain);
                    cipher.decrypt_block(&mut block);
                    assert_eq!(block, plain);
                }
            }
        };
    }

    roundtrip!(roundtrip_256, Threefish256, 4);
    roundtrip!(roundtrip_512, Threefish512, 8);
    roundtrip!(roundtrip_1024, Threefish1024, 16);

    #[test]
    fn tweak_separates() {
        let key = [0u64; 8];
        let mut a = [0u64; 8];
        let mut b = [0u64; 8];
        Threefish512::new(&key, [0, 0]).encrypt_block(&mut a);
        Threefish512::new(&key, [1, 0]).encrypt_block(&mut b);
        assert_ne!(a, b);
    }
}
