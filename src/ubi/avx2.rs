//! AVX2 block step for the 512-bit engine.
//!
//! The state lives as even/odd interleaves: `a = {x0,x2,x4,x6}` holds the
//! MIX addends and `b = {x1,x3,x5,x7}` the rotated halves, so one round is
//! two vector ops plus a per-lane rotate. The word permutation between
//! rounds reduces to 4-lane permutes of `b`; the patterns are self-inverse
//! and compose so that `b` is back in canonical order at every injection.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use core::mem;

use static_assertions::const_assert_eq;

use crate::threefish::{KS_PARITY, ROT_512};

const_assert_eq!(super::Ubi512::BLOCK_BYTES, 2 * mem::size_of::<__m256i>());

// lane -> MIX pair index for each round within the period
const LANE_ROT: [[usize; 4]; 4] = [
    [0, 1, 2, 3],
    [3, 0, 1, 2],
    [2, 3, 0, 1],
    [1, 2, 3, 0],
];

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn rotl_each(x: __m256i, r: [u32; 4]) -> __m256i {
    let left = _mm256_setr_epi64x(r[0] as i64, r[1] as i64, r[2] as i64, r[3] as i64);
    let right = _mm256_setr_epi64x(
        (64 - r[0]) as i64,
        (64 - r[1]) as i64,
        (64 - r[2]) as i64,
        (64 - r[3]) as i64,
    );
    _mm256_or_si256(_mm256_sllv_epi64(x, left), _mm256_srlv_epi64(x, right))
}

#[inline]
#[target_feature(enable = "avx2")]
pub(super) unsafe fn process_block(chain: &mut [u64; 8], t0: u64, t1: u64, block: &[u8]) {
    debug_assert_eq!(block.len(), super::Ubi512::BLOCK_BYTES);

    let mut ks = [KS_PARITY; 9];
    for i in 0..8 {
        ks[i] = chain[i];
        ks[8] ^= chain[i];
    }
    let ts = [t0, t1, t0 ^ t1];

    let mut w = [0u64; 8];
    for (wi, chunk) in w.iter_mut().zip(block.chunks_exact(8)) {
        *wi = u64::from_le_bytes(chunk.try_into().unwrap());
    }

    // initial whitening, already interleaved
    let mut a = _mm256_setr_epi64x(
        w[0].wrapping_add(ks[0]) as i64,
        w[2].wrapping_add(ks[2]) as i64,
        w[4].wrapping_add(ks[4]) as i64,
        w[6].wrapping_add(ks[6]).wrapping_add(ts[1]) as i64,
    );
    let mut b = _mm256_setr_epi64x(
        w[1].wrapping_add(ks[1]) as i64,
        w[3].wrapping_add(ks[3]) as i64,
        w[5].wrapping_add(ks[5]).wrapping_add(ts[0]) as i64,
        w[7].wrapping_add(ks[7]) as i64,
    );

    for r in 1..=9usize {
        for d in 0..8 {
            let lane = &LANE_ROT[d % 4];
            let rot = [
                ROT_512[d][lane[0]],
                ROT_512[d][lane[1]],
                ROT_512[d][lane[2]],
                ROT_512[d][lane[3]],
            ];
            a = _mm256_add_epi64(a, b);
            b = _mm256_xor_si256(rotl_each(b, rot), a);
            b = if d % 2 == 0 {
                _mm256_permute4x64_epi64::<0xB1>(b)
            } else {
                _mm256_permute4x64_epi64::<0x1B>(b)
            };
            if d % 4 == 3 {
                let s = 2 * r - (d == 3) as usize;
                let ka = [
                    ks[s % 9],
                    ks[(s + 2) % 9],
                    ks[(s + 4) % 9],
                    ks[(s + 6) % 9].wrapping_add(ts[(s + 1) % 3]),
                ];
                let kb = [
                    ks[(s + 1) % 9],
                    ks[(s + 3) % 9],
                    ks[(s + 5) % 9].wrapping_add(ts[s % 3]),
                    ks[(s + 7) % 9].wrapping_add(s as u64),
                ];
                a = _mm256_add_epi64(a, _mm256_loadu_si256(ka.as_ptr() as *const __m256i));
                b = _mm256_add_epi64(b, _mm256_loadu_si256(kb.as_ptr() as *const __m256i));
            }
        }
    }

    let mut xa = [0u64; 4];
    let mut xb = [0u64; 4];
    _mm256_storeu_si256(xa.as_mut_ptr() as *mut __m256i, a);
    _mm256_storeu_si256(xb.as_mut_ptr() as *mut __m256i, b);

    for i in 0..4 {
        chain[2 * i] = xa[i] ^ w[2 * i];
        chain[2 * i + 1] = xb[i] ^ w[2 * i + 1];
    }
}
