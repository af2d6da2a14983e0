use core::{fmt, marker::PhantomData};

use digest::{
    array::ArraySize,
    block_buffer::Lazy,
    core_api::{
        AlgorithmName, Block, BlockSizeUser, Buffer, BufferKindUser, FixedOutputCore, UpdateCore,
    },
    consts::{U128, U32, U64},
    HashMarker, Output, OutputSizeUser,
};

use crate::ubi::{Skein512Backend, Ubi1024, Ubi256, Ubi512};

macro_rules! define_skein_core {
    ($core:ident, $ubi:ident, $block_size:ty, $alg:literal, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone)]
        pub struct $core<N> {
            state: $ubi,
            _out: PhantomData<N>,
        }

        impl<N> HashMarker for $core<N> {}

        impl<N> BlockSizeUser for $core<N> {
            type BlockSize = $block_size;
        }

        // the final block must carry the final-flag before it is ciphered,
        // so a full buffer is held back until more input proves it non-final
        impl<N> BufferKindUser for $core<N> {
            type BufferKind = Lazy;
        }

        impl<N: ArraySize> OutputSizeUser for $core<N> {
            type OutputSize = N;
        }

        impl<N> Default for $core<N> {
            fn default() -> Self {
                Self {
                    state: $ubi::new(),
                    _out: PhantomData,
                }
            }
        }

        impl<N: ArraySize> AlgorithmName for $core<N> {
            fn write_alg_name(f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($alg, "-{}"), N::USIZE * 8)
            }
        }

        impl<N> UpdateCore for $core<N> {
            #[inline]
            fn update_blocks(&mut self, blocks: &[Block<Self>]) {
                for block in blocks {
                    self.state.process_block(&block[..], $ubi::BLOCK_BYTES);
                }
            }
        }

        impl<N: ArraySize> FixedOutputCore for $core<N> {
            #[inline]
            fn finalize_fixed_core(&mut self, buffer: &mut Buffer<Self>, out: &mut Output<Self>) {
                let pos = buffer.get_pos();
                let block = buffer.pad_with_zeros();
                self.state.finish_message(&block[..pos], false);
                self.state.output_into(&mut out[..]);
            }
        }
    };
}

define_skein_core!(
    Skein256Core,
    Ubi256,
    U32,
    "Skein-256",
    "Core engine with a 256-bit internal state."
);
define_skein_core!(
    Skein512Core,
    Ubi512,
    U64,
    "Skein-512",
    "Core engine with a 512-bit internal state."
);
define_skein_core!(
    Skein1024Core,
    Ubi1024,
    U128,
    "Skein-1024",
    "Core engine with a 1024-bit internal state."
);

impl<N> Skein512Core<N> {
    /// Forces a particular block backend. Returns `None` when the CPU does
    /// not support it.
    pub fn new_with_backend(backend: Skein512Backend) -> Option<Self> {
        Ubi512::with_backend(backend).map(|state| Self {
            state,
            _out: PhantomData,
        })
    }
}

#[cfg(test)]
mod test {
    extern crate alloc;

    use digest::Digest;
    use hex_literal::hex;

    use digest::consts::{U128, U32, U64};

    use crate::{Skein1024, Skein256, Skein512};

    // Skein v1.3 known-answer vectors.

    #[test]
    fn skein256_empty() {
        assert_eq!(
            Skein256::<U32>::digest(b"")[..],
            hex!("c8877087da56e072870daa843f176e9453115929094c3a40c463a196c29bf7ba")[..]
        );
    }

    #[test]
    fn skein256_ff() {
        assert_eq!(
            Skein256::<U32>::digest(b"\xff")[..],
            hex!("0b98dcd198ea0e50a7a244c444e25c23da30c10fc9a1f270a6637f1f34e67ed2")[..]
        );
    }

    #[test]
    fn skein512_empty() {
        assert_eq!(
            Skein512::<U64>::digest(b"")[..],
            hex!(
                "bc5b4c50925519c290cc634277ae3d6257212395cba733bbad37a4af0fa06af4"
                "1fca7903d06564fea7a2d3730dbdb80c1f85562dfcc070334ea4d1d9e72cba7a"
            )[..]
        );
    }

    #[test]
    fn skein512_ff() {
        assert_eq!(
            Skein512::<U64>::digest(b"\xff")[..],
            hex!(
                "71b7bce6fe6452227b9ced6014249e5bf9a9754c3ad618ccc4e0aae16b316cc8"
                "ca698d864307ed3e80b6ef1570812ac5272dc409b5a012df2a579102f340617a"
            )[..]
        );
    }

    #[test]
    fn skein512_fox() {
        assert_eq!(
            Skein512::<U64>::digest(b"The quick brown fox jumps over the lazy dog")[..],
            hex!(
                "94c2ae036dba8783d0b3f7d6cc111ff810702f5c77707999be7e1c9486ff238a"
                "7044de734293147359b4ac7e1d09cd247c351d69826b78dcddd951f0ef912713"
            )[..]
        );
    }

    #[test]
    fn skein1024_empty() {
        assert_eq!(
            Skein1024::<U128>::digest(b"")[..],
            hex!(
                "0fff9563bb3279289227ac77d319b6fff8d7e9f09da1247b72a0a265cd6d2a62"
                "645ad547ed8193db48cff847c06494a03f55666d3b47eb4c20456c9373c86297"
                "d630d5578ebd34cb40991578f9f52b18003efa35d3da6553ff35db91b81ab890"
                "bec1b189b7f52cb2a783ebb7d823d725b0b4a71f6824e88f68f982eefc6d19c6"
            )[..]
        );
    }

    #[test]
    fn skein1024_ff() {
        assert_eq!(
            Skein1024::<U128>::digest(b"\xff")[..],
            hex!(
                "e62c05802ea0152407cdd8787fda9e35703de862a4fbc119cff8590afe79250b"
                "cccc8c3faf1bd2544f95956c8021914ec07077c6e10f71f5ed08180f19543899"
                "fa370ab08fc7ad1b1d290da99f0d4f6e273530f8306cda0a9f9faadc6dbcdf6b"
                "6defe5d906f47a5d5c7649f080587b217904f31ca72d99a7a1c1c081b0bd7e74"
            )[..]
        );
    }

    #[test]
    fn incremental_matches_one_shot() {
        let data: alloc::vec::Vec<u8> = (0u32..2500).map(|i| (i * 97 + 13) as u8).collect();

        let one_shot = Skein512::<U64>::digest(&data);

        let mut h = Skein512::<U64>::new();
        for chunk in data.chunks(67) {
            h.update(chunk);
        }
        assert_eq!(h.finalize(), one_shot);
    }

    // message lengths an exact multiple of the block size must still mark
    // their last block final
    #[test]
    fn block_aligned_messages() {
        for &len in &[32usize, 64, 128, 256] {
            let data = alloc::vec![0x5Au8; len];

            let mut h = Skein512::<U64>::new();
            h.update(&data[..len / 2]);
            h.update(&data[len / 2..]);
            assert_eq!(h.finalize(), Skein512::<U64>::digest(&data));
        }
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[test]
    fn avx2_consistent() {
        use digest::core_api::CoreWrapper;

        use crate::ubi::Skein512Backend;
        use crate::Skein512Core;

        let Some(core) = Skein512Core::new_with_backend(Skein512Backend::Avx2) else {
            return;
        };

        let data = alloc::vec![69u8; 1048574];

        let chash = {
            let mut control = CoreWrapper::from_core(
                Skein512Core::new_with_backend(Skein512Backend::Soft).unwrap(),
            );
            control.update(&data);
            control.finalize()
        };

        let thash = {
            let mut uut: crate::Skein512 = CoreWrapper::from_core(core);
            uut.update(&data);
            uut.finalize()
        };

        assert_eq!(chash, thash);
    }
}
