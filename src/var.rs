//! Runtime-length hashers.
//!
//! The `digest` types fix the output size at the type level; here the
//! digest length is chosen at construction in bits, and input may end on a
//! non-byte boundary. Output lengths are unrestricted: the counter-mode
//! output transform stretches any state size to any digest length, and
//! shorter digests are prefixes of longer ones from the same state size.

use crate::ubi::{Skein512Backend, Ubi1024, Ubi256, Ubi512};

macro_rules! define_skein_var {
    ($var:ident, $ubi:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone)]
        pub struct $var {
            state: $ubi,
            buf: [u8; $ubi::BLOCK_BYTES],
            buf_len: usize,
            output_bits: u64,
            bit_pad: bool,
        }

        impl $var {
            const BLOCK_BYTES: usize = $ubi::BLOCK_BYTES;

            /// Creates a hasher producing `output_bits` bits of digest.
            pub fn new(output_bits: u64) -> Self {
                debug_assert!(output_bits > 0, "zero-length digest requested");
                Self {
                    state: $ubi::new(),
                    buf: [0; Self::BLOCK_BYTES],
                    buf_len: 0,
                    output_bits,
                    bit_pad: false,
                }
            }

            /// Digest length in bytes.
            pub fn output_size(&self) -> usize {
                self.output_bits.div_ceil(8) as usize
            }

            /// Absorbs whole bytes. A buffered block is only ciphered once
            /// further input shows it is not the final one.
            pub fn update(&mut self, mut data: &[u8]) {
                debug_assert!(!self.bit_pad, "input after a bit-length update");
                if data.is_empty() {
                    return;
                }

                if self.buf_len > 0 {
                    let take = (Self::BLOCK_BYTES - self.buf_len).min(data.len());
                    self.buf[self.buf_len..self.buf_len + take].copy_from_slice(&data[..take]);
                    self.buf_len += take;
                    data = &data[take..];
                    if data.is_empty() {
                        return;
                    }
                    self.state.process_block(&self.buf, Self::BLOCK_BYTES);
                    self.buf_len = 0;
                }

                while data.len() > Self::BLOCK_BYTES {
                    self.state
                        .process_block(&data[..Self::BLOCK_BYTES], Self::BLOCK_BYTES);
                    data = &data[Self::BLOCK_BYTES..];
                }

                self.buf[..data.len()].copy_from_slice(data);
                self.buf_len = data.len();
            }

            /// Absorbs `bit_len` bits of `data`. When `bit_len` is not a
            /// multiple of 8 the trailing partial byte is completed with a
            /// 10* marker and the final block is tweaked as bit-padded, so
            /// such a message can never collide with a whole-byte one; no
            /// further input is accepted afterwards.
            pub fn update_bits(&mut self, data: &[u8], bit_len: u64) {
                if bit_len % 8 == 0 {
                    self.update(&data[..(bit_len / 8) as usize]);
                    return;
                }

                let byte_len = (bit_len / 8 + 1) as usize;
                self.update(&data[..byte_len]);

                debug_assert!(self.buf_len > 0);
                let mask = 1u8 << (7 - (bit_len & 7));
                let b = &mut self.buf[self.buf_len - 1];
                *b = (*b & mask.wrapping_neg()) | mask;
                self.bit_pad = true;
            }

            /// Finalizes into `out`, which must hold exactly
            /// [`output_size`](Self::output_size) bytes. When the digest
            /// length is not a multiple of 8 the surplus high bits of the
            /// trailing byte are zero.
            pub fn finalize_into(mut self, out: &mut [u8]) {
                debug_assert_eq!(out.len(), self.output_size());
                self.state
                    .finish_message(&self.buf[..self.buf_len], self.bit_pad);
                self.state.output_into(out);

                let rem = self.output_bits % 8;
                if rem != 0 {
                    if let Some(last) = out.last_mut() {
                        *last &= (1 << rem) - 1;
                    }
                }
            }

            /// One-shot hash of a whole-byte message.
            pub fn hash(output_bits: u64, msg: &[u8], out: &mut [u8]) {
                let mut h = Self::new(output_bits);
                h.update(msg);
                h.finalize_into(out);
            }

            /// One-shot hash of a `msg_bits`-bit message.
            pub fn hash_bits(output_bits: u64, msg: &[u8], msg_bits: u64, out: &mut [u8]) {
                let mut h = Self::new(output_bits);
                h.update_bits(msg, msg_bits);
                h.finalize_into(out);
            }
        }
    };
}

define_skein_var!(Skein256Var, Ubi256, "Skein-256 with a runtime digest length.");
define_skein_var!(Skein512Var, Ubi512, "Skein-512 with a runtime digest length.");
define_skein_var!(Skein1024Var, Ubi1024, "Skein-1024 with a runtime digest length.");

impl Skein512Var {
    /// Forces a particular block backend. Returns `None` when the CPU does
    /// not support it.
    pub fn new_with_backend(output_bits: u64, backend: Skein512Backend) -> Option<Self> {
        debug_assert!(output_bits > 0, "zero-length digest requested");
        Ubi512::with_backend(backend).map(|state| Self {
            state,
            buf: [0; Self::BLOCK_BYTES],
            buf_len: 0,
            output_bits,
            bit_pad: false,
        })
    }
}
