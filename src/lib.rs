//! The Skein family of cryptographic hash functions.
//!
//! Skein chains the Threefish tweakable block cipher through UBI (Unique
//! Block Iteration): every block is ciphered under a tweak carrying the
//! running byte count, a block-type code, and first/final flags, with the
//! plaintext XORed back into the output. Three internal state sizes are
//! provided (256, 512, and 1024 bits), each able to emit digests of any
//! length through the counter-mode output transform.
//!
//! [`Skein256`], [`Skein512`], and [`Skein1024`] implement the [`Digest`]
//! traits with type-level output sizes; the `*Var` types take the digest
//! length in bits at runtime and accept messages whose length is not a
//! whole number of bytes.

#![no_std]

mod skein;
mod threefish;
mod ubi;
mod var;

use digest::consts::{U128, U32, U64};
use digest::core_api::CoreWrapper;

pub use digest::{self, Digest};

pub use skein::{Skein1024Core, Skein256Core, Skein512Core};
pub use threefish::{Threefish1024, Threefish256, Threefish512};
pub use var::{Skein1024Var, Skein256Var, Skein512Var};

#[cfg(feature = "selectable-backend")]
pub use ubi::Skein512Backend;

pub type Skein256<OutputSize = U32> = CoreWrapper<Skein256Core<OutputSize>>;
pub type Skein512<OutputSize = U64> = CoreWrapper<Skein512Core<OutputSize>>;
pub type Skein1024<OutputSize = U128> = CoreWrapper<Skein1024Core<OutputSize>>;
