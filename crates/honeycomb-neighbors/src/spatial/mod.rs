// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Spatial hashing: Morton interleaving and the fixed-precision cell codec.
*/

pub mod codec;
pub mod morton;

pub use codec::Codec;
pub use morton::{morton_decode_2d, morton_encode_2d};
