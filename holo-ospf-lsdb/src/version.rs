//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use crate::packet::PacketVersion;
use crate::packet::lsa::LsaVersion;

// Ties together the per-version packet and LSA types, so that protocol
// code can be written once, generic over `V: Version`.
pub trait Version
where
    Self: 'static
        + Send
        + Sync
        + Clone
        + Copy
        + Default
        + Eq
        + PartialEq
        + std::fmt::Debug
        + PacketVersion<Self>
        + LsaVersion<Self>,
{
    // Version field of the common header.
    const VERSION: u8;
    // Used as a log field.
    const NAME: &'static str;
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Ospfv2();

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Ospfv3();

// ===== impl Ospfv2 =====

impl Version for Ospfv2 {
    const VERSION: u8 = 2;
    const NAME: &'static str = "ospfv2";
}

// ===== impl Ospfv3 =====

impl Version for Ospfv3 {
    const VERSION: u8 = 3;
    const NAME: &'static str = "ospfv3";
}
