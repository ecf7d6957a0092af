//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::TryGetError;
use serde::{Deserialize, Serialize};

use crate::packet::PacketType;

pub type DecodeResult<T> = Result<T, DecodeError>;

// Reasons for rejecting a received packet.
//
// A packet is accepted or rejected as a whole. An LSA that can't be parsed
// takes the enclosing LS Update down with it.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    // Framing
    InsufficientData { required: usize, available: usize },
    InvalidVersion(u8),
    UnknownPacketType(u8),
    PacketTypeMismatch { expected: PacketType, received: PacketType },
    InvalidLength { declared: u16, received: usize },
    InvalidChecksum,
    UnsupportedAuthType(u16),
    TrailingData(usize),
    Truncated { requested: usize, available: usize },
    // LSA
    InvalidLsaLength { length: u16, min: u16 },
    LsaLengthOverrun { length: u16, available: usize },
    InvalidLsaChecksum,
    LsaTrailingData(usize),
    UnknownLsaType(u16),
    UnknownRouterLinkType(u8),
    InvalidIpPrefix,
}

// Reasons for refusing to serialize a packet or LSA.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum EncodeError {
    // The encoded size doesn't fit in the 16-bit length field.
    LsaTooLong(usize),
    PacketTooLong(usize),
}

// Per-LSA semantic checks. A failure drops that LSA only.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaValidationError {
    InvalidChecksum,
    InvalidLsaAge,
    InvalidLsaSeqNo,
    Ospfv2RouterLsaIdMismatch,
}

// ===== impl DecodeError =====

impl DecodeError {
    // Whether the error was raised by the LSA layer.
    pub fn is_lsa_error(&self) -> bool {
        matches!(
            self,
            DecodeError::InvalidLsaLength { .. }
                | DecodeError::LsaLengthOverrun { .. }
                | DecodeError::InvalidLsaChecksum
                | DecodeError::LsaTrailingData(..)
                | DecodeError::UnknownLsaType(..)
                | DecodeError::UnknownRouterLinkType(..)
                | DecodeError::InvalidIpPrefix
        )
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use DecodeError::*;

        match self {
            InsufficientData {
                required,
                available,
            } => write!(f, "need {required} bytes, only {available} present"),
            InvalidVersion(version) => {
                write!(f, "unexpected OSPF version {version}")
            }
            UnknownPacketType(pkt_type) => {
                write!(f, "packet type {pkt_type} not recognized")
            }
            PacketTypeMismatch { expected, received } => {
                write!(f, "got a {received} packet instead of {expected}")
            }
            InvalidLength { declared, received } => write!(
                f,
                "header says {declared} bytes but {received} were received"
            ),
            InvalidChecksum => write!(f, "packet checksum mismatch"),
            UnsupportedAuthType(au_type) => {
                write!(f, "authentication type {au_type} not supported")
            }
            TrailingData(len) => {
                write!(f, "{len} unparsed bytes after the packet body")
            }
            Truncated {
                requested,
                available,
            } => write!(
                f,
                "field of {requested} bytes cut short at {available}"
            ),
            InvalidLsaLength { length, min } => {
                write!(f, "LSA length {length} is below the minimum of {min}")
            }
            LsaLengthOverrun { length, available } => write!(
                f,
                "LSA claims {length} bytes, {available} left in the packet"
            ),
            InvalidLsaChecksum => write!(f, "LSA checksum mismatch"),
            LsaTrailingData(len) => {
                write!(f, "{len} unparsed bytes after the LSA body")
            }
            UnknownLsaType(lsa_type) => {
                write!(f, "LSA type {lsa_type:#06x} not recognized")
            }
            UnknownRouterLinkType(link_type) => {
                write!(f, "router link type {link_type} not recognized")
            }
            InvalidIpPrefix => write!(f, "malformed IPv6 prefix"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<TryGetError> for DecodeError {
    fn from(error: TryGetError) -> DecodeError {
        DecodeError::Truncated {
            requested: error.requested,
            available: error.available,
        }
    }
}

// ===== impl EncodeError =====

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::LsaTooLong(len) => {
                write!(f, "encoded LSA of {len} bytes exceeds 65535")
            }
            EncodeError::PacketTooLong(len) => {
                write!(f, "encoded packet of {len} bytes exceeds 65535")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

// ===== impl LsaValidationError =====

impl std::fmt::Display for LsaValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LsaValidationError::InvalidChecksum => {
                write!(f, "LSA checksum mismatch")
            }
            LsaValidationError::InvalidLsaAge => {
                write!(f, "LSA age beyond MaxAge")
            }
            LsaValidationError::InvalidLsaSeqNo => {
                write!(f, "reserved LSA sequence number")
            }
            LsaValidationError::Ospfv2RouterLsaIdMismatch => {
                write!(f, "Router-LSA ID differs from its advertising router")
            }
        }
    }
}

impl std::error::Error for LsaValidationError {}
