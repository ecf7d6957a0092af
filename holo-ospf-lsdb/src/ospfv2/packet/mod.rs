//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod lsa;

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use internet_checksum::Checksum;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::bytes::{BytesExt, BytesMutExt, TLS_BUF};
use crate::ospfv2::packet::lsa::LsaHdr;
use crate::packet::error::{DecodeError, DecodeResult, EncodeError};
use crate::packet::{
    ChecksumCtx, DbDescFlags, PacketBase, PacketHdrVersion, PacketType,
    PacketVersion, decode_exhausting, decode_lsa_hdrs, packet_encode_end,
    packet_encode_start, require,
};
use crate::version::Ospfv2;

pub type LsRequest = crate::packet::LsRequest<Ospfv2>;
pub type LsUpdate = crate::packet::LsUpdate<Ospfv2>;
pub type LsAck = crate::packet::LsAck<Ospfv2>;

// Options octet (RFC 2328 A.2, RFC 5250).
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct Options: u8 {
        const E = 0x02;
        const MC = 0x04;
        const NP = 0x08;
        const DC = 0x20;
        const O = 0x40;
    }
}

#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum AuthType {
    Null = 0,
    Simple = 1,
    Cryptographic = 2,
}

// Common header, 24 bytes: version, type, length, router ID, area ID,
// checksum, AuType and 8 bytes of authentication data.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PacketHdr {
    pub pkt_type: PacketType,
    pub router_id: Ipv4Addr,
    pub area_id: Ipv4Addr,
    pub auth: PacketHdrAuth,
}

// Contents of the 8-byte authentication field. With cryptographic
// authentication, the digest trails the packet and isn't kept here.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum PacketHdrAuth {
    #[default]
    Null,
    Simple([u8; 8]),
    Cryptographic {
        key_id: u8,
        auth_len: u8,
        seqno: u32,
    },
}

// Hello body: mask, interval, options, priority, dead interval, DR, BDR,
// then one word per neighbor up to the end of the packet.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Hello {
    pub hdr: PacketHdr,
    pub network_mask: Ipv4Addr,
    pub hello_interval: u16,
    pub options: Options,
    pub priority: u8,
    pub dead_interval: u32,
    pub dr: Option<Ipv4Addr>,
    pub bdr: Option<Ipv4Addr>,
    pub neighbors: BTreeSet<Ipv4Addr>,
}

// Database Description body: MTU, options, flags, DD sequence number, then
// LSA headers up to the end of the packet.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct DbDesc {
    pub hdr: PacketHdr,
    pub mtu: u16,
    pub options: Options,
    pub dd_flags: DbDescFlags,
    pub dd_seq_no: u32,
    pub lsa_hdrs: Vec<LsaHdr>,
}

// ===== impl PacketHdr =====

impl PacketHdr {
    pub const CKSUM_RANGE: std::ops::Range<usize> = 12..14;
    pub const AUTH_TYPE_RANGE: std::ops::Range<usize> = 14..16;
    pub const AUTH_RANGE: std::ops::Range<usize> = 16..24;
    // Packet offset of the digest length octet.
    const AUTH_LEN_POS: usize = 19;

    pub fn new(
        pkt_type: PacketType,
        router_id: Ipv4Addr,
        area_id: Ipv4Addr,
    ) -> Self {
        PacketHdr {
            pkt_type,
            router_id,
            area_id,
            auth: PacketHdrAuth::Null,
        }
    }

    fn peek_auth_type(data: &[u8]) -> Option<AuthType> {
        let field = data.get(Self::AUTH_TYPE_RANGE)?;
        AuthType::from_u16(u16::from_be_bytes([field[0], field[1]]))
    }

    fn decode_auth(buf: &mut Bytes) -> DecodeResult<PacketHdrAuth> {
        let au_type = buf.try_get_u16()?;
        let auth = match AuthType::from_u16(au_type) {
            Some(AuthType::Null) => {
                buf.try_get_u64()?;
                PacketHdrAuth::Null
            }
            Some(AuthType::Simple) => {
                let mut password = [0; 8];
                buf.try_copy_to_slice(&mut password)?;
                PacketHdrAuth::Simple(password)
            }
            Some(AuthType::Cryptographic) => {
                buf.try_get_u16()?;
                PacketHdrAuth::Cryptographic {
                    key_id: buf.try_get_u8()?,
                    auth_len: buf.try_get_u8()?,
                    seqno: buf.try_get_u32()?,
                }
            }
            None => return Err(DecodeError::UnsupportedAuthType(au_type)),
        };
        Ok(auth)
    }
}

impl PacketHdrVersion<Ospfv2> for PacketHdr {
    const LENGTH: u16 = 24;

    fn decode(pkt_type: PacketType, buf: &mut Bytes) -> DecodeResult<Self> {
        let router_id = buf.try_get_ipv4()?;
        let area_id = buf.try_get_ipv4()?;
        // Checked by `verify_cksum`.
        buf.try_get_u16()?;
        let auth = Self::decode_auth(buf)?;

        Ok(PacketHdr {
            pkt_type,
            router_id,
            area_id,
            auth,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(2);
        buf.put_u8(self.pkt_type as u8);
        buf.put_u16(0);
        buf.put_ipv4(&self.router_id);
        buf.put_ipv4(&self.area_id);
        buf.put_u16(0);
        buf.put_u16(self.auth.auth_type() as u16);
        match self.auth {
            PacketHdrAuth::Cryptographic {
                key_id,
                auth_len,
                seqno,
            } => {
                buf.put_u16(0);
                buf.put_u8(key_id);
                buf.put_u8(auth_len);
                buf.put_u32(seqno);
            }
            // The password goes in after the checksum is computed.
            _ => buf.put_u64(0),
        }
    }

    fn update_cksum(&self, buf: &mut BytesMut, _ctx: &ChecksumCtx) {
        // No checksum under cryptographic authentication (RFC 2328 D.4.3).
        if let PacketHdrAuth::Cryptographic { .. } = self.auth {
            return;
        }

        let mut cksum = Checksum::new();
        cksum.add_bytes(buf);
        buf[Self::CKSUM_RANGE].copy_from_slice(&cksum.checksum());
        if let PacketHdrAuth::Simple(password) = self.auth {
            buf[Self::AUTH_RANGE].copy_from_slice(&password);
        }
    }

    fn verify_cksum(data: &[u8], _ctx: &ChecksumCtx) -> DecodeResult<()> {
        if Self::peek_auth_type(data) == Some(AuthType::Cryptographic) {
            return Ok(());
        }

        // Sum everything except the 8 authentication bytes.
        let mut cksum = Checksum::new();
        cksum.add_bytes(&data[..Self::AUTH_RANGE.start]);
        cksum.add_bytes(&data[Self::AUTH_RANGE.end..]);
        match cksum.checksum() {
            [0, 0] => Ok(()),
            _ => Err(DecodeError::InvalidChecksum),
        }
    }

    fn auth_trailer_len(data: &[u8]) -> usize {
        match Self::peek_auth_type(data) {
            Some(AuthType::Cryptographic) => data
                .get(Self::AUTH_LEN_POS)
                .copied()
                .map(usize::from)
                .unwrap_or(0),
            _ => 0,
        }
    }

    fn pkt_type(&self) -> PacketType {
        self.pkt_type
    }

    fn router_id(&self) -> Ipv4Addr {
        self.router_id
    }

    fn area_id(&self) -> Ipv4Addr {
        self.area_id
    }
}

// ===== impl PacketHdrAuth =====

impl PacketHdrAuth {
    pub fn auth_type(&self) -> AuthType {
        match self {
            PacketHdrAuth::Null => AuthType::Null,
            PacketHdrAuth::Simple(_) => AuthType::Simple,
            PacketHdrAuth::Cryptographic { .. } => AuthType::Cryptographic,
        }
    }
}

// ===== impl Hello =====

impl Hello {
    pub const BASE_LENGTH: u16 = 20;
}

impl PacketBase<Ospfv2> for Hello {
    fn decode(hdr: PacketHdr, buf: &mut Bytes) -> DecodeResult<Self> {
        require(buf, Self::BASE_LENGTH)?;

        Ok(Hello {
            hdr,
            network_mask: buf.try_get_ipv4()?,
            hello_interval: buf.try_get_u16()?,
            options: Options::from_bits_truncate(buf.try_get_u8()?),
            priority: buf.try_get_u8()?,
            dead_interval: buf.try_get_u32()?,
            dr: buf.try_get_opt_ipv4()?,
            bdr: buf.try_get_opt_ipv4()?,
            neighbors: decode_exhausting(buf, 4, Bytes::try_get_ipv4)?,
        })
    }

    fn encode(&self, ctx: &ChecksumCtx) -> Result<Bytes, EncodeError> {
        TLS_BUF.with(|buf| {
            let mut buf = packet_encode_start::<Ospfv2>(buf, &self.hdr);
            buf.put_ipv4(&self.network_mask);
            buf.put_u16(self.hello_interval);
            buf.put_u8(self.options.bits());
            buf.put_u8(self.priority);
            buf.put_u32(self.dead_interval);
            for addr in [self.dr, self.bdr] {
                buf.put_ipv4(&addr.unwrap_or(Ipv4Addr::UNSPECIFIED));
            }
            self.neighbors.iter().for_each(|nbr| buf.put_ipv4(nbr));
            packet_encode_end::<Ospfv2>(buf, &self.hdr, ctx)
        })
    }

    fn hdr(&self) -> &PacketHdr {
        &self.hdr
    }
}

// ===== impl DbDesc =====

impl DbDesc {
    pub const BASE_LENGTH: u16 = 8;
}

impl PacketBase<Ospfv2> for DbDesc {
    fn decode(hdr: PacketHdr, buf: &mut Bytes) -> DecodeResult<Self> {
        require(buf, Self::BASE_LENGTH)?;

        Ok(DbDesc {
            hdr,
            mtu: buf.try_get_u16()?,
            options: Options::from_bits_truncate(buf.try_get_u8()?),
            dd_flags: DbDescFlags::from_bits_truncate(buf.try_get_u8()?),
            dd_seq_no: buf.try_get_u32()?,
            lsa_hdrs: decode_lsa_hdrs(buf)?,
        })
    }

    fn encode(&self, ctx: &ChecksumCtx) -> Result<Bytes, EncodeError> {
        TLS_BUF.with(|buf| {
            let mut buf = packet_encode_start::<Ospfv2>(buf, &self.hdr);
            buf.put_u16(self.mtu);
            buf.put_u8(self.options.bits());
            buf.put_u8(self.dd_flags.bits());
            buf.put_u32(self.dd_seq_no);
            self.lsa_hdrs.iter().for_each(|hdr| hdr.encode(&mut buf));
            packet_encode_end::<Ospfv2>(buf, &self.hdr, ctx)
        })
    }

    fn hdr(&self) -> &PacketHdr {
        &self.hdr
    }
}

// ===== impl Ospfv2 =====

impl PacketVersion<Self> for Ospfv2 {
    type PacketOptions = Options;
    type PacketHdr = PacketHdr;
    type PacketHello = Hello;
    type PacketDbDesc = DbDesc;
}
