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
use serde::{Deserialize, Serialize};

use crate::bytes::{BytesExt, BytesMutExt, TLS_BUF};
use crate::ospfv3::packet::lsa::LsaHdr;
use crate::packet::error::{DecodeError, DecodeResult, EncodeError};
use crate::packet::{
    ChecksumCtx, DbDescFlags, PacketBase, PacketHdrVersion, PacketType,
    PacketVersion, decode_exhausting, decode_lsa_hdrs, packet_encode_end,
    packet_encode_start, require,
};
use crate::version::Ospfv3;

pub type LsRequest = crate::packet::LsRequest<Ospfv3>;
pub type LsUpdate = crate::packet::LsUpdate<Ospfv3>;
pub type LsAck = crate::packet::LsAck<Ospfv3>;

// Options field (RFC 5340 A.2, RFC 5838). Carried in 24 bits, of which
// only the low 16 are defined.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct Options: u16 {
        const V6 = 0x0001;
        const E = 0x0002;
        const N = 0x0008;
        const R = 0x0010;
        const DC = 0x0020;
        const AF = 0x0100;
        const L = 0x0200;
        const AT = 0x0400;
    }
}

// Common header, 16 bytes: version, type, length, router ID, area ID,
// checksum, instance ID and a zero octet.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PacketHdr {
    pub pkt_type: PacketType,
    pub router_id: Ipv4Addr,
    pub area_id: Ipv4Addr,
    pub instance_id: u8,
}

// Hello body: interface ID, priority and 24-bit options, hello and dead
// intervals, DR, BDR, then one word per neighbor up to the end of the
// packet.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Hello {
    pub hdr: PacketHdr,
    pub iface_id: u32,
    pub priority: u8,
    pub options: Options,
    pub hello_interval: u16,
    pub dead_interval: u16,
    pub dr: Option<Ipv4Addr>,
    pub bdr: Option<Ipv4Addr>,
    pub neighbors: BTreeSet<Ipv4Addr>,
}

// Database Description body: zero octet and 24-bit options, MTU, zero
// octet and flags, DD sequence number, then LSA headers up to the end of
// the packet.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct DbDesc {
    pub hdr: PacketHdr,
    pub options: Options,
    pub mtu: u16,
    pub dd_flags: DbDescFlags,
    pub dd_seq_no: u32,
    pub lsa_hdrs: Vec<LsaHdr>,
}

// ===== impl Options =====

impl Options {
    // Unknown bits, including the whole top octet, are dropped.
    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let bits = buf.try_get_u24()?;
        Ok(Options::from_bits_truncate(bits as u16))
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u24(self.bits().into());
    }
}

// ===== impl PacketHdr =====

impl PacketHdr {
    pub const CKSUM_RANGE: std::ops::Range<usize> = 12..14;

    pub fn new(
        pkt_type: PacketType,
        router_id: Ipv4Addr,
        area_id: Ipv4Addr,
        instance_id: u8,
    ) -> Self {
        PacketHdr {
            pkt_type,
            router_id,
            area_id,
            instance_id,
        }
    }
}

impl PacketHdrVersion<Ospfv3> for PacketHdr {
    const LENGTH: u16 = 16;

    fn decode(pkt_type: PacketType, buf: &mut Bytes) -> DecodeResult<Self> {
        let router_id = buf.try_get_ipv4()?;
        let area_id = buf.try_get_ipv4()?;
        // Checked by `verify_cksum`.
        buf.try_get_u16()?;
        let instance_id = buf.try_get_u8()?;
        buf.try_get_u8()?;

        Ok(PacketHdr::new(pkt_type, router_id, area_id, instance_id))
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(3);
        buf.put_u8(self.pkt_type as u8);
        buf.put_u16(0);
        buf.put_ipv4(&self.router_id);
        buf.put_ipv4(&self.area_id);
        buf.put_u16(0);
        buf.put_u8(self.instance_id);
        buf.put_u8(0);
    }

    // Left at zero for the socket layer to fill in, unless the addresses
    // were supplied.
    fn update_cksum(&self, buf: &mut BytesMut, ctx: &ChecksumCtx) {
        if let Some(mut cksum) = ctx.pseudo_header(buf.len()) {
            cksum.add_bytes(buf);
            buf[Self::CKSUM_RANGE].copy_from_slice(&cksum.checksum());
        }
    }

    fn verify_cksum(data: &[u8], ctx: &ChecksumCtx) -> DecodeResult<()> {
        let Some(mut cksum) = ctx.pseudo_header(data.len()) else {
            return Ok(());
        };
        cksum.add_bytes(data);
        match cksum.checksum() {
            [0, 0] => Ok(()),
            _ => Err(DecodeError::InvalidChecksum),
        }
    }

    fn auth_trailer_len(_data: &[u8]) -> usize {
        0
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

// ===== impl Hello =====

impl Hello {
    pub const BASE_LENGTH: u16 = 20;
}

impl PacketBase<Ospfv3> for Hello {
    fn decode(hdr: PacketHdr, buf: &mut Bytes) -> DecodeResult<Self> {
        require(buf, Self::BASE_LENGTH)?;

        Ok(Hello {
            hdr,
            iface_id: buf.try_get_u32()?,
            priority: buf.try_get_u8()?,
            options: Options::decode(buf)?,
            hello_interval: buf.try_get_u16()?,
            dead_interval: buf.try_get_u16()?,
            dr: buf.try_get_opt_ipv4()?,
            bdr: buf.try_get_opt_ipv4()?,
            neighbors: decode_exhausting(buf, 4, Bytes::try_get_ipv4)?,
        })
    }

    fn encode(&self, ctx: &ChecksumCtx) -> Result<Bytes, EncodeError> {
        TLS_BUF.with(|buf| {
            let mut buf = packet_encode_start::<Ospfv3>(buf, &self.hdr);
            buf.put_u32(self.iface_id);
            buf.put_u8(self.priority);
            self.options.encode(&mut buf);
            buf.put_u16(self.hello_interval);
            buf.put_u16(self.dead_interval);
            for addr in [self.dr, self.bdr] {
                buf.put_ipv4(&addr.unwrap_or(Ipv4Addr::UNSPECIFIED));
            }
            self.neighbors.iter().for_each(|nbr| buf.put_ipv4(nbr));
            packet_encode_end::<Ospfv3>(buf, &self.hdr, ctx)
        })
    }

    fn hdr(&self) -> &PacketHdr {
        &self.hdr
    }
}

// ===== impl DbDesc =====

impl DbDesc {
    pub const BASE_LENGTH: u16 = 12;
}

impl PacketBase<Ospfv3> for DbDesc {
    fn decode(hdr: PacketHdr, buf: &mut Bytes) -> DecodeResult<Self> {
        require(buf, Self::BASE_LENGTH)?;

        buf.try_get_u8()?;
        let options = Options::decode(buf)?;
        let mtu = buf.try_get_u16()?;
        buf.try_get_u8()?;
        Ok(DbDesc {
            hdr,
            options,
            mtu,
            dd_flags: DbDescFlags::from_bits_truncate(buf.try_get_u8()?),
            dd_seq_no: buf.try_get_u32()?,
            lsa_hdrs: decode_lsa_hdrs(buf)?,
        })
    }

    fn encode(&self, ctx: &ChecksumCtx) -> Result<Bytes, EncodeError> {
        TLS_BUF.with(|buf| {
            let mut buf = packet_encode_start::<Ospfv3>(buf, &self.hdr);
            buf.put_u8(0);
            self.options.encode(&mut buf);
            buf.put_u16(self.mtu);
            buf.put_u8(0);
            buf.put_u8(self.dd_flags.bits());
            buf.put_u32(self.dd_seq_no);
            self.lsa_hdrs.iter().for_each(|hdr| hdr.encode(&mut buf));
            packet_encode_end::<Ospfv3>(buf, &self.hdr, ctx)
        })
    }

    fn hdr(&self) -> &PacketHdr {
        &self.hdr
    }
}

// ===== impl Ospfv3 =====

impl PacketVersion<Self> for Ospfv3 {
    type PacketOptions = Options;
    type PacketHdr = PacketHdr;
    type PacketHello = Hello;
    type PacketDbDesc = DbDesc;
}
