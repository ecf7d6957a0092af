//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod error;
pub mod lsa;

use std::cell::{RefCell, RefMut};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use enum_as_inner::EnumAsInner;
use internet_checksum::Checksum;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::bytes::{BytesExt, BytesMutExt, TLS_BUF};
use crate::packet::error::{DecodeError, DecodeResult, EncodeError};
use crate::packet::lsa::{Lsa, LsaHdr, LsaKey, LsaVersion};
use crate::version::{Ospfv2, Ospfv3, Version};

pub const OSPF_IP_PROTO: u8 = 89;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct DbDescFlags: u8 {
        const MS = 0x01;
        const M = 0x02;
        const I = 0x04;
    }
}

// Values of the second octet of the common header. Both versions share
// them.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Hash, Ord, PartialEq)]
#[derive(PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum PacketType {
    Hello = 1,
    DbDesc = 2,
    LsRequest = 3,
    LsUpdate = 4,
    LsAck = 5,
}

// What the codec needs to know about the OSPFv3 pseudo-header.
//
// `Offloaded` leaves the v3 checksum to the socket layer. OSPFv2 packets
// carry their own checksum and ignore this.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChecksumCtx {
    Offloaded,
    Ipv6 { src: Ipv6Addr, dst: Ipv6Addr },
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(bound = "V: Version")]
pub enum Packet<V: Version> {
    Hello(V::PacketHello),
    DbDesc(V::PacketDbDesc),
    LsRequest(LsRequest<V>),
    LsUpdate(LsUpdate<V>),
    LsAck(LsAck<V>),
}

#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum AnyPacket {
    Ospfv2(Packet<Ospfv2>),
    Ospfv3(Packet<Ospfv3>),
}

// Link State Request. The body is a list of 12-byte LSA keys, whose first
// word holds the LSA type in both versions.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(bound = "V: Version")]
pub struct LsRequest<V: Version> {
    pub hdr: V::PacketHdr,
    pub entries: Vec<LsaKey<V::LsaType>>,
}

// Link State Update. The body is a 32-bit LSA count followed by that many
// LSAs.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(bound = "V: Version")]
pub struct LsUpdate<V: Version> {
    pub hdr: V::PacketHdr,
    pub lsas: Vec<Lsa<V>>,
}

// Link State Acknowledgment. The body is a list of LSA headers.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(bound = "V: Version")]
pub struct LsAck<V: Version> {
    pub hdr: V::PacketHdr,
    pub lsa_hdrs: Vec<LsaHdr<V>>,
}

pub type PacketDecodeFn =
    Box<dyn Fn(&Bytes, &ChecksumCtx) -> DecodeResult<AnyPacket> + Send + Sync>;

// (version, packet type) -> decode function.
pub struct PacketDecoder {
    decoders: BTreeMap<(u8, PacketType), PacketDecodeFn>,
}

// OSPF version-specific code.
pub trait PacketVersion<V: Version> {
    type PacketOptions: Send
        + Sync
        + Clone
        + Copy
        + std::fmt::Debug
        + Eq
        + PartialEq
        + Serialize
        + DeserializeOwned;
    type PacketHdr: PacketHdrVersion<V>;
    type PacketHello: PacketBase<V>;
    type PacketDbDesc: PacketBase<V>;
}

// OSPF version-specific code.
pub trait PacketHdrVersion<V: Version>
where
    Self: Send
        + Sync
        + Clone
        + std::fmt::Debug
        + Eq
        + PartialEq
        + Serialize
        + DeserializeOwned,
{
    const LENGTH: u16;

    // Parses what follows the length field. The caller has already checked
    // the version, type and length.
    fn decode(pkt_type: PacketType, buf: &mut Bytes) -> DecodeResult<Self>;

    // Writes the header with zero length and checksum.
    fn encode(&self, buf: &mut BytesMut);

    // Fills in the checksum of a fully built packet.
    fn update_cksum(&self, buf: &mut BytesMut, ctx: &ChecksumCtx);

    fn verify_cksum(data: &[u8], ctx: &ChecksumCtx) -> DecodeResult<()>;

    // Bytes after the packet that the length field doesn't count.
    fn auth_trailer_len(data: &[u8]) -> usize;

    fn pkt_type(&self) -> PacketType;

    fn router_id(&self) -> Ipv4Addr;

    fn area_id(&self) -> Ipv4Addr;
}

// Body codec of one packet type.
pub trait PacketBase<V: Version>
where
    Self: Send
        + Sync
        + Clone
        + std::fmt::Debug
        + Eq
        + PartialEq
        + Serialize
        + DeserializeOwned,
{
    fn decode(hdr: V::PacketHdr, buf: &mut Bytes) -> DecodeResult<Self>;

    fn encode(&self, ctx: &ChecksumCtx) -> Result<Bytes, EncodeError>;

    fn hdr(&self) -> &V::PacketHdr;
}

// ===== impl PacketType =====

impl PacketType {
    pub const ALL: [PacketType; 5] = [
        PacketType::Hello,
        PacketType::DbDesc,
        PacketType::LsRequest,
        PacketType::LsUpdate,
        PacketType::LsAck,
    ];
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PacketType::Hello => "Hello",
            PacketType::DbDesc => "Database Description",
            PacketType::LsRequest => "Link State Request",
            PacketType::LsUpdate => "Link State Update",
            PacketType::LsAck => "Link State Acknowledgment",
        };
        f.write_str(name)
    }
}

// ===== impl ChecksumCtx =====

impl ChecksumCtx {
    // Starts an RFC 1071 sum over the IPv6 pseudo-header (RFC 8200, 8.1).
    pub(crate) fn pseudo_header(&self, length: usize) -> Option<Checksum> {
        let ChecksumCtx::Ipv6 { src, dst } = self else {
            return None;
        };
        let mut cksum = Checksum::new();
        cksum.add_bytes(&src.octets());
        cksum.add_bytes(&dst.octets());
        cksum.add_bytes(&(length as u32).to_be_bytes());
        cksum.add_bytes(&[0, 0, 0, OSPF_IP_PROTO]);
        Some(cksum)
    }
}

// ===== impl Packet =====

impl<V> Packet<V>
where
    V: Version,
{
    // `data` must hold exactly one packet, plus its authentication trailer
    // if any.
    pub fn decode(data: &Bytes, ctx: &ChecksumCtx) -> DecodeResult<Self> {
        let (_, pkt_type) = peek_version_type(data)?;
        Self::decode_as(pkt_type, data, ctx)
    }

    // Like `decode`, but fails unless the packet is of type `pkt_type`.
    pub fn decode_as(
        pkt_type: PacketType,
        data: &Bytes,
        ctx: &ChecksumCtx,
    ) -> DecodeResult<Self> {
        let (hdr, mut buf) = decode_standard_header::<V>(data, pkt_type, ctx)?;
        let buf = &mut buf;
        let packet = match pkt_type {
            PacketType::Hello => {
                Packet::Hello(V::PacketHello::decode(hdr, buf)?)
            }
            PacketType::DbDesc => {
                Packet::DbDesc(V::PacketDbDesc::decode(hdr, buf)?)
            }
            PacketType::LsRequest => {
                Packet::LsRequest(LsRequest::decode(hdr, buf)?)
            }
            PacketType::LsUpdate => {
                Packet::LsUpdate(LsUpdate::decode(hdr, buf)?)
            }
            PacketType::LsAck => Packet::LsAck(LsAck::decode(hdr, buf)?),
        };
        if buf.has_remaining() {
            return Err(DecodeError::TrailingData(buf.remaining()));
        }

        Ok(packet)
    }

    pub fn encode(&self, ctx: &ChecksumCtx) -> Result<Bytes, EncodeError> {
        match self {
            Packet::Hello(pkt) => pkt.encode(ctx),
            Packet::DbDesc(pkt) => pkt.encode(ctx),
            Packet::LsRequest(pkt) => pkt.encode(ctx),
            Packet::LsUpdate(pkt) => pkt.encode(ctx),
            Packet::LsAck(pkt) => pkt.encode(ctx),
        }
    }

    pub fn hdr(&self) -> &V::PacketHdr {
        match self {
            Packet::Hello(pkt) => pkt.hdr(),
            Packet::DbDesc(pkt) => pkt.hdr(),
            Packet::LsRequest(pkt) => pkt.hdr(),
            Packet::LsUpdate(pkt) => pkt.hdr(),
            Packet::LsAck(pkt) => pkt.hdr(),
        }
    }
}

// ===== impl AnyPacket =====

impl AnyPacket {
    pub fn decode(data: &Bytes, ctx: &ChecksumCtx) -> DecodeResult<Self> {
        PacketDecoder::standard().decode(data, ctx)
    }

    pub fn version(&self) -> u8 {
        match self {
            AnyPacket::Ospfv2(_) => Ospfv2::VERSION,
            AnyPacket::Ospfv3(_) => Ospfv3::VERSION,
        }
    }

    pub fn pkt_type(&self) -> PacketType {
        match self {
            AnyPacket::Ospfv2(packet) => packet.hdr().pkt_type(),
            AnyPacket::Ospfv3(packet) => packet.hdr().pkt_type(),
        }
    }

    pub fn router_id(&self) -> Ipv4Addr {
        match self {
            AnyPacket::Ospfv2(packet) => packet.hdr().router_id(),
            AnyPacket::Ospfv3(packet) => packet.hdr().router_id(),
        }
    }
}

impl From<Packet<Ospfv2>> for AnyPacket {
    fn from(packet: Packet<Ospfv2>) -> AnyPacket {
        AnyPacket::Ospfv2(packet)
    }
}

impl From<Packet<Ospfv3>> for AnyPacket {
    fn from(packet: Packet<Ospfv3>) -> AnyPacket {
        AnyPacket::Ospfv3(packet)
    }
}

// ===== impl LsRequest =====

impl<V> LsRequest<V>
where
    V: Version,
{
    pub const ENTRY_LENGTH: u16 = 12;

    fn decode_entry(buf: &mut Bytes) -> DecodeResult<LsaKey<V::LsaType>> {
        // v2 uses the whole word, v3 only its low half.
        let lsa_type = (buf.try_get_u32()? as u16).into();
        let lsa_id = buf.try_get_ipv4()?;
        let adv_rtr = buf.try_get_ipv4()?;
        Ok(LsaKey::new(lsa_type, adv_rtr, lsa_id))
    }
}

impl<V> PacketBase<V> for LsRequest<V>
where
    V: Version,
{
    fn decode(hdr: V::PacketHdr, buf: &mut Bytes) -> DecodeResult<Self> {
        require(buf, Self::ENTRY_LENGTH)?;
        let entries =
            decode_exhausting(buf, Self::ENTRY_LENGTH, Self::decode_entry)?;
        Ok(LsRequest { hdr, entries })
    }

    fn encode(&self, ctx: &ChecksumCtx) -> Result<Bytes, EncodeError> {
        TLS_BUF.with(|buf| {
            let mut buf = packet_encode_start::<V>(buf, &self.hdr);
            for entry in &self.entries {
                let lsa_type: u16 = entry.lsa_type.into();
                buf.put_u32(lsa_type.into());
                buf.put_ipv4(&entry.lsa_id);
                buf.put_ipv4(&entry.adv_rtr);
            }
            packet_encode_end::<V>(buf, &self.hdr, ctx)
        })
    }

    fn hdr(&self) -> &V::PacketHdr {
        &self.hdr
    }
}

// ===== impl LsUpdate =====

impl<V> PacketBase<V> for LsUpdate<V>
where
    V: Version,
{
    fn decode(hdr: V::PacketHdr, buf: &mut Bytes) -> DecodeResult<Self> {
        let decoder = V::lsa_decoder();
        let count = buf.try_get_u32()? as usize;

        // Refuse counts that can't fit before allocating anything.
        let required = count.saturating_mul(decoder.min_length().into());
        if required > buf.remaining() {
            return Err(DecodeError::InsufficientData {
                required,
                available: buf.remaining(),
            });
        }

        let lsas = decode_counted(buf, count, |buf| decoder.decode(buf))?;
        Ok(LsUpdate { hdr, lsas })
    }

    fn encode(&self, ctx: &ChecksumCtx) -> Result<Bytes, EncodeError> {
        TLS_BUF.with(|buf| {
            let mut buf = packet_encode_start::<V>(buf, &self.hdr);
            buf.put_u32(self.lsas.len() as u32);
            for lsa in &self.lsas {
                buf.put_slice(&lsa.raw);
            }
            packet_encode_end::<V>(buf, &self.hdr, ctx)
        })
    }

    fn hdr(&self) -> &V::PacketHdr {
        &self.hdr
    }
}

// ===== impl LsAck =====

impl<V> PacketBase<V> for LsAck<V>
where
    V: Version,
{
    fn decode(hdr: V::PacketHdr, buf: &mut Bytes) -> DecodeResult<Self> {
        require(buf, LsaHdr::<V>::LENGTH)?;
        let lsa_hdrs = decode_lsa_hdrs(buf)?;
        Ok(LsAck { hdr, lsa_hdrs })
    }

    fn encode(&self, ctx: &ChecksumCtx) -> Result<Bytes, EncodeError> {
        TLS_BUF.with(|buf| {
            let mut buf = packet_encode_start::<V>(buf, &self.hdr);
            for lsa_hdr in &self.lsa_hdrs {
                lsa_hdr.encode(&mut buf);
            }
            packet_encode_end::<V>(buf, &self.hdr, ctx)
        })
    }

    fn hdr(&self) -> &V::PacketHdr {
        &self.hdr
    }
}

// ===== impl PacketDecoder =====

impl PacketDecoder {
    pub fn new() -> PacketDecoder {
        PacketDecoder {
            decoders: Default::default(),
        }
    }

    // Every packet type of both versions.
    pub fn standard() -> PacketDecoder {
        let mut decoder = PacketDecoder::new();
        for pkt_type in PacketType::ALL {
            decoder.register::<Ospfv2>(pkt_type);
            decoder.register::<Ospfv3>(pkt_type);
        }
        decoder
    }

    pub fn register<V>(&mut self, pkt_type: PacketType)
    where
        V: Version,
        AnyPacket: From<Packet<V>>,
    {
        let decode_fn: PacketDecodeFn = Box::new(move |data, ctx| {
            Packet::<V>::decode_as(pkt_type, data, ctx).map(AnyPacket::from)
        });
        self.register_fn(V::VERSION, pkt_type, decode_fn);
    }

    // Panics if the pair is already taken.
    pub fn register_fn(
        &mut self,
        version: u8,
        pkt_type: PacketType,
        decode_fn: PacketDecodeFn,
    ) {
        let key = (version, pkt_type);
        if self.decoders.insert(key, decode_fn).is_some() {
            panic!("OSPFv{version} {pkt_type} decoder registered twice");
        }
    }

    pub fn is_registered(&self, version: u8, pkt_type: PacketType) -> bool {
        self.decoders.contains_key(&(version, pkt_type))
    }

    pub fn decode(
        &self,
        data: &Bytes,
        ctx: &ChecksumCtx,
    ) -> DecodeResult<AnyPacket> {
        let (version, pkt_type) = peek_version_type(data)?;
        match self.decoders.get(&(version, pkt_type)) {
            Some(decode_fn) => decode_fn(data, ctx),
            None => Err(DecodeError::UnknownPacketType(pkt_type as u8)),
        }
    }
}

impl Default for PacketDecoder {
    fn default() -> PacketDecoder {
        PacketDecoder::new()
    }
}

impl std::fmt::Debug for PacketDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.decoders.keys()).finish()
    }
}

// ===== global functions =====

// Reads the first two octets of a packet.
pub fn peek_version_type(data: &[u8]) -> DecodeResult<(u8, PacketType)> {
    let &[version, pkt_type, ..] = data else {
        return Err(DecodeError::InsufficientData {
            required: 2,
            available: data.len(),
        });
    };
    if version != Ospfv2::VERSION && version != Ospfv3::VERSION {
        return Err(DecodeError::InvalidVersion(version));
    }
    let pkt_type = PacketType::from_u8(pkt_type)
        .ok_or(DecodeError::UnknownPacketType(pkt_type))?;
    Ok((version, pkt_type))
}

// Checks the common header of a `V` packet of type `expected` and parses
// it. Returns the header and the body, with any trailer cut off.
pub fn decode_standard_header<V>(
    data: &Bytes,
    expected: PacketType,
    ctx: &ChecksumCtx,
) -> DecodeResult<(V::PacketHdr, Bytes)>
where
    V: Version,
{
    let (version, pkt_type) = peek_version_type(data)?;
    if version != V::VERSION {
        return Err(DecodeError::InvalidVersion(version));
    }
    if pkt_type != expected {
        return Err(DecodeError::PacketTypeMismatch {
            expected,
            received: pkt_type,
        });
    }

    let hdr_len = V::PacketHdr::LENGTH;
    require(data, hdr_len)?;
    let declared = u16::from_be_bytes([data[2], data[3]]);
    let trailer = V::PacketHdr::auth_trailer_len(data);
    if declared < hdr_len || declared as usize + trailer != data.len() {
        return Err(DecodeError::InvalidLength {
            declared,
            received: data.len(),
        });
    }
    let data = data.slice(..declared as usize);
    V::PacketHdr::verify_cksum(&data, ctx)?;

    let mut buf = data.slice(4..);
    let hdr = V::PacketHdr::decode(pkt_type, &mut buf)?;
    Ok((hdr, buf))
}

pub(crate) fn packet_encode_start<'a, V>(
    buf: &'a RefCell<BytesMut>,
    hdr: &V::PacketHdr,
) -> RefMut<'a, BytesMut>
where
    V: Version,
{
    let mut buf = buf.borrow_mut();
    buf.clear();
    hdr.encode(&mut buf);
    buf
}

// Patches the length, then the checksum, which covers it.
pub(crate) fn packet_encode_end<V>(
    mut buf: RefMut<'_, BytesMut>,
    hdr: &V::PacketHdr,
    ctx: &ChecksumCtx,
) -> Result<Bytes, EncodeError>
where
    V: Version,
{
    let length = u16::try_from(buf.len())
        .map_err(|_| EncodeError::PacketTooLong(buf.len()))?;
    buf[2..4].copy_from_slice(&length.to_be_bytes());
    hdr.update_cksum(&mut buf, ctx);
    Ok(buf.clone().freeze())
}

// Fails unless `buf` holds at least `len` bytes.
pub(crate) fn require(buf: &[u8], len: u16) -> DecodeResult<()> {
    let required = len as usize;
    if buf.len() < required {
        return Err(DecodeError::InsufficientData {
            required,
            available: buf.len(),
        });
    }
    Ok(())
}

// Decodes a list whose length is given by a count field.
pub(crate) fn decode_counted<T, C, E>(
    buf: &mut Bytes,
    count: usize,
    mut decode_fn: impl FnMut(&mut Bytes) -> Result<T, E>,
) -> DecodeResult<C>
where
    C: FromIterator<T>,
    DecodeError: From<E>,
{
    (0..count)
        .map(|_| decode_fn(buf).map_err(DecodeError::from))
        .collect()
}

// Decodes fixed-size records until fewer than `record_len` bytes are left.
// Leftover bytes stay in `buf` for the caller's trailing data check.
pub(crate) fn decode_exhausting<T, C, E>(
    buf: &mut Bytes,
    record_len: u16,
    decode_fn: impl FnMut(&mut Bytes) -> Result<T, E>,
) -> DecodeResult<C>
where
    C: FromIterator<T>,
    DecodeError: From<E>,
{
    let count = buf.remaining() / record_len as usize;
    decode_counted(buf, count, decode_fn)
}

// Skips `count` records of `record_len` bytes.
pub(crate) fn skip_counted(
    buf: &mut Bytes,
    count: usize,
    record_len: u16,
) -> DecodeResult<()> {
    buf.try_get_bytes(count * record_len as usize)?;
    Ok(())
}

// Skips as many whole `record_len` records as are left.
pub(crate) fn skip_exhausting(buf: &mut Bytes, record_len: u16) {
    let len = buf.remaining() - buf.remaining() % record_len as usize;
    buf.advance(len);
}

pub(crate) fn decode_lsa_hdrs<V>(
    buf: &mut Bytes,
) -> DecodeResult<Vec<LsaHdr<V>>>
where
    V: Version,
{
    decode_exhausting(buf, LsaHdr::<V>::LENGTH, LsaHdr::<V>::decode)
}
