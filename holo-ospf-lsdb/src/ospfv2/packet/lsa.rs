//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::sync::LazyLock as Lazy;

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use enum_as_inner::EnumAsInner;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::bytes::{BytesExt, BytesMutExt};
use crate::ospfv2::packet::Options;
use crate::packet::error::{DecodeError, DecodeResult, LsaValidationError};
use crate::packet::lsa::{
    LsaBodyVersion, LsaDecodeFn, LsaDecoder, LsaScope, LsaTypeVersion,
    LsaVersion,
};
use crate::packet::{
    decode_counted, decode_exhausting, skip_counted, skip_exhausting,
};
use crate::version::Ospfv2;

pub type LsaHdr = crate::packet::lsa::LsaHdr<Ospfv2>;

// The LS type octet of the LSA header.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct LsaType(pub u8);

// LS types with a body codec. Opaque LSAs (9-11) aren't among them.
#[derive(Clone, Copy, Debug, Eq, Ord, FromPrimitive, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum LsaTypeCode {
    Router = 1,
    Network = 2,
    SummaryNetwork = 3,
    SummaryRouter = 4,
    AsExternal = 5,
    Nssa = 7,
}

#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaBody {
    Router(LsaRouter),
    Network(LsaNetwork),
    SummaryNetwork(LsaSummary),
    SummaryRouter(LsaSummary),
    AsExternal(LsaAsExternal),
    Nssa(LsaAsExternal),
}

// Router-LSA: flags octet, zero octet, 16-bit link count, then that many
// 12-byte links. A link is followed by its own count of 4-byte TOS entries,
// which are skipped.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaRouter {
    pub flags: LsaRouterFlags,
    pub links: Vec<LsaRouterLink>,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct LsaRouterFlags: u8 {
        const B = 0x01;
        const E = 0x02;
        const V = 0x04;
        const NT = 0x10;
    }
}

#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaRouterLinkType {
    PointToPoint = 1,
    TransitNetwork = 2,
    StubNetwork = 3,
    VirtualLink = 4,
}

#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaRouterLink {
    pub link_type: LsaRouterLinkType,
    pub link_id: Ipv4Addr,
    pub link_data: Ipv4Addr,
    pub metric: u16,
}

// Network-LSA: mask, then attached routers up to the end of the LSA.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaNetwork {
    pub mask: Ipv4Addr,
    pub attached_rtrs: BTreeSet<Ipv4Addr>,
}

// Summary-LSA, types 3 and 4: mask, zero octet, 24-bit metric, then TOS
// words up to the end of the LSA, which are skipped.
#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaSummary {
    pub mask: Ipv4Addr,
    pub metric: u32,
}

// AS-External-LSA and NSSA-LSA, which share a layout: mask, E bit and
// 24-bit metric, forwarding address, route tag, then 12-byte TOS blocks up
// to the end of the LSA, which are skipped.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaAsExternal {
    pub mask: Ipv4Addr,
    pub flags: LsaAsExternalFlags,
    pub metric: u32,
    pub fwd_addr: Option<Ipv4Addr>,
    pub tag: u32,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct LsaAsExternalFlags: u8 {
        const E = 0x80;
    }
}

static LSA_DECODER: Lazy<LsaDecoder<Ospfv2>> = Lazy::new(|| {
    use LsaTypeCode::*;

    let codecs: [(LsaTypeCode, u16, LsaDecodeFn<Ospfv2>); 6] = [
        (Router, LsaRouter::BASE_LENGTH, decode_router),
        (Network, LsaNetwork::BASE_LENGTH, decode_network),
        (SummaryNetwork, LsaSummary::BASE_LENGTH, decode_summary),
        (SummaryRouter, LsaSummary::BASE_LENGTH, decode_summary),
        (AsExternal, LsaAsExternal::BASE_LENGTH, decode_external),
        (Nssa, LsaAsExternal::BASE_LENGTH, decode_external),
    ];
    let mut decoder = LsaDecoder::new();
    for (code, min_body_length, decode_fn) in codecs {
        decoder.register(code.into(), min_body_length, decode_fn);
    }
    decoder
});

// ===== impl LsaType =====

impl LsaType {
    pub fn type_code(&self) -> Option<LsaTypeCode> {
        LsaTypeCode::from_u8(self.0)
    }
}

impl LsaTypeVersion for LsaType {
    fn scope(&self) -> LsaScope {
        match self.type_code() {
            Some(LsaTypeCode::AsExternal) => LsaScope::As,
            Some(_) => LsaScope::Area,
            None => LsaScope::Unknown,
        }
    }
}

impl std::fmt::Display for LsaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<LsaTypeCode> for LsaType {
    fn from(code: LsaTypeCode) -> LsaType {
        LsaType(code as u8)
    }
}

// Only the low octet is meaningful.
impl From<u16> for LsaType {
    fn from(value: u16) -> LsaType {
        LsaType(value as u8)
    }
}

impl From<LsaType> for u16 {
    fn from(lsa_type: LsaType) -> u16 {
        lsa_type.0.into()
    }
}

// ===== impl LsaBody =====

impl LsaBody {
    pub fn as_summary(&self) -> Option<&LsaSummary> {
        match self {
            LsaBody::SummaryNetwork(body) | LsaBody::SummaryRouter(body) => {
                Some(body)
            }
            _ => None,
        }
    }

    pub fn as_external(&self) -> Option<&LsaAsExternal> {
        match self {
            LsaBody::AsExternal(body) | LsaBody::Nssa(body) => Some(body),
            _ => None,
        }
    }
}

impl LsaBodyVersion<Ospfv2> for LsaBody {
    fn encode(&self, buf: &mut BytesMut) {
        match self {
            LsaBody::Router(body) => body.encode(buf),
            LsaBody::Network(body) => body.encode(buf),
            LsaBody::SummaryNetwork(body) | LsaBody::SummaryRouter(body) => {
                body.encode(buf)
            }
            LsaBody::AsExternal(body) | LsaBody::Nssa(body) => {
                body.encode(buf)
            }
        }
    }

    fn lsa_type(&self) -> LsaType {
        let code = match self {
            LsaBody::Router(_) => LsaTypeCode::Router,
            LsaBody::Network(_) => LsaTypeCode::Network,
            LsaBody::SummaryNetwork(_) => LsaTypeCode::SummaryNetwork,
            LsaBody::SummaryRouter(_) => LsaTypeCode::SummaryRouter,
            LsaBody::AsExternal(_) => LsaTypeCode::AsExternal,
            LsaBody::Nssa(_) => LsaTypeCode::Nssa,
        };
        code.into()
    }

    fn validate(&self, hdr: &LsaHdr) -> Result<(), LsaValidationError> {
        // A router's own LSA is keyed by its router ID.
        if matches!(self, LsaBody::Router(_)) && hdr.lsa_id != hdr.adv_rtr {
            return Err(LsaValidationError::Ospfv2RouterLsaIdMismatch);
        }
        Ok(())
    }
}

// ===== impl LsaRouter =====

impl LsaRouter {
    pub const BASE_LENGTH: u16 = 4;
    const TOS_LENGTH: u16 = 4;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let flags = LsaRouterFlags::from_bits_truncate(buf.try_get_u8()?);
        buf.try_get_u8()?;
        let count = buf.try_get_u16()?.into();
        let links = decode_counted(buf, count, LsaRouterLink::decode)?;
        Ok(LsaRouter { flags, links })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags.bits());
        buf.put_u8(0);
        buf.put_u16(self.links.len() as u16);
        self.links.iter().for_each(|link| link.encode(buf));
    }
}

// ===== impl LsaRouterLink =====

impl LsaRouterLink {
    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let link_id = buf.try_get_ipv4()?;
        let link_data = buf.try_get_ipv4()?;
        let code = buf.try_get_u8()?;
        let link_type = LsaRouterLinkType::from_u8(code)
            .ok_or(DecodeError::UnknownRouterLinkType(code))?;
        let tos_count = buf.try_get_u8()?.into();
        let metric = buf.try_get_u16()?;
        skip_counted(buf, tos_count, LsaRouter::TOS_LENGTH)?;

        Ok(LsaRouterLink::new(link_type, link_id, link_data, metric))
    }

    // TOS entries aren't emitted.
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_ipv4(&self.link_id);
        buf.put_ipv4(&self.link_data);
        buf.put_u8(self.link_type as u8);
        buf.put_u8(0);
        buf.put_u16(self.metric);
    }
}

// ===== impl LsaNetwork =====

impl LsaNetwork {
    pub const BASE_LENGTH: u16 = 4;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        Ok(LsaNetwork {
            mask: buf.try_get_ipv4()?,
            attached_rtrs: decode_exhausting(buf, 4, Bytes::try_get_ipv4)?,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_ipv4(&self.mask);
        self.attached_rtrs.iter().for_each(|rtr| buf.put_ipv4(rtr));
    }
}

// ===== impl LsaSummary =====

impl LsaSummary {
    pub const BASE_LENGTH: u16 = 8;
    const TOS_LENGTH: u16 = 4;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let mask = buf.try_get_ipv4()?;
        let metric = buf.try_get_u32()? & 0x00ff_ffff;
        skip_exhausting(buf, Self::TOS_LENGTH);
        Ok(LsaSummary { mask, metric })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_ipv4(&self.mask);
        buf.put_u32(self.metric & 0x00ff_ffff);
    }
}

// ===== impl LsaAsExternal =====

impl LsaAsExternal {
    pub const BASE_LENGTH: u16 = 16;
    const TOS_LENGTH: u16 = 12;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let mask = buf.try_get_ipv4()?;
        let flags = LsaAsExternalFlags::from_bits_truncate(buf.try_get_u8()?);
        let metric = buf.try_get_u24()?;
        let fwd_addr = buf.try_get_opt_ipv4()?;
        let tag = buf.try_get_u32()?;
        skip_exhausting(buf, Self::TOS_LENGTH);

        Ok(LsaAsExternal {
            mask,
            flags,
            metric,
            fwd_addr,
            tag,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_ipv4(&self.mask);
        buf.put_u8(self.flags.bits());
        buf.put_u24(self.metric);
        buf.put_ipv4(&self.fwd_addr.unwrap_or(Ipv4Addr::UNSPECIFIED));
        buf.put_u32(self.tag);
    }

    // Type 2 metrics are compared before any internal cost.
    pub fn is_type2(&self) -> bool {
        self.flags.contains(LsaAsExternalFlags::E)
    }
}

// ===== impl Ospfv2 =====

impl LsaVersion<Self> for Ospfv2 {
    type LsaType = LsaType;
    type LsaBody = LsaBody;

    fn lsa_decoder() -> &'static LsaDecoder<Ospfv2> {
        &LSA_DECODER
    }

    // Options in the high octet, type in the low one.
    fn type_word(options: Option<Options>, lsa_type: LsaType) -> u16 {
        let options = options.unwrap_or_default().bits();
        u16::from_be_bytes([options, lsa_type.0])
    }

    fn split_type_word(word: u16) -> (Option<Options>, LsaType) {
        let [options, lsa_type] = word.to_be_bytes();
        (Some(Options::from_bits_truncate(options)), LsaType(lsa_type))
    }
}

// ===== helper functions =====

fn decode_router(_hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    LsaRouter::decode(buf).map(LsaBody::Router)
}

fn decode_network(_hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    LsaNetwork::decode(buf).map(LsaBody::Network)
}

// Types 3 and 4 differ only in what the LSA ID names.
fn decode_summary(hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    let body = LsaSummary::decode(buf)?;
    match hdr.lsa_type.type_code() {
        Some(LsaTypeCode::SummaryRouter) => Ok(LsaBody::SummaryRouter(body)),
        _ => Ok(LsaBody::SummaryNetwork(body)),
    }
}

// Types 5 and 7 share a layout and differ only in flooding scope.
fn decode_external(hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    let body = LsaAsExternal::decode(buf)?;
    match hdr.lsa_type.type_code() {
        Some(LsaTypeCode::Nssa) => Ok(LsaBody::Nssa(body)),
        _ => Ok(LsaBody::AsExternal(body)),
    }
}
