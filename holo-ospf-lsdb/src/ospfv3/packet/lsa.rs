//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock as Lazy;

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use enum_as_inner::EnumAsInner;
use ipnetwork::Ipv6Network;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::bytes::{BytesExt, BytesMutExt};
use crate::ospfv3::packet::Options;
use crate::packet::error::{DecodeError, DecodeResult, LsaValidationError};
use crate::packet::lsa::{
    LsaBodyVersion, LsaDecodeFn, LsaDecoder, LsaScope, LsaTypeVersion,
    LsaVersion,
};
use crate::packet::{decode_counted, decode_exhausting};
use crate::version::Ospfv3;

pub type LsaHdr = crate::packet::lsa::LsaHdr<Ospfv3>;

// PrefixOptions octet (RFC 5340 A.4.1.1, RFC 8362).
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct PrefixOptions: u8 {
        const NU = 0x01;
        const LA = 0x02;
        const P = 0x08;
        const DN = 0x10;
        const N = 0x20;
    }
}

// The 16-bit LS type: U bit, two scope bits and a 13-bit function code.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct LsaType(pub u16);

// The S2/S1 bits, left in place.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum LsaScopeCode {
    Link = 0x0000,
    Area = 0x2000,
    As = 0x4000,
    Reserved = 0x6000,
}

// Function codes with a body codec.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum LsaFunctionCode {
    Router = 1,
    Network = 2,
    InterAreaPrefix = 3,
    InterAreaRouter = 4,
    AsExternal = 5,
    Nssa = 7,
    Link = 8,
    IntraAreaPrefix = 9,
}

#[derive(Clone, Debug, Eq, PartialEq, EnumAsInner)]
#[derive(Deserialize, Serialize)]
pub enum LsaBody {
    Router(LsaRouter),
    Network(LsaNetwork),
    InterAreaPrefix(LsaInterAreaPrefix),
    InterAreaRouter(LsaInterAreaRouter),
    AsExternal(LsaAsExternal),
    Nssa(LsaAsExternal),
    Link(LsaLink),
    IntraAreaPrefix(LsaIntraAreaPrefix),
    Unknown(LsaUnknown),
}

// Router-LSA: flags octet and 24-bit options, then 16-byte links up to the
// end of the LSA.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaRouter {
    pub flags: LsaRouterFlags,
    pub options: Options,
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

// There's no stub link type: v3 advertises prefixes in separate LSAs.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaRouterLinkType {
    PointToPoint = 1,
    TransitNetwork = 2,
    VirtualLink = 4,
}

// Type, zero octet, metric, interface ID, neighbor interface ID and
// neighbor router ID.
#[derive(Clone, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaRouterLink {
    pub link_type: LsaRouterLinkType,
    pub metric: u16,
    pub iface_id: u32,
    pub nbr_iface_id: u32,
    pub nbr_router_id: Ipv4Addr,
}

// Network-LSA: zero octet and 24-bit options, then attached routers up to
// the end of the LSA.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaNetwork {
    pub options: Options,
    pub attached_rtrs: BTreeSet<Ipv4Addr>,
}

// Inter-Area-Prefix-LSA: zero octet and 24-bit metric, then one prefix
// record whose 16-bit field is zero.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaInterAreaPrefix {
    pub metric: u32,
    pub prefix_options: PrefixOptions,
    pub prefix: Ipv6Network,
}

// Inter-Area-Router-LSA: zero octet and 24-bit options, zero octet and
// 24-bit metric, destination router ID.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaInterAreaRouter {
    pub options: Options,
    pub metric: u32,
    pub router_id: Ipv4Addr,
}

// AS-External-LSA and NSSA-LSA, which share a layout: flags octet and
// 24-bit metric, then one prefix record whose 16-bit field is the
// referenced LS type. The forwarding address, route tag and referenced
// LSA ID follow, each present only when its flag or the referenced type
// says so.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaAsExternal {
    pub flags: LsaAsExternalFlags,
    pub metric: u32,
    pub prefix_options: PrefixOptions,
    pub prefix: Ipv6Network,
    pub fwd_addr: Option<Ipv6Addr>,
    pub tag: Option<u32>,
    pub ref_lsa_type: Option<LsaType>,
    pub ref_lsa_id: Option<Ipv4Addr>,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    #[serde(transparent)]
    pub struct LsaAsExternalFlags: u8 {
        const T = 0x01;
        const F = 0x02;
        const E = 0x04;
    }
}

// Link-LSA: priority and 24-bit options, link-local address, 32-bit
// prefix count, then that many prefix records whose 16-bit field is zero.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaLink {
    pub priority: u8,
    pub options: Options,
    pub linklocal: Ipv6Addr,
    pub prefixes: Vec<LsaLinkPrefix>,
}

#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaLinkPrefix {
    pub options: PrefixOptions,
    pub value: Ipv6Network,
}

// Intra-Area-Prefix-LSA: 16-bit prefix count, referenced LS type, LSA ID
// and advertising router, then that many prefix records whose 16-bit
// field is the metric.
#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaIntraAreaPrefix {
    pub ref_lsa_type: LsaType,
    pub ref_lsa_id: Ipv4Addr,
    pub ref_adv_rtr: Ipv4Addr,
    pub prefixes: Vec<LsaIntraAreaPrefixEntry>,
}

#[derive(Clone, Debug, Eq, new, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaIntraAreaPrefixEntry {
    pub options: PrefixOptions,
    pub value: Ipv6Network,
    pub metric: u16,
}

// Body of an LSA without a codec, kept as is so it can be flooded.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaUnknown {
    pub lsa_type: LsaType,
    pub data: Bytes,
}

// Prefix length, options, a 16-bit field whose meaning depends on the LSA,
// and the address bits padded to whole words.
struct PrefixRecord {
    options: PrefixOptions,
    field: u16,
    prefix: Ipv6Network,
}

static LSA_DECODER: Lazy<LsaDecoder<Ospfv3>> = Lazy::new(|| {
    use LsaFunctionCode::*;

    let codecs: [(LsaFunctionCode, u16, LsaDecodeFn<Ospfv3>); 8] = [
        (Router, LsaRouter::BASE_LENGTH, decode_router),
        (Network, LsaNetwork::BASE_LENGTH, decode_network),
        (InterAreaPrefix, LsaInterAreaPrefix::BASE_LENGTH, decode_iap),
        (InterAreaRouter, LsaInterAreaRouter::BASE_LENGTH, decode_iar),
        (AsExternal, LsaAsExternal::BASE_LENGTH, decode_external),
        (Nssa, LsaAsExternal::BASE_LENGTH, decode_external),
        (Link, LsaLink::BASE_LENGTH, decode_link),
        (IntraAreaPrefix, LsaIntraAreaPrefix::BASE_LENGTH, decode_intra),
    ];
    let mut decoder = LsaDecoder::new();
    for (code, min_body_length, decode_fn) in codecs {
        decoder.register(code.into(), min_body_length, decode_fn);
    }
    decoder.register_unknown(decode_unknown);
    decoder
});

// ===== impl LsaType =====

impl LsaType {
    pub const U_BIT_MASK: u16 = 0x8000;
    pub const SCOPE_MASK: u16 = 0x6000;
    pub const FUNCTION_CODE_MASK: u16 = 0x1fff;

    // Whether routers that don't know the type should flood it anyway.
    pub fn u_bit(&self) -> bool {
        self.0 & Self::U_BIT_MASK != 0
    }

    pub fn scope_code(&self) -> LsaScopeCode {
        LsaScopeCode::from_u16(self.0 & Self::SCOPE_MASK)
            .unwrap_or(LsaScopeCode::Reserved)
    }

    pub fn function_code(&self) -> Option<LsaFunctionCode> {
        LsaFunctionCode::from_u16(self.0 & Self::FUNCTION_CODE_MASK)
    }
}

impl LsaTypeVersion for LsaType {
    fn scope(&self) -> LsaScope {
        match self.scope_code() {
            LsaScopeCode::Link => LsaScope::Link,
            LsaScopeCode::Area => LsaScope::Area,
            LsaScopeCode::As => LsaScope::As,
            LsaScopeCode::Reserved => LsaScope::Unknown,
        }
    }
}

impl std::fmt::Display for LsaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

// The scope of each standard type is fixed, and the U bit is clear.
impl From<LsaFunctionCode> for LsaType {
    fn from(code: LsaFunctionCode) -> LsaType {
        let scope = match code {
            LsaFunctionCode::Link => LsaScopeCode::Link,
            LsaFunctionCode::AsExternal => LsaScopeCode::As,
            _ => LsaScopeCode::Area,
        };
        LsaType(scope as u16 | code as u16)
    }
}

impl From<u16> for LsaType {
    fn from(value: u16) -> LsaType {
        LsaType(value)
    }
}

impl From<LsaType> for u16 {
    fn from(lsa_type: LsaType) -> u16 {
        lsa_type.0
    }
}

// ===== impl LsaBody =====

impl LsaBody {
    pub fn as_external(&self) -> Option<&LsaAsExternal> {
        match self {
            LsaBody::AsExternal(body) | LsaBody::Nssa(body) => Some(body),
            _ => None,
        }
    }
}

impl LsaBodyVersion<Ospfv3> for LsaBody {
    fn encode(&self, buf: &mut BytesMut) {
        match self {
            LsaBody::Router(body) => body.encode(buf),
            LsaBody::Network(body) => body.encode(buf),
            LsaBody::InterAreaPrefix(body) => body.encode(buf),
            LsaBody::InterAreaRouter(body) => body.encode(buf),
            LsaBody::AsExternal(body) | LsaBody::Nssa(body) => {
                body.encode(buf)
            }
            LsaBody::Link(body) => body.encode(buf),
            LsaBody::IntraAreaPrefix(body) => body.encode(buf),
            LsaBody::Unknown(body) => buf.put_slice(&body.data),
        }
    }

    fn lsa_type(&self) -> LsaType {
        use LsaFunctionCode as Code;

        let code = match self {
            LsaBody::Router(_) => Code::Router,
            LsaBody::Network(_) => Code::Network,
            LsaBody::InterAreaPrefix(_) => Code::InterAreaPrefix,
            LsaBody::InterAreaRouter(_) => Code::InterAreaRouter,
            LsaBody::AsExternal(_) => Code::AsExternal,
            LsaBody::Nssa(_) => Code::Nssa,
            LsaBody::Link(_) => Code::Link,
            LsaBody::IntraAreaPrefix(_) => Code::IntraAreaPrefix,
            LsaBody::Unknown(body) => return body.lsa_type,
        };
        code.into()
    }

    fn validate(&self, _hdr: &LsaHdr) -> Result<(), LsaValidationError> {
        Ok(())
    }
}

// ===== impl LsaRouter =====

impl LsaRouter {
    pub const BASE_LENGTH: u16 = 4;
    pub const LINK_LENGTH: u16 = 16;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        Ok(LsaRouter {
            flags: LsaRouterFlags::from_bits_truncate(buf.try_get_u8()?),
            options: Options::decode(buf)?,
            links: decode_exhausting(
                buf,
                Self::LINK_LENGTH,
                LsaRouterLink::decode,
            )?,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags.bits());
        self.options.encode(buf);
        self.links.iter().for_each(|link| link.encode(buf));
    }
}

// ===== impl LsaRouterLink =====

impl LsaRouterLink {
    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let code = buf.try_get_u8()?;
        let link_type = LsaRouterLinkType::from_u8(code)
            .ok_or(DecodeError::UnknownRouterLinkType(code))?;
        buf.try_get_u8()?;

        Ok(LsaRouterLink {
            link_type,
            metric: buf.try_get_u16()?,
            iface_id: buf.try_get_u32()?,
            nbr_iface_id: buf.try_get_u32()?,
            nbr_router_id: buf.try_get_ipv4()?,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.link_type as u8);
        buf.put_u8(0);
        buf.put_u16(self.metric);
        buf.put_u32(self.iface_id);
        buf.put_u32(self.nbr_iface_id);
        buf.put_ipv4(&self.nbr_router_id);
    }
}

// ===== impl LsaNetwork =====

impl LsaNetwork {
    pub const BASE_LENGTH: u16 = 4;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        buf.try_get_u8()?;
        Ok(LsaNetwork {
            options: Options::decode(buf)?,
            attached_rtrs: decode_exhausting(buf, 4, Bytes::try_get_ipv4)?,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0);
        self.options.encode(buf);
        self.attached_rtrs.iter().for_each(|rtr| buf.put_ipv4(rtr));
    }
}

// ===== impl LsaInterAreaPrefix =====

impl LsaInterAreaPrefix {
    pub const BASE_LENGTH: u16 = 8;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let metric = decode_metric(buf)?;
        let record = PrefixRecord::decode(buf)?;

        Ok(LsaInterAreaPrefix {
            metric,
            prefix_options: record.options,
            prefix: record.prefix,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.metric & 0x00ff_ffff);
        PrefixRecord::encode(buf, &self.prefix, self.prefix_options, 0);
    }
}

// ===== impl LsaInterAreaRouter =====

impl LsaInterAreaRouter {
    pub const BASE_LENGTH: u16 = 12;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        buf.try_get_u8()?;
        Ok(LsaInterAreaRouter {
            options: Options::decode(buf)?,
            metric: decode_metric(buf)?,
            router_id: buf.try_get_ipv4()?,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0);
        self.options.encode(buf);
        buf.put_u32(self.metric & 0x00ff_ffff);
        buf.put_ipv4(&self.router_id);
    }
}

// ===== impl LsaAsExternal =====

impl LsaAsExternal {
    pub const BASE_LENGTH: u16 = 8;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let flags = LsaAsExternalFlags::from_bits_truncate(buf.try_get_u8()?);
        let metric = buf.try_get_u24()?;
        let record = PrefixRecord::decode(buf)?;

        let fwd_addr = flags
            .contains(LsaAsExternalFlags::F)
            .then(|| buf.try_get_ipv6())
            .transpose()?;
        let tag = flags
            .contains(LsaAsExternalFlags::T)
            .then(|| buf.try_get_u32())
            .transpose()?;
        let ref_lsa_type = (record.field != 0).then_some(LsaType(record.field));
        let ref_lsa_id = ref_lsa_type
            .map(|_| buf.try_get_ipv4())
            .transpose()?;

        Ok(LsaAsExternal {
            flags,
            metric,
            prefix_options: record.options,
            prefix: record.prefix,
            fwd_addr,
            tag,
            ref_lsa_type,
            ref_lsa_id,
        })
    }

    // The F and T bits follow the optional fields, whatever `flags` says.
    fn encode(&self, buf: &mut BytesMut) {
        let mut flags = self.flags;
        flags.set(LsaAsExternalFlags::F, self.fwd_addr.is_some());
        flags.set(LsaAsExternalFlags::T, self.tag.is_some());
        let ref_lsa_type = self.ref_lsa_type.map_or(0, |lsa_type| lsa_type.0);

        buf.put_u8(flags.bits());
        buf.put_u24(self.metric);
        let prefix_options = self.prefix_options;
        PrefixRecord::encode(buf, &self.prefix, prefix_options, ref_lsa_type);
        if let Some(fwd_addr) = &self.fwd_addr {
            buf.put_ipv6(fwd_addr);
        }
        if let Some(tag) = self.tag {
            buf.put_u32(tag);
        }
        if ref_lsa_type != 0 {
            buf.put_ipv4(&self.ref_lsa_id.unwrap_or(Ipv4Addr::UNSPECIFIED));
        }
    }

    // Type 2 metrics are compared before any internal cost.
    pub fn is_type2(&self) -> bool {
        self.flags.contains(LsaAsExternalFlags::E)
    }
}

// ===== impl LsaLink =====

impl LsaLink {
    pub const BASE_LENGTH: u16 = 24;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let priority = buf.try_get_u8()?;
        let options = Options::decode(buf)?;
        let linklocal = buf.try_get_ipv6()?;
        let count = buf.try_get_u32()? as usize;
        let prefixes = decode_counted(buf, count, |buf| {
            let record = PrefixRecord::decode(buf)?;
            Ok::<_, DecodeError>(LsaLinkPrefix::new(
                record.options,
                record.prefix,
            ))
        })?;

        Ok(LsaLink {
            priority,
            options,
            linklocal,
            prefixes,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.priority);
        self.options.encode(buf);
        buf.put_ipv6(&self.linklocal);
        buf.put_u32(self.prefixes.len() as u32);
        for prefix in &self.prefixes {
            PrefixRecord::encode(buf, &prefix.value, prefix.options, 0);
        }
    }
}

// ===== impl LsaIntraAreaPrefix =====

impl LsaIntraAreaPrefix {
    pub const BASE_LENGTH: u16 = 12;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let count = buf.try_get_u16()?.into();
        let ref_lsa_type = LsaType(buf.try_get_u16()?);
        let ref_lsa_id = buf.try_get_ipv4()?;
        let ref_adv_rtr = buf.try_get_ipv4()?;
        let prefixes = decode_counted(buf, count, |buf| {
            let record = PrefixRecord::decode(buf)?;
            Ok::<_, DecodeError>(LsaIntraAreaPrefixEntry::new(
                record.options,
                record.prefix,
                record.field,
            ))
        })?;

        Ok(LsaIntraAreaPrefix {
            ref_lsa_type,
            ref_lsa_id,
            ref_adv_rtr,
            prefixes,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.prefixes.len() as u16);
        buf.put_u16(self.ref_lsa_type.0);
        buf.put_ipv4(&self.ref_lsa_id);
        buf.put_ipv4(&self.ref_adv_rtr);
        for prefix in &self.prefixes {
            let (options, metric) = (prefix.options, prefix.metric);
            PrefixRecord::encode(buf, &prefix.value, options, metric);
        }
    }
}

// ===== impl PrefixRecord =====

impl PrefixRecord {
    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let plen = buf.try_get_u8()?;
        let options = PrefixOptions::from_bits_truncate(buf.try_get_u8()?);
        let field = buf.try_get_u16()?;
        let prefix = decode_prefix(plen, buf)?;

        Ok(PrefixRecord {
            options,
            field,
            prefix,
        })
    }

    fn encode(
        buf: &mut BytesMut,
        prefix: &Ipv6Network,
        options: PrefixOptions,
        field: u16,
    ) {
        buf.put_u8(prefix.prefix());
        buf.put_u8(options.bits());
        buf.put_u16(field);
        encode_prefix(prefix, buf);
    }
}

// ===== impl Ospfv3 =====

impl LsaVersion<Self> for Ospfv3 {
    type LsaType = LsaType;
    type LsaBody = LsaBody;

    fn lsa_decoder() -> &'static LsaDecoder<Ospfv3> {
        &LSA_DECODER
    }

    // The header has no options; the whole word is the type.
    fn type_word(_options: Option<Options>, lsa_type: LsaType) -> u16 {
        lsa_type.0
    }

    fn split_type_word(word: u16) -> (Option<Options>, LsaType) {
        (None, LsaType(word))
    }
}

// ===== global functions =====

// Bytes taken by the address part of a prefix of length `plen`.
pub fn prefix_wire_len(plen: u8) -> usize {
    usize::from(plen).div_ceil(32) * 4
}

pub fn decode_prefix(plen: u8, buf: &mut Bytes) -> DecodeResult<Ipv6Network> {
    if plen > 128 {
        return Err(DecodeError::InvalidIpPrefix);
    }
    let mut octets = [0; 16];
    buf.try_copy_to_slice(&mut octets[..prefix_wire_len(plen)])?;
    Ipv6Network::new(Ipv6Addr::from(octets), plen)
        .map_err(|_| DecodeError::InvalidIpPrefix)
}

pub fn encode_prefix(prefix: &Ipv6Network, buf: &mut BytesMut) {
    let octets = prefix.ip().octets();
    buf.put_slice(&octets[..prefix_wire_len(prefix.prefix())]);
}

// ===== helper functions =====

// A zero octet and a 24-bit metric.
fn decode_metric(buf: &mut Bytes) -> DecodeResult<u32> {
    Ok(buf.try_get_u32()? & 0x00ff_ffff)
}

fn decode_router(_hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    LsaRouter::decode(buf).map(LsaBody::Router)
}

fn decode_network(_hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    LsaNetwork::decode(buf).map(LsaBody::Network)
}

fn decode_iap(_hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    LsaInterAreaPrefix::decode(buf).map(LsaBody::InterAreaPrefix)
}

fn decode_iar(_hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    LsaInterAreaRouter::decode(buf).map(LsaBody::InterAreaRouter)
}

// AS-External and NSSA share a layout and differ only in flooding scope.
fn decode_external(hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    let body = LsaAsExternal::decode(buf)?;
    match hdr.lsa_type.function_code() {
        Some(LsaFunctionCode::Nssa) => Ok(LsaBody::Nssa(body)),
        _ => Ok(LsaBody::AsExternal(body)),
    }
}

fn decode_link(_hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    LsaLink::decode(buf).map(LsaBody::Link)
}

fn decode_intra(_hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    LsaIntraAreaPrefix::decode(buf).map(LsaBody::IntraAreaPrefix)
}

fn decode_unknown(hdr: &LsaHdr, buf: &mut Bytes) -> DecodeResult<LsaBody> {
    let data = buf.split_to(buf.remaining());
    Ok(LsaBody::Unknown(LsaUnknown {
        lsa_type: hdr.lsa_type,
        data,
    }))
}
