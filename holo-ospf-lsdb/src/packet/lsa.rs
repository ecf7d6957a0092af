//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::bytes::{BytesExt, BytesMutExt, TLS_BUF};
use crate::lsdb::{LSA_MAX_AGE, LSA_RESERVED_SEQ_NO};
use crate::packet::error::{
    DecodeError, DecodeResult, EncodeError, LsaValidationError,
};
use crate::version::Version;

// Byte offsets of the LSA header fields patched after encoding.
const AGE_RANGE: std::ops::Range<usize> = 0..2;
const SEQ_NO_RANGE: std::ops::Range<usize> = 12..16;
const CKSUM_RANGE: std::ops::Range<usize> = 16..18;
const LENGTH_RANGE: std::ops::Range<usize> = 18..20;

// OSPF LSA.
//
// `raw` is the wire form of `hdr` and `body`. Both views are produced
// together by `Lsa::new` and `Lsa::decode`; afterwards only the age may be
// patched, since it's outside the checksum.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(bound = "V: Version")]
pub struct Lsa<V: Version> {
    #[cfg_attr(feature = "testing", serde(default, skip_serializing))]
    pub raw: Bytes,
    pub hdr: LsaHdr<V>,
    pub body: V::LsaBody,
}

// LSA header.
//
// Both versions use the same 20-byte layout. The only difference is the
// 16-bit word after the age: OSPFv2 packs the options and a one-byte type
// in it, OSPFv3 uses it whole for the type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(bound = "V: Version")]
pub struct LsaHdr<V: Version> {
    pub age: u16,
    pub options: Option<V::PacketOptions>,
    pub lsa_type: V::LsaType,
    pub lsa_id: Ipv4Addr,
    pub adv_rtr: Ipv4Addr,
    pub seq_no: u32,
    pub cksum: u16,
    pub length: u16,
}

// Identifies an LSA independently of its instance. Also used as the LSDB
// key, so the field order defines the iteration order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, new)]
#[derive(Deserialize, Serialize)]
pub struct LsaKey<T: LsaTypeVersion> {
    #[serde(bound = "T: LsaTypeVersion")]
    pub lsa_type: T,
    pub adv_rtr: Ipv4Addr,
    pub lsa_id: Ipv4Addr,
}

// Flooding scope of an LSA.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaScope {
    Link,
    Area,
    As,
    Unknown,
}

// Body decoder of a single LSA type. The buffer is limited to the body, as
// delimited by the header's length field.
pub type LsaDecodeFn<V> = fn(
    &LsaHdr<V>,
    &mut Bytes,
) -> DecodeResult<<V as LsaVersion<V>>::LsaBody>;

// LSA type -> body decoder table.
#[derive(Debug)]
pub struct LsaDecoder<V: Version> {
    entries: BTreeMap<V::LsaType, LsaDecoderEntry<V>>,
    unknown: Option<LsaDecodeFn<V>>,
}

#[derive(Debug)]
struct LsaDecoderEntry<V: Version> {
    min_body_length: u16,
    decode_fn: LsaDecodeFn<V>,
}

// OSPF version-specific code.
pub trait LsaVersion<V: Version> {
    type LsaType: LsaTypeVersion;
    type LsaBody: LsaBodyVersion<V>;

    // The decoder table used by `Lsa::decode`.
    fn lsa_decoder() -> &'static LsaDecoder<V>;

    // Packs the header word that follows the LSA age.
    fn type_word(options: Option<V::PacketOptions>, lsa_type: V::LsaType)
    -> u16;

    // Unpacks the header word that follows the LSA age.
    fn split_type_word(word: u16) -> (Option<V::PacketOptions>, V::LsaType);
}

// OSPF version-specific code.
pub trait LsaTypeVersion
where
    Self: Send
        + Sync
        + Clone
        + Copy
        + Ord
        + PartialOrd
        + std::fmt::Debug
        + std::fmt::Display
        + std::hash::Hash
        + From<u16>
        + Into<u16>
        + Serialize
        + DeserializeOwned,
{
    fn scope(&self) -> LsaScope;
}

// OSPF version-specific code.
pub trait LsaBodyVersion<V: Version>
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
    fn encode(&self, buf: &mut BytesMut);
    fn lsa_type(&self) -> V::LsaType;
    fn validate(&self, hdr: &LsaHdr<V>) -> Result<(), LsaValidationError>;
}

// ===== impl Lsa =====

impl<V> Lsa<V>
where
    V: Version,
{
    // Builds and encodes a new LSA. The length and checksum are computed
    // from the body.
    pub fn new(
        age: u16,
        options: Option<V::PacketOptions>,
        lsa_id: Ipv4Addr,
        adv_rtr: Ipv4Addr,
        seq_no: u32,
        body: V::LsaBody,
    ) -> Result<Self, EncodeError> {
        let hdr =
            LsaHdr::new(age, options, body.lsa_type(), lsa_id, adv_rtr, seq_no);
        let mut lsa = Lsa {
            raw: Bytes::new(),
            hdr,
            body,
        };
        lsa.encode()?;
        Ok(lsa)
    }

    // Returns a copy of this LSA with a new sequence number and a zero age.
    //
    // The body is unchanged, so the encoded LSA is patched rather than
    // rebuilt: only the checksum has to be recomputed.
    pub fn with_seq_no(&self, seq_no: u32) -> Self {
        let mut raw = BytesMut::from(self.raw.as_ref());
        raw[AGE_RANGE].copy_from_slice(&0u16.to_be_bytes());
        raw[SEQ_NO_RANGE].copy_from_slice(&seq_no.to_be_bytes());
        raw[CKSUM_RANGE].copy_from_slice(&[0, 0]);
        let cksum = checkbytes(&raw[2..]);
        raw[CKSUM_RANGE].copy_from_slice(&cksum);

        let mut hdr = self.hdr;
        hdr.age = 0;
        hdr.seq_no = seq_no;
        hdr.cksum = u16::from_be_bytes(cksum);
        Lsa {
            raw: raw.freeze(),
            hdr,
            body: self.body.clone(),
        }
    }

    // Updates the age in both views.
    pub fn set_age(&mut self, age: u16) {
        self.hdr.age = age;

        let mut raw = BytesMut::from(self.raw.as_ref());
        raw[AGE_RANGE].copy_from_slice(&age.to_be_bytes());
        self.raw = raw.freeze();
    }

    pub fn set_maxage(&mut self) {
        self.set_age(LSA_MAX_AGE);
    }

    // Decodes one LSA using the version's decoder table. On success the
    // buffer is advanced past the LSA.
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        V::lsa_decoder().decode(buf)
    }

    // Serializes the LSA into `raw`, filling in the header length and
    // checksum.
    pub(crate) fn encode(&mut self) -> Result<(), EncodeError> {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();
            self.hdr.cksum = 0;
            self.hdr.length = 0;
            self.hdr.encode(&mut buf);
            self.body.encode(&mut buf);

            // The length field is 16 bits wide.
            let length = u16::try_from(buf.len())
                .map_err(|_| EncodeError::LsaTooLong(buf.len()))?;
            buf[LENGTH_RANGE].copy_from_slice(&length.to_be_bytes());
            let cksum = checkbytes(&buf[2..]);
            buf[CKSUM_RANGE].copy_from_slice(&cksum);

            self.hdr.length = length;
            self.hdr.cksum = u16::from_be_bytes(cksum);
            self.raw = buf.clone().freeze();
            Ok(())
        })
    }

    // Checks the header fields and the body invariants.
    pub fn validate(&self) -> Result<(), LsaValidationError> {
        if self.hdr.age > LSA_MAX_AGE {
            return Err(LsaValidationError::InvalidLsaAge);
        }
        if self.hdr.seq_no == LSA_RESERVED_SEQ_NO {
            return Err(LsaValidationError::InvalidLsaSeqNo);
        }
        if !self.is_checksum_valid() {
            return Err(LsaValidationError::InvalidChecksum);
        }
        self.body.validate(&self.hdr)
    }

    pub fn is_checksum_valid(&self) -> bool {
        is_checksum_valid(&self.raw)
    }
}

// ===== impl LsaHdr =====

impl<V> LsaHdr<V>
where
    V: Version,
{
    pub const LENGTH: u16 = 20;

    // Creates a header with zeroed checksum and length.
    //
    // The options go through the wire form of the type word, so that a
    // locally built header compares equal to its decoded counterpart.
    pub fn new(
        age: u16,
        options: Option<V::PacketOptions>,
        lsa_type: V::LsaType,
        lsa_id: Ipv4Addr,
        adv_rtr: Ipv4Addr,
        seq_no: u32,
    ) -> Self {
        let (options, lsa_type) =
            V::split_type_word(V::type_word(options, lsa_type));
        LsaHdr {
            age,
            options,
            lsa_type,
            lsa_id,
            adv_rtr,
            seq_no,
            cksum: 0,
            length: 0,
        }
    }

    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let age = buf.try_get_u16()?;
        let (options, lsa_type) = V::split_type_word(buf.try_get_u16()?);
        Ok(LsaHdr {
            age,
            options,
            lsa_type,
            lsa_id: buf.try_get_ipv4()?,
            adv_rtr: buf.try_get_ipv4()?,
            seq_no: buf.try_get_u32()?,
            cksum: buf.try_get_u16()?,
            length: buf.try_get_u16()?,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.age);
        buf.put_u16(V::type_word(self.options, self.lsa_type));
        buf.put_ipv4(&self.lsa_id);
        buf.put_ipv4(&self.adv_rtr);
        buf.put_u32(self.seq_no);
        buf.put_u16(self.cksum);
        buf.put_u16(self.length);
    }

    // Reads the length field of an encoded header without decoding it.
    pub fn peek_length(data: &[u8]) -> Option<u16> {
        length_field(data)
    }

    pub fn key(&self) -> LsaKey<V::LsaType> {
        LsaKey::new(self.lsa_type, self.adv_rtr, self.lsa_id)
    }

    pub fn is_maxage(&self) -> bool {
        self.age == LSA_MAX_AGE
    }

    // Two headers describe the same instance when everything but the age
    // matches.
    pub fn same_instance(&self, other: &Self) -> bool {
        LsaHdr { age: 0, ..*self } == LsaHdr { age: 0, ..*other }
    }
}

// ===== impl LsaDecoder =====

impl<V> LsaDecoder<V>
where
    V: Version,
{
    pub fn new() -> Self {
        LsaDecoder {
            entries: BTreeMap::new(),
            unknown: None,
        }
    }

    // Panics if `lsa_type` already has a decoder.
    pub fn register(
        &mut self,
        lsa_type: V::LsaType,
        min_body_length: u16,
        decode_fn: LsaDecodeFn<V>,
    ) {
        let entry = LsaDecoderEntry {
            min_body_length,
            decode_fn,
        };
        if self.entries.insert(lsa_type, entry).is_some() {
            panic!("LSA type {} registered twice", lsa_type);
        }
    }

    // Sets the fallback decoder for types without an entry. Without one,
    // such LSAs fail with `UnknownLsaType`.
    pub fn register_unknown(&mut self, decode_fn: LsaDecodeFn<V>) {
        self.unknown = Some(decode_fn);
    }

    pub fn is_registered(&self, lsa_type: V::LsaType) -> bool {
        self.entries.contains_key(&lsa_type)
    }

    // Length of the shortest LSA any entry accepts, header included. The
    // fallback decoder accepts an empty body.
    pub fn min_length(&self) -> u16 {
        let fallback = self.unknown.map(|_| 0);
        let min_body = self
            .entries
            .values()
            .map(|entry| entry.min_body_length)
            .chain(fallback)
            .min()
            .unwrap_or(0);
        LsaHdr::<V>::LENGTH + min_body
    }

    // Decodes one LSA and advances the buffer past it. The buffer contents
    // are unspecified on failure.
    pub fn decode(&self, buf: &mut Bytes) -> DecodeResult<Lsa<V>> {
        let required = self.min_length() as usize;
        if buf.remaining() < required {
            return Err(DecodeError::InsufficientData {
                required,
                available: buf.remaining(),
            });
        }

        let hdr = LsaHdr::<V>::decode(&mut buf.clone())?;
        let (min_body_length, decode_fn) =
            match (self.entries.get(&hdr.lsa_type), self.unknown) {
                (Some(entry), _) => (entry.min_body_length, entry.decode_fn),
                (None, Some(decode_fn)) => (0, decode_fn),
                (None, None) => {
                    return Err(DecodeError::UnknownLsaType(
                        hdr.lsa_type.into(),
                    ));
                }
            };

        let min = LsaHdr::<V>::LENGTH + min_body_length;
        if hdr.length < min {
            return Err(DecodeError::InvalidLsaLength {
                length: hdr.length,
                min,
            });
        }
        if hdr.length as usize > buf.remaining() {
            return Err(DecodeError::LsaLengthOverrun {
                length: hdr.length,
                available: buf.remaining(),
            });
        }

        let raw = buf.split_to(hdr.length as usize);
        if !is_checksum_valid(&raw) {
            return Err(DecodeError::InvalidLsaChecksum);
        }

        let mut body_buf = raw.slice(LsaHdr::<V>::LENGTH as usize..);
        let body = decode_fn(&hdr, &mut body_buf)?;
        if !body_buf.is_empty() {
            return Err(DecodeError::LsaTrailingData(body_buf.len()));
        }

        Ok(Lsa { raw, hdr, body })
    }
}

impl<V> Default for LsaDecoder<V>
where
    V: Version,
{
    fn default() -> Self {
        LsaDecoder::new()
    }
}

// ===== global functions =====

// Verifies the Fletcher checksum of an encoded LSA. The age isn't covered.
pub fn is_checksum_valid(raw: &[u8]) -> bool {
    match length_field(raw).map(usize::from) {
        Some(length) if length >= 20 && raw.len() >= length => {
            fletcher::calc_fletcher16(&raw[2..length]) == 0
        }
        _ => false,
    }
}

// ===== helper functions =====

fn length_field(data: &[u8]) -> Option<u16> {
    let field = data.get(LENGTH_RANGE)?;
    Some(u16::from_be_bytes([field[0], field[1]]))
}

// ISO 8473 check octets for an LSA without its age field. The checksum
// field, at offset 14 of `data`, must be zero.
fn checkbytes(data: &[u8]) -> [u8; 2] {
    let sum = fletcher::calc_fletcher16(data);
    let c0 = i32::from(sum & 0xff);
    let c1 = i32::from(sum >> 8);

    // Number of octets after the first check octet.
    let tail = data.len() as i32 - 15;
    let x = match (tail * c0 - c1).rem_euclid(255) {
        0 => 255,
        x => x,
    };
    let y = match 510 - c0 - x {
        y if y > 255 => y - 255,
        y => y,
    };
    [x as u8, y as u8]
}
