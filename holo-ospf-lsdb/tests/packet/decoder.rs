//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::sync::atomic::{self, AtomicUsize};

use bytes::{Buf, Bytes};
use holo_ospf_lsdb::ospfv2::packet::lsa::{
    LsaBody, LsaSummary, LsaType, LsaTypeCode,
};
use holo_ospf_lsdb::packet::error::DecodeError;
use holo_ospf_lsdb::packet::lsa::{Lsa, LsaDecoder};
use holo_ospf_lsdb::packet::{
    AnyPacket, ChecksumCtx, Packet, PacketDecoder, PacketType,
    peek_version_type,
};
use holo_ospf_lsdb::version::{Ospfv2, Ospfv3};

const CTX: ChecksumCtx = ChecksumCtx::Offloaded;

// OSPFv2 Hello packet.
const HELLO_V2: [u8; 48] = [
    0x02, 0x01, 0x00, 0x30, 0x02, 0x02, 0x02, 0x02, 0x00, 0x00, 0x00, 0x01,
    0xf6, 0x9e, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xff, 0xff, 0xff, 0x00, 0x00, 0x03, 0x02, 0x01, 0x00, 0x00, 0x00, 0x24,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0x01,
];

// OSPFv3 Hello packet.
const HELLO_V3: [u8; 40] = [
    0x03, 0x01, 0x00, 0x28, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x01, 0x00, 0x00, 0x13,
    0x00, 0x03, 0x00, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x02, 0x02, 0x02,
];

// OSPFv2 Router-LSA.
const ROUTER_LSA_V2: [u8; 36] = [
    0x00, 0x31, 0x02, 0x01, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x02, 0x37, 0xf4, 0x00, 0x24, 0x01, 0x00, 0x00, 0x01,
    0x0a, 0x00, 0x01, 0x00, 0xff, 0xff, 0xff, 0x00, 0x03, 0x00, 0x00, 0x0a,
];

// OSPFv2 Summary-LSA (IP network).
const SUMMARY_LSA_V2: [u8; 28] = [
    0x00, 0x31, 0x02, 0x03, 0x0a, 0x00, 0x02, 0x00, 0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x01, 0xfa, 0x44, 0x00, 0x1c, 0xff, 0xff, 0xff, 0x00,
    0x00, 0x00, 0x00, 0x0a,
];

static CUSTOM_CALLS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn test_packet_decoder_empty() {
    let decoder = PacketDecoder::new();
    assert!(!decoder.is_registered(2, PacketType::Hello));

    let buf = Bytes::from_static(&HELLO_V2);
    assert_eq!(
        decoder.decode(&buf, &CTX),
        Err(DecodeError::UnknownPacketType(1))
    );
}

#[test]
fn test_packet_decoder_standard() {
    let decoder = PacketDecoder::standard();
    for version in [2, 3] {
        for pkt_type in PacketType::ALL {
            assert!(decoder.is_registered(version, pkt_type));
        }
    }

    let buf = Bytes::from_static(&HELLO_V2);
    let packet = decoder.decode(&buf, &CTX).unwrap();
    assert_eq!(packet.version(), 2);
    assert_eq!(packet.pkt_type(), PacketType::Hello);
    assert_eq!(packet.router_id(), Ipv4Addr::new(2, 2, 2, 2));
    assert_eq!(
        packet.into_ospfv2().unwrap(),
        Packet::<Ospfv2>::decode(&buf, &CTX).unwrap()
    );

    let buf = Bytes::from_static(&HELLO_V3);
    let packet = decoder.decode(&buf, &CTX).unwrap();
    assert_eq!(packet.version(), 3);
    assert_eq!(packet.router_id(), Ipv4Addr::new(1, 1, 1, 1));
    assert!(packet.is_ospfv3());
}

#[test]
fn test_packet_decoder_single_version() {
    let mut decoder = PacketDecoder::new();
    decoder.register::<Ospfv3>(PacketType::Hello);
    assert!(decoder.is_registered(3, PacketType::Hello));
    assert!(!decoder.is_registered(2, PacketType::Hello));
    assert!(!decoder.is_registered(3, PacketType::LsUpdate));

    let buf = Bytes::from_static(&HELLO_V3);
    assert!(decoder.decode(&buf, &CTX).is_ok());

    let buf = Bytes::from_static(&HELLO_V2);
    assert_eq!(
        decoder.decode(&buf, &CTX),
        Err(DecodeError::UnknownPacketType(1))
    );
}

#[test]
fn test_packet_decoder_custom() {
    let mut decoder = PacketDecoder::new();
    decoder.register_fn(
        2,
        PacketType::Hello,
        Box::new(|data, ctx| {
            CUSTOM_CALLS.fetch_add(1, atomic::Ordering::Relaxed);
            Packet::<Ospfv2>::decode(data, ctx).map(AnyPacket::from)
        }),
    );

    let buf = Bytes::from_static(&HELLO_V2);
    let packet = decoder.decode(&buf, &CTX).unwrap();
    assert_eq!(packet.pkt_type(), PacketType::Hello);
    assert_eq!(CUSTOM_CALLS.load(atomic::Ordering::Relaxed), 1);
}

#[test]
#[should_panic]
fn test_packet_decoder_duplicate() {
    let mut decoder = PacketDecoder::standard();
    decoder.register::<Ospfv2>(PacketType::Hello);
}

#[test]
fn test_packet_version_mismatch() {
    let buf = Bytes::from_static(&HELLO_V2);
    assert_eq!(
        Packet::<Ospfv3>::decode(&buf, &CTX),
        Err(DecodeError::InvalidVersion(2))
    );
    assert_eq!(
        Packet::<Ospfv2>::decode_as(PacketType::DbDesc, &buf, &CTX),
        Err(DecodeError::PacketTypeMismatch {
            expected: PacketType::DbDesc,
            received: PacketType::Hello,
        })
    );
}

#[test]
fn test_peek_version_type() {
    assert_eq!(
        peek_version_type(&HELLO_V3),
        Ok((3, PacketType::Hello))
    );
    assert_eq!(
        peek_version_type(&[]),
        Err(DecodeError::InsufficientData {
            required: 2,
            available: 0,
        })
    );
    assert_eq!(
        peek_version_type(&[0x01, 0x01]),
        Err(DecodeError::InvalidVersion(1))
    );
    assert_eq!(
        peek_version_type(&[0x02, 0x00]),
        Err(DecodeError::UnknownPacketType(0))
    );
}

#[test]
fn test_lsa_decoder_custom() {
    let mut decoder = LsaDecoder::<Ospfv2>::new();
    decoder.register(
        LsaTypeCode::SummaryNetwork.into(),
        LsaSummary::BASE_LENGTH,
        |_hdr, buf| {
            let mask = Ipv4Addr::from(buf.get_u32());
            let metric = buf.get_u32() & 0x00ffffff;
            Ok(LsaBody::SummaryNetwork(LsaSummary { mask, metric }))
        },
    );
    assert!(decoder.is_registered(LsaType(3)));
    assert!(!decoder.is_registered(LsaType(1)));
    assert_eq!(decoder.min_length(), 28);

    let mut buf = Bytes::from_static(&SUMMARY_LSA_V2);
    let lsa = decoder.decode(&mut buf).unwrap();
    assert!(buf.is_empty());
    let mut buf = Bytes::from_static(&SUMMARY_LSA_V2);
    assert_eq!(lsa, Lsa::<Ospfv2>::decode(&mut buf).unwrap());

    let mut buf = Bytes::from_static(&ROUTER_LSA_V2);
    assert_eq!(
        decoder.decode(&mut buf),
        Err(DecodeError::UnknownLsaType(1))
    );

    // A full header isn't enough when no registered type accepts a body
    // that short.
    let mut buf = Bytes::from_static(&SUMMARY_LSA_V2[..24]);
    assert_eq!(
        decoder.decode(&mut buf),
        Err(DecodeError::InsufficientData {
            required: 28,
            available: 24,
        })
    );
    assert_eq!(buf.len(), 24);
}

#[test]
fn test_lsa_decoder_empty() {
    let decoder = LsaDecoder::<Ospfv2>::new();
    assert_eq!(decoder.min_length(), 20);

    let mut buf = Bytes::from_static(&SUMMARY_LSA_V2);
    assert_eq!(
        decoder.decode(&mut buf),
        Err(DecodeError::UnknownLsaType(3))
    );
}
