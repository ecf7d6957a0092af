//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::Bytes;
use holo_ospf_lsdb::ospfv3::packet::lsa::*;
use holo_ospf_lsdb::ospfv3::packet::*;
use holo_ospf_lsdb::packet::error::{DecodeError, DecodeResult, EncodeError};
use holo_ospf_lsdb::packet::lsa::{Lsa, LsaKey, LsaScope, LsaTypeVersion};
use holo_ospf_lsdb::packet::{ChecksumCtx, DbDescFlags, Packet, PacketType};
use holo_ospf_lsdb::version::{Ospfv2, Ospfv3};
use ipnetwork::Ipv6Network;
use maplit::btreeset;

const CTX: ChecksumCtx = ChecksumCtx::Offloaded;

//
// Wire vectors, one 32-bit word per line.
//

const HELLO: &[u8] = &[
    0x03, 0x01, 0x00, 0x28,
    0x01, 0x01, 0x01, 0x01,
    0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x04,
    0x01, 0x00, 0x00, 0x13,
    0x00, 0x03, 0x00, 0x24,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x02, 0x02, 0x02, 0x02,
];

// Initial exchange, no LSA headers.
const DB_DESC_INIT: &[u8] = &[
    0x03, 0x02, 0x00, 0x1c,
    0x01, 0x01, 0x01, 0x01,
    0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x13,
    0x05, 0xdc, 0x00, 0x07,
    0x00, 0x01, 0x6f, 0x10,
];

const DB_DESC: &[u8] = &[
    0x03, 0x02, 0x00, 0x58,
    0x02, 0x02, 0x02, 0x02,
    0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x13,
    0x05, 0xdc, 0x00, 0x01,
    0x00, 0x01, 0x6f, 0x11,
    0x00, 0x04, 0x00, 0x08,
    0x00, 0x00, 0x00, 0x03,
    0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x01,
    0x16, 0x3a, 0x00, 0x2c,
    0x00, 0x04, 0x20, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x01,
    0xf4, 0x34, 0x00, 0x18,
    0x00, 0x04, 0x20, 0x03,
    0x00, 0x00, 0x00, 0x01,
    0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x01,
    0x97, 0x0b, 0x00, 0x2c,
];

const LS_REQUEST: &[u8] = &[
    0x03, 0x03, 0x00, 0x40,
    0x02, 0x02, 0x02, 0x02,
    0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x08,
    0x00, 0x00, 0x00, 0x04,
    0x01, 0x01, 0x01, 0x01,
    0x00, 0x00, 0x20, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x01, 0x01, 0x01, 0x01,
    0x00, 0x00, 0x20, 0x09,
    0x00, 0x00, 0x00, 0x00,
    0x01, 0x01, 0x01, 0x01,
    0x00, 0x00, 0x40, 0x05,
    0x00, 0x00, 0x00, 0x01,
    0x01, 0x01, 0x01, 0x01,
];

// Carries LINK_LSA, a Router-LSA without links and an
// Inter-Area-Prefix-LSA.
const LS_UPDATE: &[u8] = &[
    0x03, 0x04, 0x00, 0x84,
    0x02, 0x02, 0x02, 0x02,
    0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x03,
    0x00, 0x04, 0x00, 0x08,
    0x00, 0x00, 0x00, 0x03,
    0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x01,
    0x16, 0x3a, 0x00, 0x2c,
    0x01, 0x00, 0x00, 0x13,
    0xfe, 0x80, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0xcc, 0x81, 0x6e, 0xff,
    0xfe, 0xa8, 0x26, 0xd0,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x04, 0x20, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x01,
    0xf4, 0x34, 0x00, 0x18,
    0x01, 0x00, 0x00, 0x13,
    0x00, 0x04, 0x20, 0x03,
    0x00, 0x00, 0x00, 0x01,
    0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x01,
    0x97, 0x0b, 0x00, 0x2c,
    0x00, 0x00, 0x00, 0x0a,
    0x80, 0x00, 0x00, 0x00,
    0x20, 0x01, 0x0d, 0xb8,
    0x10, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x02,
];

const LS_ACK: &[u8] = &[
    0x03, 0x05, 0x00, 0x60,
    0x02, 0x02, 0x02, 0x02,
    0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x07, 0x00, 0x08,
    0x00, 0x00, 0x00, 0x04,
    0x01, 0x01, 0x01, 0x01,
    0x80, 0x00, 0x00, 0x01,
    0x77, 0x58, 0x00, 0x2c,
    0x00, 0x08, 0x20, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x01, 0x01, 0x01, 0x01,
    0x80, 0x00, 0x00, 0x01,
    0x16, 0x16, 0x00, 0x18,
    0x00, 0x08, 0x20, 0x09,
    0x00, 0x00, 0x00, 0x00,
    0x01, 0x01, 0x01, 0x01,
    0x80, 0x00, 0x00, 0x01,
    0x7a, 0xf9, 0x00, 0x34,
    0x00, 0x08, 0x40, 0x05,
    0x00, 0x00, 0x00, 0x01,
    0x01, 0x01, 0x01, 0x01,
    0x80, 0x00, 0x00, 0x01,
    0xe5, 0x91, 0x00, 0x2c,
];

// Link-LSA without prefixes.
const LINK_LSA: &[u8] = &[
    0x00, 0x04, 0x00, 0x08,
    0x00, 0x00, 0x00, 0x03,
    0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x01,
    0x16, 0x3a, 0x00, 0x2c,
    0x01, 0x00, 0x00, 0x13,
    0xfe, 0x80, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0xcc, 0x81, 0x6e, 0xff,
    0xfe, 0xa8, 0x26, 0xd0,
    0x00, 0x00, 0x00, 0x00,
];

const ROUTER_LSA: &[u8] = &[
    0x00, 0x01, 0x20, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x01, 0x01, 0x01, 0x01,
    0x80, 0x00, 0x00, 0x01,
    0xd8, 0x27, 0x00, 0x28,
    0x02, 0x00, 0x00, 0x13,
    0x01, 0x00, 0x00, 0x0a,
    0x00, 0x00, 0x00, 0x04,
    0x00, 0x00, 0x00, 0x05,
    0x02, 0x02, 0x02, 0x02,
];

const NETWORK_LSA: &[u8] = &[
    0x00, 0x01, 0x20, 0x02,
    0x00, 0x00, 0x00, 0x04,
    0x01, 0x01, 0x01, 0x01,
    0x80, 0x00, 0x00, 0x01,
    0x70, 0xa4, 0x00, 0x20,
    0x00, 0x00, 0x00, 0x13,
    0x01, 0x01, 0x01, 0x01,
    0x02, 0x02, 0x02, 0x02,
];

const INTER_AREA_ROUTER_LSA: &[u8] = &[
    0x00, 0x01, 0x20, 0x04,
    0x00, 0x00, 0x00, 0x01,
    0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x01,
    0x2d, 0xd0, 0x00, 0x20,
    0x00, 0x00, 0x00, 0x13,
    0x00, 0x00, 0x00, 0x14,
    0x03, 0x03, 0x03, 0x03,
];

// Forwarding address and route tag present.
const AS_EXTERNAL_LSA: &[u8] = &[
    0x00, 0x01, 0x40, 0x05,
    0x00, 0x00, 0x00, 0x01,
    0x01, 0x01, 0x01, 0x01,
    0x80, 0x00, 0x00, 0x01,
    0x1d, 0x40, 0x00, 0x38,
    0x07, 0x00, 0x00, 0x14,
    0x30, 0x00, 0x00, 0x00,
    0x20, 0x01, 0x0d, 0xb8,
    0x20, 0x00, 0x00, 0x00,
    0x20, 0x01, 0x0d, 0xb8,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x64,
];

const NSSA_LSA: &[u8] = &[
    0x00, 0x01, 0x20, 0x07,
    0x00, 0x00, 0x00, 0x02,
    0x01, 0x01, 0x01, 0x01,
    0x80, 0x00, 0x00, 0x01,
    0x2b, 0xa4, 0x00, 0x24,
    0x04, 0x00, 0x00, 0x0a,
    0x30, 0x08, 0x00, 0x00,
    0x20, 0x01, 0x0d, 0xb8,
    0x30, 0x00, 0x00, 0x00,
];

// Link-LSA with one prefix.
const LINK_LSA_PREFIX: &[u8] = &[
    0x00, 0x01, 0x00, 0x08,
    0x00, 0x00, 0x00, 0x04,
    0x01, 0x01, 0x01, 0x01,
    0x80, 0x00, 0x00, 0x01,
    0xfd, 0x7a, 0x00, 0x38,
    0x01, 0x00, 0x00, 0x13,
    0xfe, 0x80, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x01,
    0x40, 0x00, 0x00, 0x00,
    0x20, 0x01, 0x0d, 0xb8,
    0x00, 0x01, 0x00, 0x00,
];

const INTRA_AREA_PREFIX_LSA: &[u8] = &[
    0x00, 0x01, 0x20, 0x09,
    0x00, 0x00, 0x00, 0x00,
    0x02, 0x02, 0x02, 0x02,
    0x80, 0x00, 0x00, 0x01,
    0x5f, 0x63, 0x00, 0x2c,
    0x00, 0x01, 0x20, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x02, 0x02, 0x02, 0x02,
    0x40, 0x02, 0x00, 0x0a,
    0x20, 0x01, 0x0d, 0xb8,
    0x00, 0x01, 0x00, 0x00,
];

// Router Information LSA (function code 12, U bit set).
const ROUTER_INFO_LSA: &[u8] = &[
    0x00, 0x01, 0xa0, 0x0c,
    0x00, 0x00, 0x00, 0x00,
    0x01, 0x01, 0x01, 0x01,
    0x80, 0x00, 0x00, 0x01,
    0xf5, 0xa2, 0x00, 0x44,
    0x00, 0x01, 0x00, 0x04,
    0xd0, 0x00, 0x00, 0x00,
    0x00, 0x08, 0x00, 0x01,
    0x00, 0x00, 0x00, 0x00,
    0x00, 0x09, 0x00, 0x0b,
    0x00, 0x1f, 0x40, 0x00,
    0x00, 0x01, 0x00, 0x03,
    0x00, 0x3e, 0x80, 0x00,
    0x00, 0x0e, 0x00, 0x0b,
    0x00, 0x03, 0xe8, 0x00,
    0x00, 0x01, 0x00, 0x03,
    0x00, 0x3a, 0x98, 0x00,
];

//
// Helper functions.
//

fn ipv4(addr: &str) -> Ipv4Addr {
    addr.parse().unwrap()
}

fn ipv6(addr: &str) -> Ipv6Addr {
    addr.parse().unwrap()
}

fn prefix(prefix: &str) -> Ipv6Network {
    prefix.parse().unwrap()
}

fn options() -> Options {
    Options::R | Options::E | Options::V6
}

fn pkt_hdr(pkt_type: PacketType, router_id: &str) -> PacketHdr {
    PacketHdr::new(pkt_type, ipv4(router_id), ipv4("0.0.0.1"), 0)
}

fn lsa(
    age: u16,
    lsa_id: &str,
    adv_rtr: &str,
    body: LsaBody,
) -> Lsa<Ospfv3> {
    let (lsa_id, adv_rtr) = (ipv4(lsa_id), ipv4(adv_rtr));
    Lsa::new(age, None, lsa_id, adv_rtr, 0x80000001, body).unwrap()
}

fn lsa_hdr(
    age: u16,
    lsa_type: u16,
    lsa_id: &str,
    adv_rtr: &str,
    cksum: u16,
    length: u16,
) -> LsaHdr {
    LsaHdr {
        cksum,
        length,
        ..LsaHdr::new(
            age,
            None,
            LsaType(lsa_type),
            ipv4(lsa_id),
            ipv4(adv_rtr),
            0x80000001,
        )
    }
}

fn decode_packet(bytes: &[u8]) -> DecodeResult<Packet<Ospfv3>> {
    Packet::decode(&Bytes::copy_from_slice(bytes), &CTX)
}

fn decode_lsa(bytes: &[u8]) -> DecodeResult<Lsa<Ospfv3>> {
    Lsa::decode(&mut Bytes::copy_from_slice(bytes))
}

// Checks that `packet` encodes to `bytes` and that `bytes` decodes back to
// `packet`.
fn assert_packet(bytes: &[u8], packet: &Packet<Ospfv3>) {
    assert_eq!(packet.encode(&CTX).unwrap().as_ref(), bytes);
    assert_eq!(&decode_packet(bytes).unwrap(), packet);
}

fn assert_lsa(bytes: &[u8], lsa: &Lsa<Ospfv3>) {
    assert_eq!(lsa.raw.as_ref(), bytes);
    let mut buf = Bytes::copy_from_slice(bytes);
    assert_eq!(&Lsa::decode(&mut buf).unwrap(), lsa);
    assert!(buf.is_empty());
}

fn link_lsa() -> Lsa<Ospfv3> {
    let body = LsaBody::Link(LsaLink {
        priority: 1,
        options: options(),
        linklocal: ipv6("fe80::cc81:6eff:fea8:26d0"),
        prefixes: vec![],
    });
    lsa(4, "0.0.0.3", "2.2.2.2", body)
}

fn as_external() -> LsaAsExternal {
    LsaAsExternal {
        flags: LsaAsExternalFlags::E
            | LsaAsExternalFlags::F
            | LsaAsExternalFlags::T,
        metric: 20,
        prefix_options: PrefixOptions::empty(),
        prefix: prefix("2001:db8:2000::/48"),
        fwd_addr: Some(ipv6("2001:db8::1")),
        tag: Some(100),
        ref_lsa_type: None,
        ref_lsa_id: None,
    }
}

//
// Packets.
//

#[test]
fn hello() {
    let packet = Packet::Hello(Hello {
        hdr: pkt_hdr(PacketType::Hello, "1.1.1.1"),
        iface_id: 4,
        priority: 1,
        options: options(),
        hello_interval: 3,
        dead_interval: 36,
        dr: None,
        bdr: None,
        neighbors: btreeset![ipv4("2.2.2.2")],
    });
    assert_packet(HELLO, &packet);
}

#[test]
fn db_desc() {
    let packet = Packet::DbDesc(DbDesc {
        hdr: pkt_hdr(PacketType::DbDesc, "1.1.1.1"),
        options: options(),
        mtu: 1500,
        dd_flags: DbDescFlags::I | DbDescFlags::M | DbDescFlags::MS,
        dd_seq_no: 93968,
        lsa_hdrs: vec![],
    });
    assert_packet(DB_DESC_INIT, &packet);

    let packet = Packet::DbDesc(DbDesc {
        hdr: pkt_hdr(PacketType::DbDesc, "2.2.2.2"),
        options: options(),
        mtu: 1500,
        dd_flags: DbDescFlags::MS,
        dd_seq_no: 93969,
        lsa_hdrs: vec![
            lsa_hdr(4, 0x0008, "0.0.0.3", "2.2.2.2", 0x163a, 44),
            lsa_hdr(4, 0x2001, "0.0.0.0", "2.2.2.2", 0xf434, 24),
            lsa_hdr(4, 0x2003, "0.0.0.1", "2.2.2.2", 0x970b, 44),
        ],
    });
    assert_packet(DB_DESC, &packet);
}

#[test]
fn ls_request() {
    let key = |lsa_type, lsa_id| {
        LsaKey::new(LsaType(lsa_type), ipv4("1.1.1.1"), ipv4(lsa_id))
    };
    let packet = Packet::LsRequest(LsRequest {
        hdr: pkt_hdr(PacketType::LsRequest, "2.2.2.2"),
        entries: vec![
            key(0x0008, "0.0.0.4"),
            key(0x2001, "0.0.0.0"),
            key(0x2009, "0.0.0.0"),
            key(0x4005, "0.0.0.1"),
        ],
    });
    assert_packet(LS_REQUEST, &packet);
}

#[test]
fn ls_update() {
    let router = LsaBody::Router(LsaRouter {
        flags: LsaRouterFlags::B,
        options: options(),
        links: vec![],
    });
    let inter_area = LsaBody::InterAreaPrefix(LsaInterAreaPrefix {
        metric: 10,
        prefix_options: PrefixOptions::empty(),
        prefix: prefix("2001:db8:1000::2/128"),
    });
    let packet = Packet::LsUpdate(LsUpdate {
        hdr: pkt_hdr(PacketType::LsUpdate, "2.2.2.2"),
        lsas: vec![
            link_lsa(),
            lsa(4, "0.0.0.0", "2.2.2.2", router),
            lsa(4, "0.0.0.1", "2.2.2.2", inter_area),
        ],
    });
    assert_packet(LS_UPDATE, &packet);
}

#[test]
fn ls_ack() {
    let packet = Packet::LsAck(LsAck {
        hdr: pkt_hdr(PacketType::LsAck, "2.2.2.2"),
        lsa_hdrs: vec![
            lsa_hdr(7, 0x0008, "0.0.0.4", "1.1.1.1", 0x7758, 44),
            lsa_hdr(8, 0x2001, "0.0.0.0", "1.1.1.1", 0x1616, 24),
            lsa_hdr(8, 0x2009, "0.0.0.0", "1.1.1.1", 0x7af9, 52),
            lsa_hdr(8, 0x4005, "0.0.0.1", "1.1.1.1", 0xe591, 44),
        ],
    });
    assert_packet(LS_ACK, &packet);
}

#[test]
fn packet_checksum() {
    let hello = decode_packet(HELLO).unwrap();
    let dst = ipv6("ff02::5");
    let ctx = ChecksumCtx::Ipv6 {
        src: ipv6("fe80::1"),
        dst,
    };

    // Computed over the IPv6 pseudo-header when the addresses are known.
    let buf = hello.encode(&ctx).unwrap();
    assert_ne!(buf[12..14], [0, 0]);
    assert_eq!(buf[..12], HELLO[..12]);
    assert_eq!(buf[14..], HELLO[14..]);
    assert_eq!(Packet::decode(&buf, &ctx), Ok(hello));

    // Offloaded to the transport.
    assert!(Packet::<Ospfv3>::decode(&buf, &CTX).is_ok());

    let other = ChecksumCtx::Ipv6 {
        src: ipv6("fe80::2"),
        dst,
    };
    assert_eq!(
        Packet::<Ospfv3>::decode(&buf, &other),
        Err(DecodeError::InvalidChecksum)
    );

    let mut corrupted = buf.to_vec();
    corrupted[36] ^= 0x01;
    assert_eq!(
        Packet::<Ospfv3>::decode(&Bytes::from(corrupted), &ctx),
        Err(DecodeError::InvalidChecksum)
    );
}

#[test]
fn packet_version_mismatch() {
    let buf = Bytes::from_static(HELLO);
    assert_eq!(
        Packet::<Ospfv2>::decode(&buf, &CTX),
        Err(DecodeError::InvalidVersion(3))
    );
}

//
// LSAs.
//

#[test]
fn link() {
    assert_lsa(LINK_LSA, &link_lsa());

    let body = LsaBody::Link(LsaLink {
        priority: 1,
        options: options(),
        linklocal: ipv6("fe80::1"),
        prefixes: vec![LsaLinkPrefix {
            options: PrefixOptions::empty(),
            value: prefix("2001:db8:1::/64"),
        }],
    });
    assert_lsa(LINK_LSA_PREFIX, &lsa(1, "0.0.0.4", "1.1.1.1", body));
}

#[test]
fn link_too_long() {
    // 4100 host prefixes of 20 bytes each don't fit in the length field.
    let prefixes = (0..4100u128)
        .map(|i| LsaLinkPrefix {
            options: PrefixOptions::empty(),
            value: Ipv6Network::new(Ipv6Addr::from(i), 128).unwrap(),
        })
        .collect();
    let body = LsaBody::Link(LsaLink {
        priority: 1,
        options: options(),
        linklocal: ipv6("fe80::1"),
        prefixes,
    });
    let lsa_id = ipv4("0.0.0.4");
    let adv_rtr = ipv4("1.1.1.1");
    assert_eq!(
        Lsa::<Ospfv3>::new(1, None, lsa_id, adv_rtr, 0x80000001, body),
        Err(EncodeError::LsaTooLong(82044))
    );
}

#[test]
fn router() {
    let link = LsaRouterLink {
        link_type: LsaRouterLinkType::PointToPoint,
        metric: 10,
        iface_id: 4,
        nbr_iface_id: 5,
        nbr_router_id: ipv4("2.2.2.2"),
    };
    let body = LsaBody::Router(LsaRouter {
        flags: LsaRouterFlags::E,
        options: options(),
        links: vec![link],
    });
    assert_lsa(ROUTER_LSA, &lsa(1, "0.0.0.0", "1.1.1.1", body));
}

#[test]
fn network() {
    let body = LsaBody::Network(LsaNetwork {
        options: options(),
        attached_rtrs: btreeset![ipv4("1.1.1.1"), ipv4("2.2.2.2")],
    });
    assert_lsa(NETWORK_LSA, &lsa(1, "0.0.0.4", "1.1.1.1", body));
}

#[test]
fn inter_area_router() {
    let body = LsaBody::InterAreaRouter(LsaInterAreaRouter {
        options: options(),
        metric: 20,
        router_id: ipv4("3.3.3.3"),
    });
    let lsa = lsa(1, "0.0.0.1", "2.2.2.2", body);
    assert_lsa(INTER_AREA_ROUTER_LSA, &lsa);
}

#[test]
fn as_external_lsa() {
    let lsa = lsa(1, "0.0.0.1", "1.1.1.1", LsaBody::AsExternal(as_external()));
    assert_lsa(AS_EXTERNAL_LSA, &lsa);
    assert_eq!(lsa.hdr.lsa_type, LsaType(0x4005));
}

#[test]
fn as_external_flags_follow_fields() {
    // F and T are set from the optional fields, whatever the flags say.
    let body = LsaAsExternal {
        flags: LsaAsExternalFlags::E,
        ..as_external()
    };
    let lsa = lsa(1, "0.0.0.1", "1.1.1.1", LsaBody::AsExternal(body));
    assert_eq!(lsa.raw.as_ref(), AS_EXTERNAL_LSA);
}

#[test]
fn nssa() {
    let external = LsaAsExternal {
        flags: LsaAsExternalFlags::E,
        metric: 10,
        prefix_options: PrefixOptions::P,
        prefix: prefix("2001:db8:3000::/48"),
        fwd_addr: None,
        tag: None,
        ref_lsa_type: None,
        ref_lsa_id: None,
    };
    let body = LsaBody::Nssa(external.clone());
    let lsa = lsa(1, "0.0.0.2", "1.1.1.1", body);
    assert_lsa(NSSA_LSA, &lsa);
    assert_eq!(lsa.hdr.lsa_type.function_code(), Some(LsaFunctionCode::Nssa));
    assert_eq!(lsa.body.as_external(), Some(&external));
}

#[test]
fn intra_area_prefix() {
    let entry = LsaIntraAreaPrefixEntry {
        options: PrefixOptions::LA,
        value: prefix("2001:db8:1::/64"),
        metric: 10,
    };
    let body = LsaBody::IntraAreaPrefix(LsaIntraAreaPrefix {
        ref_lsa_type: LsaFunctionCode::Router.into(),
        ref_lsa_id: ipv4("0.0.0.0"),
        ref_adv_rtr: ipv4("2.2.2.2"),
        prefixes: vec![entry],
    });
    let lsa = lsa(1, "0.0.0.0", "2.2.2.2", body);
    assert_lsa(INTRA_AREA_PREFIX_LSA, &lsa);
}

#[test]
fn unknown() {
    let decoded = decode_lsa(ROUTER_INFO_LSA).unwrap();
    let lsa_type = LsaType(0xa00c);
    assert_eq!(decoded.hdr.lsa_type, lsa_type);
    assert!(lsa_type.u_bit());
    assert_eq!(lsa_type.scope(), LsaScope::Area);
    assert_eq!(
        decoded.body,
        LsaBody::Unknown(LsaUnknown {
            lsa_type,
            data: Bytes::from_static(&ROUTER_INFO_LSA[20..]),
        })
    );

    // Unknown bodies are re-encoded verbatim.
    let lsa = lsa(1, "0.0.0.0", "1.1.1.1", decoded.body.clone());
    assert_eq!(lsa.raw.as_ref(), ROUTER_INFO_LSA);
}

#[test]
fn lsa_type() {
    let lsa_type: LsaType = LsaFunctionCode::Router.into();
    assert_eq!(lsa_type, LsaType(0x2001));
    assert_eq!(lsa_type.scope(), LsaScope::Area);
    assert_eq!(lsa_type.function_code(), Some(LsaFunctionCode::Router));

    let lsa_type: LsaType = LsaFunctionCode::Link.into();
    assert_eq!(lsa_type, LsaType(0x0008));
    assert_eq!(lsa_type.scope(), LsaScope::Link);

    let lsa_type: LsaType = LsaFunctionCode::AsExternal.into();
    assert_eq!(lsa_type, LsaType(0x4005));
    assert_eq!(lsa_type.scope(), LsaScope::As);

    // Reserved flooding scope.
    assert_eq!(LsaType(0x6001).scope(), LsaScope::Unknown);
    assert_eq!(LsaType(0x200c).function_code(), None);
}

#[test]
fn lsa_invalid_prefix_length() {
    // Prefix length 129, with the checksum patched to match.
    let mut bytes = LINK_LSA_PREFIX.to_vec();
    bytes[44] = 0x81;
    bytes[16..18].copy_from_slice(&[0xdf, 0x57]);
    assert_eq!(decode_lsa(&bytes), Err(DecodeError::InvalidIpPrefix));
}

#[test]
fn lsa_any_flipped_bit_rejected() {
    let vectors = [
        LINK_LSA,
        ROUTER_LSA,
        NETWORK_LSA,
        INTER_AREA_ROUTER_LSA,
        AS_EXTERNAL_LSA,
        NSSA_LSA,
        LINK_LSA_PREFIX,
        INTRA_AREA_PREFIX_LSA,
        ROUTER_INFO_LSA,
    ];
    for bytes in vectors {
        // The age isn't covered by the checksum.
        for offset in 2..bytes.len() {
            for bit in 0..8 {
                let mut bytes = bytes.to_vec();
                bytes[offset] ^= 1 << bit;
                assert!(
                    decode_lsa(&bytes).is_err(),
                    "bit {bit} of byte {offset} flipped"
                );
            }
        }
    }

    let mut bytes = INTRA_AREA_PREFIX_LSA.to_vec();
    bytes[40] ^= 0x01;
    assert_eq!(decode_lsa(&bytes), Err(DecodeError::InvalidLsaChecksum));
}

#[test]
fn lsa_truncated_by_one() {
    let vectors = [
        LINK_LSA,
        ROUTER_LSA,
        NETWORK_LSA,
        INTER_AREA_ROUTER_LSA,
        AS_EXTERNAL_LSA,
        NSSA_LSA,
        LINK_LSA_PREFIX,
        INTRA_AREA_PREFIX_LSA,
        ROUTER_INFO_LSA,
    ];
    for bytes in vectors {
        let length = bytes.len();
        assert_eq!(
            decode_lsa(&bytes[..length - 1]),
            Err(DecodeError::LsaLengthOverrun {
                length: length as u16,
                available: length - 1,
            })
        );
    }
}

#[test]
fn lsa_shorter_than_header() {
    // Unknown types have no body minimum, so a bare header is enough to
    // proceed.
    for length in [0, 10, 19] {
        assert_eq!(
            decode_lsa(&ROUTER_LSA[..length]),
            Err(DecodeError::InsufficientData {
                required: 20,
                available: length,
            })
        );
    }
}
