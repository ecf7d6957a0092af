//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use bytes::Bytes;
use derive_new::new;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::debug::Debug;
use crate::error::Error;
use crate::packet::{AnyPacket, ChecksumCtx, Packet};
use crate::version::Version;

// Packet transport.
//
// Sends fully encoded OSPF packets out of the given interface. Socket
// management (raw sockets, multicast membership, ancillary data) belongs to
// the implementor.
pub trait Transport {
    fn send(
        &mut self,
        ifname: &str,
        dst: IpAddr,
        payload: Bytes,
    ) -> std::io::Result<()>;
}

// Outgoing packet, as queued by `ChannelTransport`.
#[derive(Clone, Debug, Eq, PartialEq, new, Serialize)]
pub struct NetTxPacketMsg {
    pub ifname: String,
    pub dst: IpAddr,
    pub data: Bytes,
}

// Transport that hands every outgoing packet to a separate writer task.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    net_tx_packetp: UnboundedSender<NetTxPacketMsg>,
}

// ===== impl ChannelTransport =====

impl ChannelTransport {
    pub fn new(net_tx_packetp: UnboundedSender<NetTxPacketMsg>) -> Self {
        ChannelTransport { net_tx_packetp }
    }
}

impl Transport for ChannelTransport {
    fn send(
        &mut self,
        ifname: &str,
        dst: IpAddr,
        payload: Bytes,
    ) -> std::io::Result<()> {
        let msg = NetTxPacketMsg::new(ifname.to_owned(), dst, payload);
        self.net_tx_packetp.send(msg).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "packet writer is gone",
            )
        })
    }
}

// ===== global functions =====

// Encodes and sends an OSPF packet.
pub fn send_packet<V>(
    transport: &mut dyn Transport,
    ifname: &str,
    dst: IpAddr,
    packet: &Packet<V>,
    ctx: &ChecksumCtx,
) -> Result<(), Error>
where
    V: Version,
{
    Debug::<V>::PacketTx(ifname, &dst, packet).log();

    // Encode packet.
    let buf = packet.encode(ctx).map_err(|error| Error::PacketEncode {
        ifname: ifname.to_owned(),
        dst,
        error,
    });
    let buf = buf.inspect_err(Error::log)?;

    // Send packet.
    transport
        .send(ifname, dst, buf)
        .map_err(|error| Error::Send {
            ifname: ifname.to_owned(),
            dst,
            error,
        })
        .inspect_err(Error::log)
}

// Decodes a received OSPF packet of either protocol version.
//
// Malformed packets are logged and rejected as a whole. LSAs that fail
// validation are logged and removed from LS Update packets, while the
// remaining LSAs are kept.
pub fn process_packet(
    ifname: &str,
    src: IpAddr,
    data: &Bytes,
    ctx: &ChecksumCtx,
) -> Result<AnyPacket, Error> {
    let mut packet = match AnyPacket::decode(data, ctx) {
        Ok(packet) => packet,
        Err(error) => {
            let error = Error::PacketDecode {
                ifname: ifname.to_owned(),
                src,
                error,
            };
            error.log();
            return Err(error);
        }
    };

    match &mut packet {
        AnyPacket::Ospfv2(packet) => {
            process_packet_version(ifname, &src, packet)
        }
        AnyPacket::Ospfv3(packet) => {
            process_packet_version(ifname, &src, packet)
        }
    }

    Ok(packet)
}

fn process_packet_version<V>(
    ifname: &str,
    src: &IpAddr,
    packet: &mut Packet<V>,
) where
    V: Version,
{
    Debug::<V>::PacketRx(ifname, src, packet).log();

    if let Packet::LsUpdate(pkt) = packet {
        pkt.lsas.retain(|lsa| match lsa.validate() {
            Ok(()) => true,
            Err(error) => {
                Debug::<V>::LsaDiscard(src, &lsa.hdr, &error).log();
                false
            }
        });
    }
}

// ===== unit tests =====
