//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::packet::Packet;
use crate::packet::error::LsaValidationError;
use crate::packet::lsa::LsaHdr;
use crate::route::{Destination, RouteCandidate};
use crate::version::Version;

// OSPF debug messages.
#[derive(Debug)]
pub enum Debug<'a, V: Version> {
    // Network
    PacketRx(&'a str, &'a IpAddr, &'a Packet<V>),
    PacketTx(&'a str, &'a IpAddr, &'a Packet<V>),
    // Flooding
    LsaDiscard(&'a IpAddr, &'a LsaHdr<V>, &'a LsaValidationError),
    // LSDB maintenance
    LsaInstall(&'a LsaHdr<V>),
    LsaFlush(&'a LsaHdr<V>, LsaFlushReason),
    LsaRefresh(&'a LsaHdr<V>),
    LsaSeqNoWrap(&'a LsaHdr<V>),
    LsaRevive(&'a LsaHdr<V>),
    // Route selection
    RouteSelect(&'a Destination, &'a RouteCandidate),
    RouteDelete(&'a Destination),
}

// Reason why an LSA is being flushed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaFlushReason {
    Expiry,
    PrematureAging,
}

// ===== impl Debug =====

impl<V> Debug<'_, V>
where
    V: Version,
{
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::PacketRx(ifname, src, packet) => {
                debug_span!("network", direction = "input").in_scope(|| {
                    let data = packet_json(packet);
                    debug!(interface = %ifname, %src, %data, "{}", self);
                })
            }
            Debug::PacketTx(ifname, dst, packet) => {
                debug_span!("network", direction = "output").in_scope(|| {
                    let data = packet_json(packet);
                    debug!(interface = %ifname, %dst, %data, "{}", self);
                })
            }
            Debug::LsaDiscard(source, lsa_hdr, error) => {
                debug!(%source, ?lsa_hdr, %error, "{}", self);
            }
            Debug::LsaInstall(lsa_hdr)
            | Debug::LsaRefresh(lsa_hdr)
            | Debug::LsaSeqNoWrap(lsa_hdr)
            | Debug::LsaRevive(lsa_hdr) => {
                debug!(?lsa_hdr, "{}", self);
            }
            Debug::LsaFlush(lsa_hdr, reason) => {
                debug!(?lsa_hdr, %reason, "{}", self);
            }
            Debug::RouteSelect(destination, route) => {
                debug_span!("route").in_scope(|| {
                    debug!(
                        ?destination,
                        area_id = %route.area_id,
                        path_type = ?route.path_type,
                        metric = %route.metric(),
                        "{}",
                        self
                    );
                })
            }
            Debug::RouteDelete(destination) => {
                debug_span!("route").in_scope(|| {
                    debug!(?destination, "{}", self);
                })
            }
        }
    }
}

impl<V> std::fmt::Display for Debug<'_, V>
where
    V: Version,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Debug::PacketRx(..) | Debug::PacketTx(..) => "packet",
            Debug::LsaDiscard(..) => "discarding LSA",
            Debug::LsaInstall(..) => "installing LSA",
            Debug::LsaFlush(..) => "flushing LSA",
            Debug::LsaRefresh(..) => "refreshing LSA",
            Debug::LsaSeqNoWrap(..) => "LSA sequence number is wrapping",
            Debug::LsaRevive(..) => "reviving LSA",
            Debug::RouteSelect(..) => "route selected",
            Debug::RouteDelete(..) => "route removed",
        };
        f.write_str(message)
    }
}

// ===== impl LsaFlushReason =====

impl std::fmt::Display for LsaFlushReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LsaFlushReason::Expiry => "LSA reached MaxAge",
            LsaFlushReason::PrematureAging => "premature aging",
        })
    }
}

// ===== helper functions =====

// Packets are logged as JSON so they can be filtered on.
fn packet_json<V: Version>(packet: &Packet<V>) -> String {
    serde_json::to_string(packet).unwrap_or_default()
}
