//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use tracing::{warn, warn_span};

use crate::packet::error::{DecodeError, EncodeError};

// Errors raised while exchanging packets over an interface.
#[derive(Debug)]
pub enum Error {
    // A received packet was rejected as a whole.
    PacketDecode {
        ifname: String,
        src: IpAddr,
        error: DecodeError,
    },
    // An outgoing packet couldn't be serialized.
    PacketEncode {
        ifname: String,
        dst: IpAddr,
        error: EncodeError,
    },
    // The transport refused an encoded packet.
    Send {
        ifname: String,
        dst: IpAddr,
        error: std::io::Error,
    },
}

// ===== impl Error =====

impl Error {
    pub fn ifname(&self) -> &str {
        match self {
            Error::PacketDecode { ifname, .. }
            | Error::PacketEncode { ifname, .. }
            | Error::Send { ifname, .. } => ifname,
        }
    }

    // Logs the error under the span of the direction it happened in.
    pub fn log(&self) {
        let ifname = self.ifname();
        let chain = source_chain(self);
        match self {
            Error::PacketDecode { src, .. } => {
                warn_span!("network", direction = "input").in_scope(|| {
                    warn!(
                        interface = %ifname, %src, error = %chain,
                        "{}", self
                    );
                })
            }
            Error::PacketEncode { dst, .. } | Error::Send { dst, .. } => {
                warn_span!("network", direction = "output").in_scope(|| {
                    warn!(
                        interface = %ifname, %dst, error = %chain,
                        "{}", self
                    );
                })
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self {
            Error::PacketDecode { .. } => "decode packet",
            Error::PacketEncode { .. } => "encode packet",
            Error::Send { .. } => "send packet",
        };
        write!(f, "failed to {}", action)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::PacketDecode { error, .. } => Some(error),
            Error::PacketEncode { error, .. } => Some(error),
            Error::Send { error, .. } => Some(error),
        }
    }
}

// ===== helper functions =====

// Joins the messages of everything below `error` in its source chain.
fn source_chain(error: &dyn std::error::Error) -> String {
    let mut messages = vec![];
    let mut source = error.source();
    while let Some(error) = source {
        messages.push(error.to_string());
        source = error.source();
    }
    messages.join(": ")
}

// ===== unit tests =====
