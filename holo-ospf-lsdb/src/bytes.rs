//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cell::RefCell;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, Bytes, BytesMut, TryGetError};

thread_local!(
    pub static TLS_BUF: RefCell<BytesMut> =
        RefCell::new(BytesMut::with_capacity(4096))
);

// Fallible big-endian readers for the field types OSPF uses. A read past
// the end of the buffer returns an error and consumes nothing.
pub trait BytesExt {
    // 24-bit metrics and options.
    fn try_get_u24(&mut self) -> Result<u32, TryGetError>;

    fn try_get_ipv4(&mut self) -> Result<Ipv4Addr, TryGetError>;

    // DR/BDR style fields, where 0.0.0.0 means none.
    fn try_get_opt_ipv4(&mut self) -> Result<Option<Ipv4Addr>, TryGetError>;

    fn try_get_ipv6(&mut self) -> Result<Ipv6Addr, TryGetError>;

    // Zero-copy split of the next `len` bytes.
    fn try_get_bytes(&mut self, len: usize) -> Result<Bytes, TryGetError>;
}

// Big-endian writers matching `BytesExt`.
pub trait BytesMutExt {
    fn put_u24(&mut self, n: u32);

    fn put_ipv4(&mut self, addr: &Ipv4Addr);

    fn put_ipv6(&mut self, addr: &Ipv6Addr);
}

// ===== impl Bytes =====

impl BytesExt for Bytes {
    fn try_get_u24(&mut self) -> Result<u32, TryGetError> {
        self.try_get_uint(3).map(|n| n as u32)
    }

    fn try_get_ipv4(&mut self) -> Result<Ipv4Addr, TryGetError> {
        self.try_get_u32().map(Ipv4Addr::from)
    }

    fn try_get_opt_ipv4(&mut self) -> Result<Option<Ipv4Addr>, TryGetError> {
        let addr = self.try_get_ipv4()?;
        Ok(Some(addr).filter(|addr| !addr.is_unspecified()))
    }

    fn try_get_ipv6(&mut self) -> Result<Ipv6Addr, TryGetError> {
        self.try_get_u128().map(Ipv6Addr::from)
    }

    fn try_get_bytes(&mut self, len: usize) -> Result<Bytes, TryGetError> {
        if self.remaining() < len {
            return Err(TryGetError {
                requested: len,
                available: self.remaining(),
            });
        }
        Ok(self.split_to(len))
    }
}

// ===== impl BytesMut =====

impl BytesMutExt for BytesMut {
    fn put_u24(&mut self, n: u32) {
        self.put_slice(&n.to_be_bytes()[1..]);
    }

    fn put_ipv4(&mut self, addr: &Ipv4Addr) {
        self.put_u32((*addr).into())
    }

    fn put_ipv6(&mut self, addr: &Ipv6Addr) {
        self.put_slice(&addr.octets())
    }
}

// ===== unit tests =====
