//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod config;

use std::io::BufRead;
use std::net::{IpAddr, Ipv4Addr};

use bytes::Bytes;
use clap::{App, Arg};
use config::{Config, LoggingFmtStyle};
use holo_ospf_lsdb::network;
use holo_ospf_lsdb::packet::{AnyPacket, ChecksumCtx};
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

// Packet dump errors.
#[derive(Debug)]
enum Error {
    InvalidHex(usize),
    OddHexLength(usize),
    Packet(holo_ospf_lsdb::error::Error),
    Serialize(serde_json::Error),
}

// ===== impl Error =====

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidHex(pos) => {
                write!(f, "invalid hex digit at position {pos}")
            }
            Error::OddHexLength(len) => {
                write!(f, "odd number of hex digits ({len})")
            }
            Error::Packet(error) => error.fmt(f),
            Error::Serialize(..) => write!(f, "failed to serialize packet"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Packet(error) => Some(error),
            Error::Serialize(error) => Some(error),
            _ => None,
        }
    }
}

// ===== helper functions =====

fn init_tracing(config: &config::Logging) {
    let stderr = config.stderr.enabled.then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(config.stderr.fmt.show_thread_id)
            .with_file(config.stderr.fmt.show_source)
            .with_line_number(config.stderr.fmt.show_source)
            .with_ansi(config.stderr.fmt.colors);
        let layer = match config.stderr.fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(&config.filter);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr)
        .init();
}

// Parses a hex string. Whitespace and colons between digits are ignored, as
// is an optional "0x" prefix.
fn parse_hex(input: &str) -> Result<Vec<u8>, Error> {
    let input = input.trim();
    let input = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);

    let mut digits = Vec::with_capacity(input.len());
    for (pos, c) in input.char_indices() {
        if c.is_ascii_whitespace() || c == ':' {
            continue;
        }
        let digit = c.to_digit(16).ok_or(Error::InvalidHex(pos))?;
        digits.push(digit as u8);
    }
    if digits.len() % 2 != 0 {
        return Err(Error::OddHexLength(digits.len()));
    }

    Ok(digits
        .chunks_exact(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect())
}

// Decodes a single packet and returns its JSON representation.
fn dump(
    config: &Config,
    src: IpAddr,
    ctx: &ChecksumCtx,
    input: &str,
) -> Result<String, Error> {
    let data = Bytes::from(parse_hex(input)?);
    let packet: AnyPacket =
        network::process_packet(&config.interface, src, &data, ctx)
            .map_err(Error::Packet)?;

    let json = if config.output.pretty {
        serde_json::to_string_pretty(&packet)
    } else {
        serde_json::to_string(&packet)
    };
    json.map_err(Error::Serialize)
}

fn checksum_ctx(src: IpAddr, dst: Option<IpAddr>) -> ChecksumCtx {
    match (src, dst) {
        (IpAddr::V6(src), Some(IpAddr::V6(dst))) => {
            ChecksumCtx::Ipv6 { src, dst }
        }
        _ => ChecksumCtx::Offloaded,
    }
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("OSPF packet dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Decode OSPFv2/OSPFv3 packets given as hex strings")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify a configuration file."),
        )
        .arg(
            Arg::with_name("source")
                .short("s")
                .long("source")
                .value_name("address")
                .help("Source address of the packets."),
        )
        .arg(
            Arg::with_name("destination")
                .short("d")
                .long("destination")
                .value_name("address")
                .help("Destination address, used to verify OSPFv3 checksums."),
        )
        .arg(
            Arg::with_name("PACKET")
                .help("Packets in hex format (read from stdin if absent)")
                .multiple(true)
                .index(1),
        )
        .get_matches();

    // Read configuration file.
    let config = match Config::load(matches.value_of("config")) {
        Ok(config) => config,
        Err(error) => {
            match std::error::Error::source(&error) {
                Some(source) => eprintln!("{error}: {source}"),
                None => eprintln!("{error}"),
            }
            std::process::exit(1);
        }
    };

    // Initialize tracing.
    init_tracing(&config.logging);

    // Parse packet addresses.
    let src = match matches.value_of("source").map(str::parse::<IpAddr>) {
        Some(Ok(addr)) => addr,
        Some(Err(error)) => {
            error!(%error, "invalid source address");
            std::process::exit(1);
        }
        None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    };
    let dst = match matches.value_of("destination").map(str::parse::<IpAddr>)
    {
        Some(Ok(addr)) => Some(addr),
        Some(Err(error)) => {
            error!(%error, "invalid destination address");
            std::process::exit(1);
        }
        None => None,
    };
    let ctx = checksum_ctx(src, dst);

    // Collect input packets.
    let packets: Vec<String> = match matches.values_of("PACKET") {
        Some(values) => values.map(str::to_owned).collect(),
        None => std::io::stdin()
            .lock()
            .lines()
            .map_while(Result::ok)
            .filter(|line| !line.trim().is_empty())
            .collect(),
    };

    // Decode and print packets.
    let mut failures = 0;
    for input in &packets {
        match dump(&config, src, &ctx, input) {
            Ok(json) => println!("{json}"),
            Err(Error::Packet(_)) => {
                // Already logged.
                failures += 1;
            }
            Err(error) => {
                error!(%error, "failed to dump packet");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        std::process::exit(1);
    }
}

// ===== unit tests =====
