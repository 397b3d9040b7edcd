// ── Core identity types ──
//
// LndType, NetId and Nid are the address space every other type is keyed
// by. All three are `Copy`, totally ordered, and round-trip through their
// text forms (`tcp1`, `10.0.0.1@tcp1`).

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::CoreError;

// ── LndType ─────────────────────────────────────────────────────────

/// Network driver type, the alphabetic half of a network name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LndType {
    Lo,
    Tcp,
    O2ib,
    Gni,
    Kfi,
}

impl LndType {
    /// Host addresses on these LNDs are IPv4 addresses.
    pub const fn uses_ip(self) -> bool {
        matches!(self, Self::Tcp | Self::O2ib)
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Split `s` into an LND name and the remainder (`"tcp12"` -> `Tcp`, `"12"`).
    pub(crate) fn split_prefix(s: &str) -> Option<(Self, &str)> {
        use strum::IntoEnumIterator;

        Self::iter().find_map(|lnd| {
            let name = lnd.as_str();
            let head = s.get(..name.len())?;
            head.eq_ignore_ascii_case(name)
                .then(|| (lnd, &s[name.len()..]))
        })
    }

    /// Parse a host address in this LND's notation.
    pub fn parse_addr(self, raw: &str) -> Result<u32, CoreError> {
        let invalid = |reason: &str| CoreError::InvalidNid {
            input: raw.to_owned(),
            reason: reason.to_owned(),
        };

        match self {
            Self::Lo => match raw {
                "0" => Ok(0),
                _ => Err(invalid("the loopback network only has address 0")),
            },
            lnd if lnd.uses_ip() => raw
                .parse::<Ipv4Addr>()
                .map(u32::from)
                .map_err(|_| invalid("expected a dotted-quad IPv4 address")),
            _ => raw
                .parse::<u32>()
                .map_err(|_| invalid("expected a decimal address")),
        }
    }

    /// Render a host address in this LND's notation.
    pub fn format_addr(self, addr: u32) -> String {
        if self.uses_ip() {
            Ipv4Addr::from(addr).to_string()
        } else {
            addr.to_string()
        }
    }
}

// ── NetId ───────────────────────────────────────────────────────────

/// Network identifier: LND type plus instance number (`tcp`, `tcp1`, `o2ib3`).
///
/// Instance 0 is written without a suffix, so `tcp0` parses to the same
/// value as `tcp` and displays as `tcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetId {
    pub lnd: LndType,
    pub num: u32,
}

impl NetId {
    pub const fn new(lnd: LndType, num: u32) -> Self {
        Self { lnd, num }
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num == 0 {
            write!(f, "{}", self.lnd)
        } else {
            write!(f, "{}{}", self.lnd, self.num)
        }
    }
}

impl FromStr for NetId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidNet {
            input: s.to_owned(),
            reason: reason.to_owned(),
        };

        let (lnd, rest) = LndType::split_prefix(s.trim())
            .ok_or_else(|| invalid("unknown network type (expected lo, tcp, o2ib, gni or kfi)"))?;

        let num = if rest.is_empty() {
            0
        } else {
            rest.parse::<u32>()
                .map_err(|_| invalid("network number must be a non-negative integer"))?
        };

        if lnd == LndType::Lo && num != 0 {
            return Err(invalid("there is only one loopback network"));
        }

        Ok(Self { lnd, num })
    }
}

// ── Nid ─────────────────────────────────────────────────────────────

/// Network identifier of one endpoint: host address on a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nid {
    pub net: NetId,
    pub addr: u32,
}

impl Nid {
    pub const fn new(addr: u32, net: NetId) -> Self {
        Self { net, addr }
    }

    /// Build a NID from an address in the network's own notation.
    pub fn from_parts(addr: &str, net: NetId) -> Result<Self, CoreError> {
        Ok(Self {
            net,
            addr: net.lnd.parse_addr(addr)?,
        })
    }

    /// The host half, formatted for this NID's LND.
    pub fn host(&self) -> String {
        self.net.lnd.format_addr(self.addr)
    }
}

impl fmt::Display for Nid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.host(), self.net)
    }
}

impl FromStr for Nid {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr, net) = s.rsplit_once('@').ok_or_else(|| CoreError::InvalidNid {
            input: s.to_owned(),
            reason: "expected <address>@<network>".into(),
        })?;
        let net: NetId = net.parse()?;
        Self::from_parts(addr, net).map_err(|err| match err {
            CoreError::InvalidNid { reason, .. } => CoreError::InvalidNid {
                input: s.to_owned(),
                reason,
            },
            other => other,
        })
    }
}

// ── Serde: text forms ───────────────────────────────────────────────

macro_rules! serde_via_str {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

serde_via_str!(NetId);
serde_via_str!(Nid);
