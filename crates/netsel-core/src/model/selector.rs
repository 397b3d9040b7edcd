// ── Rule selectors ──
//
// ip2nets-style patterns matched against NIDs. A selector names either a
// whole network class (`tcp`, `tcp*`, `o2ib[1-3]`) or individual NIDs
// (`10.0.0.[1-4]@tcp`, `10.*.*.*@tcp1`, `[10-20]@gni`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::CoreError;

use super::nid::{LndType, NetId, Nid};

// ── NumPattern ──────────────────────────────────────────────────────

/// Matches one number: `*`, a literal, or a bracketed list of ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumPattern {
    Any,
    Ranges(Vec<(u32, u32)>),
}

impl NumPattern {
    pub fn exact(n: u32) -> Self {
        Self::Ranges(vec![(n, n)])
    }

    pub fn matches(&self, n: u32) -> bool {
        match self {
            Self::Any => true,
            Self::Ranges(ranges) => ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&n)),
        }
    }

    fn as_exact(&self) -> Option<u32> {
        match self.ranges() {
            [(lo, hi)] if lo == hi => Some(*lo),
            _ => None,
        }
    }

    fn ranges(&self) -> &[(u32, u32)] {
        match self {
            Self::Any => &[],
            Self::Ranges(ranges) => ranges,
        }
    }

    /// Parse one pattern element; `max` bounds every value (255 for octets).
    fn parse(raw: &str, max: u32) -> Result<Self, String> {
        if raw == "*" {
            return Ok(Self::Any);
        }

        let body = match (raw.strip_prefix('['), raw.strip_suffix(']')) {
            (Some(inner), Some(_)) => &inner[..inner.len() - 1],
            (None, None) => return parse_bounded(raw, max).map(Self::exact),
            _ => return Err(format!("unbalanced brackets in '{raw}'")),
        };

        let mut ranges = Vec::new();
        for item in body.split(',') {
            let (lo, hi) = match item.split_once('-') {
                Some((lo, hi)) => (parse_bounded(lo, max)?, parse_bounded(hi, max)?),
                None => {
                    let n = parse_bounded(item, max)?;
                    (n, n)
                }
            };
            if lo > hi {
                return Err(format!("empty range '{item}'"));
            }
            ranges.push((lo, hi));
        }
        Ok(Self::Ranges(ranges))
    }
}

fn parse_bounded(raw: &str, max: u32) -> Result<u32, String> {
    let n: u32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if n > max {
        return Err(format!("{n} is out of range (max {max})"));
    }
    Ok(n)
}

impl fmt::Display for NumPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.as_exact() {
            return write!(f, "{n}");
        }
        let Self::Ranges(ranges) = self else {
            return f.write_str("*");
        };
        let items: Vec<String> = ranges
            .iter()
            .map(|&(lo, hi)| {
                if lo == hi {
                    lo.to_string()
                } else {
                    format!("{lo}-{hi}")
                }
            })
            .collect();
        write!(f, "[{}]", items.join(","))
    }
}

// ── NetPattern ──────────────────────────────────────────────────────

/// Matches networks of one LND type by instance number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetPattern {
    pub lnd: LndType,
    pub num: NumPattern,
}

impl NetPattern {
    pub fn matches(&self, net: NetId) -> bool {
        self.lnd == net.lnd && self.num.matches(net.num)
    }

    fn parse(raw: &str) -> Result<Self, String> {
        let (lnd, rest) = LndType::split_prefix(raw)
            .ok_or_else(|| format!("unknown network type in '{raw}'"))?;
        let num = if rest.is_empty() {
            NumPattern::exact(0)
        } else {
            NumPattern::parse(rest, u32::MAX)?
        };
        Ok(Self { lnd, num })
    }
}

impl From<NetId> for NetPattern {
    fn from(net: NetId) -> Self {
        Self {
            lnd: net.lnd,
            num: NumPattern::exact(net.num),
        }
    }
}

impl fmt::Display for NetPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.num.as_exact() {
            Some(0) => write!(f, "{}", self.lnd),
            _ => write!(f, "{}{}", self.lnd, self.num),
        }
    }
}

// ── AddrPattern ─────────────────────────────────────────────────────

/// Host-address half of a NID selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddrPattern {
    /// Four octet patterns for IP-based LNDs.
    Ip([NumPattern; 4]),
    /// A single numeric pattern for every other LND.
    Num(NumPattern),
}

impl AddrPattern {
    pub fn matches(&self, addr: u32) -> bool {
        match self {
            Self::Ip(octets) => octets
                .iter()
                .zip(addr.to_be_bytes())
                .all(|(pattern, octet)| pattern.matches(u32::from(octet))),
            Self::Num(pattern) => pattern.matches(addr),
        }
    }

    fn parse(raw: &str, lnd: LndType) -> Result<Self, String> {
        if !lnd.uses_ip() {
            return NumPattern::parse(raw, u32::MAX).map(Self::Num);
        }

        let parts: Vec<&str> = raw.split('.').collect();
        let [a, b, c, d] = parts.as_slice() else {
            return Err(format!("'{raw}' must have four dot-separated octets"));
        };
        Ok(Self::Ip([
            NumPattern::parse(a, 255)?,
            NumPattern::parse(b, 255)?,
            NumPattern::parse(c, 255)?,
            NumPattern::parse(d, 255)?,
        ]))
    }
}

impl fmt::Display for AddrPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip([a, b, c, d]) => write!(f, "{a}.{b}.{c}.{d}"),
            Self::Num(pattern) => write!(f, "{pattern}"),
        }
    }
}

// ── Selector ────────────────────────────────────────────────────────

/// A rule's source or destination matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every NID on a matching network.
    Net(NetPattern),
    /// NIDs whose address and network both match.
    Nid { addr: AddrPattern, net: NetPattern },
}

impl Selector {
    pub fn matches(&self, nid: &Nid) -> bool {
        match self {
            Self::Net(net) => net.matches(nid.net),
            Self::Nid { addr, net } => net.matches(nid.net) && addr.matches(nid.addr),
        }
    }
}

impl From<NetId> for Selector {
    fn from(net: NetId) -> Self {
        Self::Net(net.into())
    }
}

impl From<Nid> for Selector {
    fn from(nid: Nid) -> Self {
        let addr = if nid.net.lnd.uses_ip() {
            AddrPattern::Ip(
                nid.addr
                    .to_be_bytes()
                    .map(|octet| NumPattern::exact(u32::from(octet))),
            )
        } else {
            AddrPattern::Num(NumPattern::exact(nid.addr))
        };
        Self::Nid {
            addr,
            net: nid.net.into(),
        }
    }
}

impl FromStr for Selector {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(CoreError::invalid_rule("empty selector"));
        }

        let parsed = match raw.rsplit_once('@') {
            None => NetPattern::parse(raw).map(Self::Net),
            Some((addr, net)) => NetPattern::parse(net).and_then(|net| {
                AddrPattern::parse(addr, net.lnd).map(|addr| Self::Nid { addr, net })
            }),
        };

        parsed.map_err(|reason| CoreError::invalid_rule(format!("selector '{raw}': {reason}")))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Net(net) => write!(f, "{net}"),
            Self::Nid { addr, net } => write!(f, "{addr}@{net}"),
        }
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
