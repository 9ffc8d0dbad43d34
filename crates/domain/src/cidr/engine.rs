use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::path::Path;

use super::error::CidrError;

/// Read-only set of IPv4 CIDR prefixes with a membership test.
///
/// Prefixes are bucketed by length, each bucket holding pre-masked network
/// addresses. A lookup masks the candidate once per populated length and
/// probes a hash set, so `contains` costs at most 33 probes no matter how
/// many prefixes are loaded.
#[derive(Debug, Clone)]
pub struct CidrMatcher {
    /// Indexed by prefix length (0..=32).
    buckets: Vec<HashSet<u32>>,
    prefix_count: usize,
}

impl CidrMatcher {
    pub fn new() -> Self {
        Self {
            buckets: vec![HashSet::new(); 33],
            prefix_count: 0,
        }
    }

    /// Parse CIDR-per-line input. Blank lines and `#` comments are skipped;
    /// any other line must be of the form `A.B.C.D/N` with `N` in 0..=32.
    pub fn load(input: &str) -> Result<Self, CidrError> {
        let mut matcher = Self::new();
        for (idx, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (addr, prefix_len) =
                parse_line(line).ok_or_else(|| CidrError::MalformedInput {
                    line: idx + 1,
                    content: line.to_string(),
                })?;
            matcher.insert(addr, prefix_len);
        }
        Ok(matcher)
    }

    /// Load a CIDR list from a file.
    pub fn load_path(path: &Path) -> Result<Self, CidrError> {
        let content = std::fs::read_to_string(path)?;
        Self::load(&content)
    }

    /// Add one prefix. `prefix_len` above 32 is clamped.
    pub fn insert(&mut self, addr: u32, prefix_len: u8) {
        let prefix_len = prefix_len.min(32);
        let masked = addr & prefix_mask(prefix_len);
        if self.buckets[usize::from(prefix_len)].insert(masked) {
            self.prefix_count += 1;
        }
    }

    /// True iff any loaded prefix covers `addr` (host byte order).
    pub fn contains(&self, addr: u32) -> bool {
        self.buckets.iter().enumerate().any(|(len, bucket)| {
            !bucket.is_empty() && bucket.contains(&(addr & prefix_mask(len as u8)))
        })
    }

    /// Number of distinct prefixes loaded.
    pub fn len(&self) -> usize {
        self.prefix_count
    }

    pub fn is_empty(&self) -> bool {
        self.prefix_count == 0
    }
}

impl Default for CidrMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_line(line: &str) -> Option<(u32, u8)> {
    let (ip, prefix) = line.split_once('/')?;
    let prefix_len = prefix.parse::<u8>().ok().filter(|n| *n <= 32)?;
    let addr = ip.parse::<Ipv4Addr>().ok()?;
    Some((u32::from(addr), prefix_len))
}

/// Prefix length (0-32) to bitmask: 24 -> `0xFFFF_FF00`, 0 -> `0`.
fn prefix_mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        !0u32 << (32 - u32::from(prefix_len))
    }
}
