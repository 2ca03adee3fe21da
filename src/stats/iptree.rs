//! Address tally that can be summarized into network prefixes.
//!
//! Addresses are kept exactly; aggregation happens when a summary is asked
//! for, by cutting every address down to the longest byte-aligned prefix that
//! keeps the number of groups per family within a limit.

use log::debug;
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::count_histogram::CountHistogram;

const IPV4_LEN: usize = 4;
const IPV6_LEN: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct IpTree {
    addresses: BTreeMap<Vec<u8>, u64>,
    insertions: u64,
}

impl IpTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of a 4- or 16-byte address. Other lengths are ignored.
    pub fn add(&mut self, address: &[u8]) {
        if address.len() != IPV4_LEN && address.len() != IPV6_LEN {
            debug!("Ignoring {}-byte address", address.len());
            return;
        }
        *self.addresses.entry(address.to_vec()).or_insert(0) += 1;
        self.insertions += 1;
    }

    /// Number of accepted `add` calls
    pub fn insertions(&self) -> u64 {
        self.insertions
    }

    /// Number of distinct addresses seen
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Collapse the tree into at most `max_groups` prefixes per address family
    pub fn aggregate(&self, max_groups: usize) -> CountHistogram {
        let mut histogram = CountHistogram::new();
        for family_len in [IPV4_LEN, IPV6_LEN] {
            for (label, count) in self.aggregate_family(family_len, max_groups) {
                histogram.increment(label, count);
            }
        }
        histogram
    }

    fn aggregate_family(&self, family_len: usize, max_groups: usize) -> Vec<(String, u64)> {
        let family: Vec<(&Vec<u8>, u64)> = self
            .addresses
            .iter()
            .filter(|(addr, _)| addr.len() == family_len)
            .map(|(addr, count)| (addr, *count))
            .collect();
        if family.is_empty() {
            return Vec::new();
        }

        let mut prefix_len = family_len;
        let mut groups = group_by_prefix(&family, prefix_len);
        while groups.len() > max_groups.max(1) && prefix_len > 0 {
            prefix_len -= 1;
            groups = group_by_prefix(&family, prefix_len);
        }

        groups
            .into_iter()
            .map(|(prefix, count)| (prefix_label(&prefix, family_len), count))
            .collect()
    }
}

fn group_by_prefix(family: &[(&Vec<u8>, u64)], prefix_len: usize) -> BTreeMap<Vec<u8>, u64> {
    let mut groups = BTreeMap::new();
    for (addr, count) in family {
        *groups.entry(addr[..prefix_len].to_vec()).or_insert(0) += *count;
    }
    groups
}

/// Label a prefix as an address, with `/bits` when it is shorter than a host
fn prefix_label(prefix: &[u8], family_len: usize) -> String {
    let mut full = prefix.to_vec();
    full.resize(family_len, 0);

    let address = if family_len == IPV4_LEN {
        Ipv4Addr::new(full[0], full[1], full[2], full[3]).to_string()
    } else {
        let mut octets = [0u8; IPV6_LEN];
        octets.copy_from_slice(&full);
        Ipv6Addr::from(octets).to_string()
    };

    if prefix.len() == family_len {
        address
    } else {
        format!("{}/{}", address, prefix.len() * 8)
    }
}
