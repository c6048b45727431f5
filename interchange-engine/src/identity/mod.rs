//! Station identity: which codes are interchangeable.
//!
//! Big cities are served by several terminals under different codes
//! (New Delhi, Old Delhi and Hazrat Nizamuddin, for instance). A traveller
//! asking for "NDLS" is usually just as happy leaving from "NZM". This
//! module holds a static table of such clusters. It only broadens which
//! keys a search tries; the schedule graph never changes because of it.

use std::collections::HashMap;

use tracing::warn;

use crate::domain::StationCode;

/// A named group of equivalent station codes.
#[derive(Debug, Clone)]
struct Cluster {
    name: String,
    /// Sorted, deduplicated.
    members: Vec<StationCode>,
}

/// Lookup of station equivalence clusters.
///
/// Each code belongs to at most one cluster. Unknown codes are equivalent
/// only to themselves.
#[derive(Debug, Clone, Default)]
pub struct StationIdentity {
    clusters: Vec<Cluster>,
    membership: HashMap<StationCode, usize>,
}

impl StationIdentity {
    /// Create a table with no clusters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cluster.
    ///
    /// Codes already claimed by another cluster stay where they are and are
    /// left out of this one. Returns the number of codes added.
    pub fn add_cluster(&mut self, name: &str, codes: &[StationCode]) -> usize {
        let idx = self.clusters.len();
        let mut members: Vec<StationCode> = Vec::with_capacity(codes.len());

        for code in codes {
            match self.membership.get(code) {
                Some(&other) if other != idx => {
                    warn!(
                        station = %code,
                        cluster = name,
                        existing = %self.clusters[other].name,
                        "Station already belongs to a cluster, ignoring"
                    );
                }
                _ => {
                    self.membership.insert(*code, idx);
                    members.push(*code);
                }
            }
        }

        members.sort();
        members.dedup();
        let added = members.len();
        self.clusters.push(Cluster {
            name: name.to_string(),
            members,
        });
        added
    }

    /// All codes equivalent to `code`, including `code` itself, in sorted
    /// order.
    pub fn equivalents_of(&self, code: &StationCode) -> Vec<StationCode> {
        match self.membership.get(code) {
            Some(&idx) => self.clusters[idx].members.clone(),
            None => vec![*code],
        }
    }

    /// Whether two codes name the same place.
    pub fn are_equivalent(&self, a: &StationCode, b: &StationCode) -> bool {
        if a == b {
            return true;
        }
        match (self.membership.get(a), self.membership.get(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// A stable representative for the code's cluster (its smallest code).
    pub fn canonical(&self, code: &StationCode) -> StationCode {
        self.membership
            .get(code)
            .and_then(|&idx| self.clusters[idx].members.first())
            .copied()
            .unwrap_or(*code)
    }

    /// Name of the cluster the code belongs to, if any.
    pub fn cluster_name(&self, code: &StationCode) -> Option<&str> {
        self.membership
            .get(code)
            .map(|&idx| self.clusters[idx].name.as_str())
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Builder for creating station identity tables.
///
/// Provides a fluent API over string codes; invalid codes are skipped.
#[derive(Debug, Default)]
pub struct StationIdentityBuilder {
    inner: StationIdentity,
}

impl StationIdentityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cluster of codes.
    pub fn cluster(mut self, name: &str, codes: &[&str]) -> Self {
        let parsed: Vec<StationCode> = codes
            .iter()
            .filter_map(|c| StationCode::parse(c).ok())
            .collect();
        self.inner.add_cluster(name, &parsed);
        self
    }

    pub fn build(self) -> StationIdentity {
        self.inner
    }
}

/// The default table of metropolitan terminal clusters.
pub fn metro_clusters() -> StationIdentity {
    StationIdentityBuilder::new()
        .cluster("Delhi", &["NDLS", "DLI", "NZM", "DEE", "ANVT", "DSA", "DEC"])
        .cluster("Mumbai", &["CSMT", "LTT", "BCT", "DR", "BDTS", "MMCT", "DDR", "PNVL"])
        .cluster("Kolkata", &["HWH", "KOAA", "SDAH", "SRC", "SHM"])
        .cluster("Chennai", &["MAS", "MS", "MSB", "TBM", "PER"])
        .cluster("Bengaluru", &["SBC", "YPR", "SMVB", "BNC", "KJM", "BYPL"])
        .cluster("Hyderabad", &["SC", "HYB", "KCG", "LPI"])
        .cluster("Pune", &["PUNE", "SVJR", "HDP"])
        .cluster("Ahmedabad", &["ADI", "SBIB", "SBT", "MAN"])
        .cluster("Lucknow", &["LKO", "LJN", "ASH", "GTNR"])
        .cluster("Jaipur", &["JP", "GADJ", "DPA"])
        .cluster("Kanpur", &["CNB", "CPA", "GMC"])
        .cluster("Prayagraj", &["PRYJ", "ALD", "PCOI", "PRRB", "SFG"])
        .build()
}
