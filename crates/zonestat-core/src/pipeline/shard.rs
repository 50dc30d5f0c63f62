use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ZonestatError};
use crate::zonal::Zone;

/// Group name used when no zone grouping is configured.
pub const ALL_ZONES_GROUP: &str = "all";

/// Inclusive range of calendar years.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if end < start {
            return Err(ZonestatError::NonMonotonicYearRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn years(&self) -> Vec<i32> {
        (self.start..=self.end).collect()
    }

    pub fn overlaps(&self, other: &YearRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn validate(&self) -> Result<()> {
        Self::new(self.start, self.end).map(|_| ())
    }
}

impl From<[i32; 2]> for YearRange {
    fn from([start, end]: [i32; 2]) -> Self {
        Self { start, end }
    }
}

impl From<YearRange> for [i32; 2] {
    fn from(range: YearRange) -> Self {
        [range.start, range.end]
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// One independently schedulable `(zone group, year range)` unit of work.
#[derive(Clone, Debug)]
pub struct Shard {
    pub group: String,
    pub zones: Vec<Zone>,
    pub years: YearRange,
    /// Stable table name: `<prefix>_<group>_<start>_<end>`.
    pub description: String,
}

/// Check year ranges are monotonic and pairwise disjoint.
pub(crate) fn validate_year_ranges(ranges: &[YearRange]) -> Result<()> {
    if ranges.is_empty() {
        return Err(ZonestatError::Configuration("no year ranges configured".to_string()));
    }
    for (i, range) in ranges.iter().enumerate() {
        range.validate()?;
        if let Some(other) = ranges[..i].iter().find(|r| r.overlaps(range)) {
            return Err(ZonestatError::Configuration(format!(
                "year ranges {other} and {range} overlap"
            )));
        }
    }
    Ok(())
}

/// Map each parent region to its group, rejecting regions listed twice.
pub(crate) fn group_index(groups: &BTreeMap<String, Vec<String>>) -> Result<HashMap<&str, &str>> {
    let mut index = HashMap::new();
    for (group, parents) in groups {
        for parent in parents {
            if let Some(previous) = index.insert(parent.as_str(), group.as_str()) {
                return Err(ZonestatError::Configuration(format!(
                    "region '{parent}' is listed in groups '{previous}' and '{group}'"
                )));
            }
        }
    }
    Ok(index)
}

/// Cartesian product of zone groups and year ranges, in deterministic
/// (group name, range) order.
///
/// Zones are assigned to groups by parent region. An empty grouping puts
/// every zone in one group named [`ALL_ZONES_GROUP`]; zones whose region is
/// not listed in any group are left out of the job.
pub fn plan_shards(
    zones: &[Zone],
    groups: &BTreeMap<String, Vec<String>>,
    ranges: &[YearRange],
    prefix: &str,
) -> Result<Vec<Shard>> {
    validate_year_ranges(ranges)?;

    let mut members: BTreeMap<String, Vec<Zone>> = BTreeMap::new();
    if groups.is_empty() {
        members.insert(ALL_ZONES_GROUP.to_string(), zones.to_vec());
    } else {
        let index = group_index(groups)?;
        for name in groups.keys() {
            members.insert(name.clone(), Vec::new());
        }
        let mut unassigned = 0usize;
        for zone in zones {
            match index.get(zone.parent.as_str()) {
                Some(group) => members.entry(group.to_string()).or_default().push(zone.clone()),
                None => unassigned += 1,
            }
        }
        if unassigned > 0 {
            warn!(unassigned, "Zones outside every configured group are skipped");
        }
    }

    let mut shards = Vec::with_capacity(members.len() * ranges.len());
    for (group, zones) in &members {
        for range in ranges {
            shards.push(Shard {
                group: group.clone(),
                zones: zones.clone(),
                years: *range,
                description: format!("{prefix}_{group}_{}_{}", range.start, range.end),
            });
        }
    }
    debug!(shards = shards.len(), groups = members.len(), "Planned shards");
    Ok(shards)
}
