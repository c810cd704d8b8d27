//! Append-only collection of every record found in a run.

use crate::adapter::{Harvest, ScanStats};
use crate::model::ServerRecord;
use crate::risk::Tier;

#[derive(Debug, Default)]
pub struct Inventory {
    records: Vec<ServerRecord>,
    stats: ScanStats,
}

/// Records grouped by presentation tier, in inventory order.
#[derive(Debug, Default)]
pub struct TierPartition<'a> {
    pub high: Vec<&'a ServerRecord>,
    pub medium: Vec<&'a ServerRecord>,
    pub low: Vec<&'a ServerRecord>,
}

impl<'a> TierPartition<'a> {
    pub fn get(&self, tier: Tier) -> &[&'a ServerRecord] {
        match tier {
            Tier::High => &self.high,
            Tier::Medium => &self.medium,
            Tier::Low => &self.low,
        }
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ServerRecord) {
        self.records.push(record);
    }

    /// Append a harvest's records after the existing ones and fold in its counters.
    pub fn absorb(&mut self, harvest: Harvest) {
        self.records.extend(harvest.records);
        self.stats.merge(&harvest.stats);
    }

    pub fn records(&self) -> &[ServerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Computed on each call.
    pub fn tiers(&self) -> TierPartition<'_> {
        let mut partition = TierPartition::default();
        for record in &self.records {
            match Tier::for_score(record.risk_score()) {
                Tier::High => partition.high.push(record),
                Tier::Medium => partition.medium.push(record),
                Tier::Low => partition.low.push(record),
            }
        }
        partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServerSpec;
    use crate::risk::NoBinaries;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn record(name: &str, env: &[(&str, &str)], url: Option<&str>) -> ServerRecord {
        let mut spec = ServerSpec::command(
            name,
            "python",
            vec![],
            env.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        );
        spec.url = url.map(str::to_string);
        ServerRecord::with_probe(spec, Path::new("/cfg.json"), &NoBinaries)
    }

    #[test]
    fn tiers_partition_in_order() {
        let mut inv = Inventory::new();
        // 0.05 + 0.25 + 0.20 + 0.10 = 0.60
        inv.push(record("filesystem", &[("TOKEN", "t")], Some("https://x")));
        // 0.05 + 0.25 = 0.30
        inv.push(record("a", &[("API_KEY", "k")], None));
        inv.push(record("b", &[], None));
        inv.push(record("c", &[], None));

        let tiers = inv.tiers();
        assert_eq!(tiers.get(Tier::High).len(), 1);
        assert_eq!(tiers.get(Tier::Medium)[0].name(), "a");
        let low: Vec<_> = tiers.low.iter().map(|r| r.name()).collect();
        assert_eq!(low, ["b", "c"]);
        assert_eq!(inv.len(), 4);
    }

    #[test]
    fn absorb_appends_and_merges_stats() {
        let mut inv = Inventory::new();
        let mut harvest = Harvest::default();
        harvest.records.push(record("x", &[], None));
        harvest.stats.files_parsed = 2;
        harvest.stats.duplicates_skipped = 1;
        inv.absorb(harvest);
        inv.absorb(Harvest::default());
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.stats().files_parsed, 2);
        assert_eq!(inv.stats().duplicates_skipped, 1);
        assert!(!inv.is_empty());
    }
}
