//! Console summary of a finished scan.

use std::fmt;

use crate::inventory::Inventory;
use crate::model::ServerRecord;
use crate::risk::Tier;

const RULE_WIDTH: usize = 60;

fn factor_list(record: &ServerRecord) -> String {
    record
        .risk_factors()
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn tier_bound(tier: Tier) -> &'static str {
    match tier {
        Tier::High => ">= 0.5",
        Tier::Medium => "0.3-0.5",
        Tier::Low => "< 0.3",
    }
}

/// Risk distribution, high-risk details, then every server in inventory order.
pub struct RiskSummary<'a>(pub &'a Inventory);

impl fmt::Display for RiskSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inventory = self.0;
        if inventory.is_empty() {
            return writeln!(f, "No MCP servers discovered");
        }
        let rule = "=".repeat(RULE_WIDTH);
        let tiers = inventory.tiers();

        writeln!(f, "{rule}\nMCP SERVER INVENTORY SUMMARY\n{rule}")?;
        writeln!(f, "\nRisk Distribution:")?;
        for tier in [Tier::High, Tier::Medium, Tier::Low] {
            let heading = format!("{} RISK ({}):", tier.label(), tier_bound(tier));
            writeln!(f, "  {heading:<23}{} servers", tiers.get(tier).len())?;
        }

        let high = tiers.get(Tier::High);
        if !high.is_empty() {
            writeln!(f, "\nHIGH RISK SERVERS:")?;
            for record in high {
                writeln!(f, "  - {}: {:.2}", record.name(), record.risk_score())?;
                writeln!(f, "    Risk Factors: {}", factor_list(record))?;
            }
        }

        writeln!(f, "\nAll Discovered Servers:")?;
        for (i, record) in inventory.records().iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, record.name())?;
            writeln!(f, "     Command: {}", record.target())?;
            writeln!(f, "     Risk Score: {:.2}", record.risk_score())?;
            if !record.risk_factors().is_empty() {
                writeln!(f, "     Risk Factors: {}", factor_list(record))?;
            }
            writeln!(f, "     Config: {}", record.config_path())?;
        }

        let stats = inventory.stats();
        writeln!(
            f,
            "\nLocations found: {}, files parsed: {}, duplicates skipped: {}, \
             failed documents: {}, skipped entries: {}, I/O failures: {}",
            stats.locations_found,
            stats.files_parsed,
            stats.duplicates_skipped,
            stats.documents_failed,
            stats.entries_skipped,
            stats.io_failures
        )
    }
}

pub fn render_summary(inventory: &Inventory) -> String {
    RiskSummary(inventory).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServerSpec;
    use crate::risk::NoBinaries;
    use std::collections::BTreeMap;
    use std::path::Path;

    #[test]
    fn empty_inventory_says_so() {
        assert_eq!(render_summary(&Inventory::new()), "No MCP servers discovered\n");
    }

    #[test]
    fn summary_lists_tiers_and_servers() {
        let mut inv = Inventory::new();
        let env = BTreeMap::from([("PG_PASSWORD".to_string(), "pw".to_string())]);
        inv.push(ServerRecord::with_probe(
            ServerSpec::command("filesystem-postgres", "node", vec![], env),
            Path::new("/c.json"),
            &NoBinaries,
        ));
        inv.push(ServerRecord::with_probe(
            ServerSpec::remote("hf", "https://hf.example/mcp"),
            Path::new("/d.json"),
            &NoBinaries,
        ));
        let text = render_summary(&inv);
        assert!(text.contains("HIGH RISK (>= 0.5):    1 servers"));
        assert!(text.contains("LOW RISK (< 0.3):      1 servers"));
        assert!(text.contains("  - filesystem-postgres: 0.65"));
        assert!(text.contains("SENSITIVE_ENV_VARS, FILE_SYSTEM_ACCESS, DATABASE_ACCESS"));
        assert!(text.contains("  2. hf\n     Command: https://hf.example/mcp"));
        assert!(text.contains("MEDIUM RISK (0.3-0.5): 0 servers"));
        assert_eq!(format!("{}", RiskSummary(&inv)), text);
    }
}
