//! Weekly brief synthesis: turns an artifact set (plus optional movement
//! data) into a structured Markdown document.
//!
//! Composition is deterministic apart from the generation timestamp captured
//! when `compose` runs.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};

use crate::artifact::{ArtifactSet, PriorityItem, Severity};
use crate::delta::Delta;
use crate::error::Result;

/// Entries shown in the vendor, product and watchlist sections.
pub const TOP_ENTRIES: usize = 10;

/// Hard character cut applied to watchlist descriptions.
pub const DESC_MAX_CHARS: usize = 140;

/// 7-day critical count above which the takeaway uses "elevated" wording.
pub const CRITICAL_ELEVATED_THRESHOLD: u64 = 50;

/// 7-day critical count above which the takeaway uses "moderate" wording.
pub const CRITICAL_MODERATE_THRESHOLD: u64 = 10;

/// 7-day high count above which an extra volume note is appended.
pub const HIGH_VOLUME_THRESHOLD: u64 = 300;

const ATTRIBUTION: &str = "Generated by the Bastion Codex reporting pipeline";

/// A composed brief, ready to be written to `data/briefs/`.
#[derive(Debug, Clone, PartialEq)]
pub struct Brief {
    pub run_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub markdown: String,
}

impl Brief {
    /// Write the document, creating parent directories. Regenerating for the
    /// same date overwrites the prior file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.markdown)?;
        Ok(())
    }
}

/// Builds the weekly brief from one run's artifacts.
pub struct BriefComposer<'a> {
    run_date: NaiveDate,
    artifacts: &'a ArtifactSet,
    delta: Option<&'a Delta>,
}

impl<'a> BriefComposer<'a> {
    pub fn new(run_date: NaiveDate, artifacts: &'a ArtifactSet) -> Self {
        Self {
            run_date,
            artifacts,
            delta: None,
        }
    }

    /// Include a movement section comparing against the previous snapshot.
    pub fn with_delta(mut self, delta: &'a Delta) -> Self {
        self.delta = Some(delta);
        self
    }

    /// Compose the brief, capturing the generation timestamp.
    pub fn compose(&self) -> Brief {
        let generated_at = Utc::now();
        Brief {
            run_date: self.run_date,
            generated_at,
            markdown: self.render(generated_at),
        }
    }

    fn render(&self, generated_at: DateTime<Utc>) -> String {
        let t7 = &self.artifacts.trends_7d;
        let t30 = &self.artifacts.trends_30d;

        let mut md = String::new();
        md.push_str("# Weekly Threat Intelligence Brief\n\n");
        md.push_str(&format!("_Week of {}_\n\n", self.run_date));

        // Executive snapshot
        md.push_str("## Executive Snapshot\n\n");
        md.push_str(&format!("- New items (7d): {}\n", t7.total_items));
        md.push_str(&format!(
            "- Critical severity (7d): {}\n",
            t7.by_severity.critical
        ));
        md.push_str(&format!("- High severity (7d): {}\n", t7.by_severity.high));
        md.push_str(&format!("- KEV-listed (30d): {}\n\n", t30.kev_items));

        // Movement (only with history)
        if let Some(delta) = self.delta {
            md.push_str("## Movement Since Last Snapshot\n\n");
            md.push_str("| Metric | Previous | Current | Change | % |\n");
            md.push_str("|--------|---------:|--------:|-------:|--:|\n");
            md.push_str(&movement_row("Total", &delta.total));
            for severity in Severity::ALL {
                md.push_str(&movement_row(
                    severity.label(),
                    &delta.by_severity.get(severity),
                ));
            }
            md.push('\n');
        }

        // Takeaways: three independent checks
        md.push_str("## Takeaways\n\n");
        let critical = t7.by_severity.critical;
        if critical > CRITICAL_ELEVATED_THRESHOLD {
            md.push_str(&format!(
                "- Critical-severity inflow is elevated ({critical} new in 7 days); prioritize patch triage this week.\n"
            ));
        } else if critical > CRITICAL_MODERATE_THRESHOLD {
            md.push_str(&format!(
                "- Critical-severity inflow is moderate ({critical} new in 7 days).\n"
            ));
        } else {
            md.push_str(&format!(
                "- Critical-severity inflow is below baseline ({critical} new in 7 days).\n"
            ));
        }
        if t30.kev_items > 0 {
            md.push_str(&format!(
                "- {} KEV-listed item(s) in the 30-day window; review the watchlist for mandated remediation.\n",
                t30.kev_items
            ));
        } else {
            md.push_str("- No new KEV movement in the 30-day window.\n");
        }
        if t7.by_severity.high > HIGH_VOLUME_THRESHOLD {
            md.push_str(&format!(
                "- High-severity volume is unusually heavy ({} in 7 days); expect a noisy triage queue.\n",
                t7.by_severity.high
            ));
        }
        md.push('\n');

        // Severity breakdown, fixed order
        md.push_str("## Severity Breakdown (7d)\n\n");
        md.push_str("| Severity | Count |\n");
        md.push_str("|----------|------:|\n");
        for severity in Severity::ALL {
            md.push_str(&format!(
                "| {} | {} |\n",
                severity.label(),
                t7.by_severity.get(severity)
            ));
        }
        md.push('\n');

        // Top vendors / products, upstream order preserved
        md.push_str("## Top Vendors (30d)\n\n");
        if t30.top_vendors.is_empty() {
            md.push_str("No vendor data in this window.\n");
        }
        for entry in t30.top_vendors.iter().take(TOP_ENTRIES) {
            md.push_str(&format!("- {} — {}\n", entry.name, entry.count));
        }
        md.push('\n');

        md.push_str("## Top Products (30d)\n\n");
        if t30.top_products.is_empty() {
            md.push_str("No product data in this window.\n");
        }
        for entry in t30.top_products.iter().take(TOP_ENTRIES) {
            md.push_str(&format!("- {} — {}\n", entry.name, entry.count));
        }
        md.push('\n');

        // Priority watchlist
        md.push_str("## Priority Watchlist\n\n");
        let ranked = rank_priority_items(&self.artifacts.priority_items);
        if ranked.is_empty() {
            md.push_str("No priority items this week.\n");
        }
        for (idx, item) in ranked.iter().take(TOP_ENTRIES).enumerate() {
            let cvss = match item.cvss {
                Some(score) => format!("{score:.1}"),
                None => "n/a".to_string(),
            };
            let kev = if item.kev { "yes" } else { "no" };
            md.push_str(&format!(
                "{}. **{}** (CVSS {}, KEV: {}) — {}\n",
                idx + 1,
                item.id,
                cvss,
                kev,
                clip(&item.short_desc, DESC_MAX_CHARS)
            ));
        }
        md.push('\n');

        // Footer
        md.push_str("---\n\n");
        md.push_str(&format!(
            "_{} at {}_\n",
            ATTRIBUTION,
            generated_at.to_rfc3339()
        ));

        md
    }
}

/// Order the watchlist: KEV-listed items first, then by CVSS descending
/// (absent scored as 0), stable on input order otherwise.
pub fn rank_priority_items(items: &[PriorityItem]) -> Vec<&PriorityItem> {
    let mut ranked: Vec<&PriorityItem> = items.iter().collect();
    ranked.sort_by(|a, b| {
        b.kev.cmp(&a.kev).then(
            b.cvss
                .unwrap_or(0.0)
                .partial_cmp(&a.cvss.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal),
        )
    });
    ranked
}

fn movement_row(label: &str, change: &crate::delta::MetricChange) -> String {
    format!(
        "| {} | {} | {} | {:+} | {} |\n",
        label,
        change.old,
        change.new,
        change.delta,
        fmt_pct(change.pct)
    )
}

fn fmt_pct(pct: Option<f64>) -> String {
    match pct {
        Some(value) => format!("{value:.1}%"),
        None => "n/a".to_string(),
    }
}

/// Hard character cut, no word-boundary awareness.
fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::TrendSummary;
    use crate::delta;

    fn artifacts(trends_7d: &str, trends_30d: &str) -> ArtifactSet {
        ArtifactSet {
            trends_7d: serde_json::from_str(trends_7d).unwrap(),
            trends_30d: serde_json::from_str(trends_30d).unwrap(),
            priority_items: Vec::new(),
        }
    }

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
    }

    #[test]
    fn elevated_critical_wording_above_fifty() {
        let set = artifacts(
            r#"{"total_items": 120, "by_severity": {"critical": 60, "high": 10}}"#,
            "{}",
        );
        let brief = BriefComposer::new(run_date(), &set).compose();
        assert!(brief.markdown.contains("elevated (60 new in 7 days)"));
        assert!(!brief.markdown.contains("moderate"));
    }

    #[test]
    fn baseline_critical_and_no_kev_movement() {
        let set = artifacts(
            r#"{"by_severity": {"critical": 5}}"#,
            r#"{"kev_items": 0}"#,
        );
        let brief = BriefComposer::new(run_date(), &set).compose();
        assert!(brief.markdown.contains("below baseline (5 new in 7 days)"));
        assert!(brief.markdown.contains("No new KEV movement"));
    }

    #[test]
    fn moderate_band_is_exclusive() {
        let set = artifacts(r#"{"by_severity": {"critical": 50}}"#, "{}");
        let brief = BriefComposer::new(run_date(), &set).compose();
        // 50 is not > 50: moderate, not elevated
        assert!(brief.markdown.contains("moderate (50 new in 7 days)"));
    }

    #[test]
    fn high_volume_note_is_independent() {
        let set = artifacts(
            r#"{"by_severity": {"critical": 60, "high": 301}}"#,
            r#"{"kev_items": 2}"#,
        );
        let brief = BriefComposer::new(run_date(), &set).compose();
        assert!(brief.markdown.contains("elevated"));
        assert!(brief.markdown.contains("KEV-listed item(s)"));
        assert!(brief.markdown.contains("unusually heavy (301 in 7 days)"));
    }

    #[test]
    fn movement_section_only_with_delta() {
        let set = artifacts(r#"{"total_items": 150}"#, "{}");
        let without = BriefComposer::new(run_date(), &set).compose();
        assert!(!without.markdown.contains("Movement Since Last Snapshot"));

        let previous: TrendSummary = serde_json::from_str(r#"{"total_items": 100}"#).unwrap();
        let d = delta::compute(&previous, &set.trends_7d);
        let with = BriefComposer::new(run_date(), &set).with_delta(&d).compose();
        assert!(with.markdown.contains("Movement Since Last Snapshot"));
        assert!(with.markdown.contains("| Total | 100 | 150 | +50 | 50.0% |"));
    }

    #[test]
    fn zero_baseline_renders_na() {
        let set = artifacts(r#"{"total_items": 20}"#, "{}");
        let previous = TrendSummary::default();
        let d = delta::compute(&previous, &set.trends_7d);
        let brief = BriefComposer::new(run_date(), &set).with_delta(&d).compose();
        assert!(brief.markdown.contains("| Total | 0 | 20 | +20 | n/a |"));
    }

    #[test]
    fn severity_table_fixed_order_with_defaults() {
        let set = artifacts(r#"{"by_severity": {"high": 7}}"#, "{}");
        let brief = BriefComposer::new(run_date(), &set).compose();
        let critical = brief.markdown.find("| Critical | 0 |").unwrap();
        let high = brief.markdown.find("| High | 7 |").unwrap();
        let unknown = brief.markdown.find("| Unknown | 0 |").unwrap();
        assert!(critical < high && high < unknown);
    }

    #[test]
    fn kev_outranks_any_cvss() {
        let items = vec![
            PriorityItem {
                id: "CVE-2026-0001".into(),
                cvss: Some(10.0),
                kev: false,
                short_desc: String::new(),
            },
            PriorityItem {
                id: "CVE-2026-0002".into(),
                cvss: Some(1.0),
                kev: true,
                short_desc: String::new(),
            },
        ];
        let ranked = rank_priority_items(&items);
        assert_eq!(ranked[0].id, "CVE-2026-0002");
        assert_eq!(ranked[1].id, "CVE-2026-0001");
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let items = vec![
            PriorityItem {
                id: "a".into(),
                cvss: Some(8.0),
                kev: false,
                short_desc: String::new(),
            },
            PriorityItem {
                id: "b".into(),
                cvss: Some(8.0),
                kev: false,
                short_desc: String::new(),
            },
            PriorityItem {
                id: "c".into(),
                cvss: None,
                kev: false,
                short_desc: String::new(),
            },
        ];
        let ids: Vec<&str> = rank_priority_items(&items)
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        // absent CVSS sorts as 0, ties keep input order
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn description_hard_cut_at_140_chars() {
        let long_desc: String = "x".repeat(200);
        let set = ArtifactSet {
            trends_7d: TrendSummary::default(),
            trends_30d: TrendSummary::default(),
            priority_items: vec![PriorityItem {
                id: "CVE-2026-0003".into(),
                cvss: None,
                kev: false,
                short_desc: long_desc,
            }],
        };
        let brief = BriefComposer::new(run_date(), &set).compose();
        let line = brief
            .markdown
            .lines()
            .find(|l| l.contains("CVE-2026-0003"))
            .unwrap();
        let rendered_desc: String = line.chars().filter(|c| *c == 'x').collect();
        assert_eq!(rendered_desc.len(), DESC_MAX_CHARS);
        assert!(line.contains("CVSS n/a"));
    }

    #[test]
    fn watchlist_caps_at_ten_entries() {
        let items: Vec<PriorityItem> = (0..15)
            .map(|i| PriorityItem {
                id: format!("CVE-2026-{i:04}"),
                cvss: Some(5.0),
                kev: false,
                short_desc: String::new(),
            })
            .collect();
        let set = ArtifactSet {
            trends_7d: TrendSummary::default(),
            trends_30d: TrendSummary::default(),
            priority_items: items,
        };
        let brief = BriefComposer::new(run_date(), &set).compose();
        assert!(brief.markdown.contains("CVE-2026-0009"));
        assert!(!brief.markdown.contains("CVE-2026-0010"));
    }

    #[test]
    fn vendor_order_preserved_and_capped() {
        let vendors: Vec<String> = (0..12).map(|i| format!(r#"{{"name":"vendor-{i}","count":{}}}"#, 100 - i)).collect();
        let set = artifacts(
            "{}",
            &format!(r#"{{"top_vendors": [{}]}}"#, vendors.join(",")),
        );
        let brief = BriefComposer::new(run_date(), &set).compose();
        let v0 = brief.markdown.find("vendor-0").unwrap();
        let v9 = brief.markdown.find("vendor-9").unwrap();
        assert!(v0 < v9);
        assert!(!brief.markdown.contains("vendor-10"));
    }

    #[test]
    fn footer_has_attribution_and_timestamp() {
        let set = artifacts("{}", "{}");
        let ts = DateTime::parse_from_rfc3339("2026-08-29T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let md = BriefComposer::new(run_date(), &set).render(ts);
        assert!(md.contains(ATTRIBUTION));
        assert!(md.contains("2026-08-29T12:00:00+00:00"));
    }

    #[test]
    fn write_to_creates_parent_dirs_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data").join("briefs").join("weekly-2026-08-29.md");
        let set = artifacts("{}", "{}");

        let brief = BriefComposer::new(run_date(), &set).compose();
        brief.write_to(&path).unwrap();
        assert!(path.is_file());

        let second = BriefComposer::new(run_date(), &set).compose();
        second.write_to(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, second.markdown);
    }
}
