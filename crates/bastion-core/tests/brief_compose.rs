//! Brief structure tests over full artifact sets.

use chrono::NaiveDate;

use bastion_core::{
    compute_delta, ArtifactSet, BriefComposer, PriorityItem, TrendSummary,
};

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
}

fn full_artifacts() -> ArtifactSet {
    ArtifactSet {
        trends_7d: serde_json::from_str(
            r#"{
                "total_items": 420,
                "by_severity": {"critical": 12, "high": 180, "medium": 150, "low": 60, "unknown": 18}
            }"#,
        )
        .unwrap(),
        trends_30d: serde_json::from_str(
            r#"{
                "total_items": 1900,
                "kev_items": 6,
                "top_vendors": [
                    {"name": "Microsoft", "count": 88},
                    {"name": "Adobe", "count": 41}
                ],
                "top_products": [
                    {"name": "Windows", "count": 52},
                    {"name": "Acrobat", "count": 23}
                ]
            }"#,
        )
        .unwrap(),
        priority_items: vec![
            PriorityItem {
                id: "CVE-2026-2000".into(),
                cvss: Some(9.9),
                kev: false,
                short_desc: "Remote code execution in a widely deployed gateway.".into(),
            },
            PriorityItem {
                id: "CVE-2026-1000".into(),
                cvss: Some(4.3),
                kev: true,
                short_desc: "Actively exploited auth bypass.".into(),
            },
        ],
    }
}

#[test]
fn all_sections_present_in_order() {
    let set = full_artifacts();
    let previous: TrendSummary = serde_json::from_str(r#"{"total_items": 400}"#).unwrap();
    let delta = compute_delta(&previous, &set.trends_7d);
    let brief = BriefComposer::new(run_date(), &set)
        .with_delta(&delta)
        .compose();

    let md = &brief.markdown;
    let headings = [
        "# Weekly Threat Intelligence Brief",
        "## Executive Snapshot",
        "## Movement Since Last Snapshot",
        "## Takeaways",
        "## Severity Breakdown (7d)",
        "## Top Vendors (30d)",
        "## Top Products (30d)",
        "## Priority Watchlist",
    ];
    let mut last = 0;
    for heading in headings {
        let pos = md.find(heading).unwrap_or_else(|| panic!("missing: {heading}"));
        assert!(pos >= last, "out of order: {heading}");
        last = pos;
    }
    assert!(md.contains("_Week of 2026-08-29_"));
}

#[test]
fn executive_snapshot_numbers() {
    let set = full_artifacts();
    let brief = BriefComposer::new(run_date(), &set).compose();
    assert!(brief.markdown.contains("- New items (7d): 420"));
    assert!(brief.markdown.contains("- Critical severity (7d): 12"));
    assert!(brief.markdown.contains("- High severity (7d): 180"));
    assert!(brief.markdown.contains("- KEV-listed (30d): 6"));
}

#[test]
fn kev_item_leads_the_watchlist() {
    let set = full_artifacts();
    let brief = BriefComposer::new(run_date(), &set).compose();
    let kev_pos = brief.markdown.find("CVE-2026-1000").unwrap();
    let cvss_pos = brief.markdown.find("CVE-2026-2000").unwrap();
    assert!(kev_pos < cvss_pos, "KEV item must outrank higher CVSS");
    assert!(brief.markdown.contains("(CVSS 4.3, KEV: yes)"));
}

#[test]
fn moderate_critical_with_kev_review_note() {
    let set = full_artifacts();
    let brief = BriefComposer::new(run_date(), &set).compose();
    // critical = 12: in the (10, 50] moderate band
    assert!(brief.markdown.contains("moderate (12 new in 7 days)"));
    assert!(brief.markdown.contains("6 KEV-listed item(s)"));
    // high = 180 is under the volume threshold
    assert!(!brief.markdown.contains("unusually heavy"));
}

#[test]
fn vendor_and_product_lists_keep_upstream_order() {
    let set = full_artifacts();
    let brief = BriefComposer::new(run_date(), &set).compose();
    let microsoft = brief.markdown.find("Microsoft — 88").unwrap();
    let adobe = brief.markdown.find("Adobe — 41").unwrap();
    assert!(microsoft < adobe);
    assert!(brief.markdown.contains("Windows — 52"));
}
