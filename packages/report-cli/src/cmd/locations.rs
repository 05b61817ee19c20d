//! Location browsing commands

use anyhow::{Context, Result};
use audit_api_client::{LocationListParams, LocationSummary, ReportVersion};
use console::style;

use crate::context::AppContext;
use crate::utils::{format_file_size, format_timestamp, or_dash};

const DEFAULT_PAGE_SIZE: u32 = 25;

pub async fn list(
    ctx: &AppContext,
    page: u32,
    page_size: Option<u32>,
    search: Option<String>,
) -> Result<()> {
    let params = LocationListParams {
        page: Some(page),
        page_size: Some(page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
        search: search.filter(|s| !s.trim().is_empty()),
    };
    let response = ctx
        .client
        .fetch_locations(&params)
        .await
        .context("failed to list locations")?;

    if response.items.is_empty() {
        ctx.print_warning("No locations found");
        return Ok(());
    }

    let heading = format!(
        "{:<44} {:<20} {:>7} {:>6}",
        "Address", "Owner", "Devices", "Open"
    );
    println!("{}", style(heading).bold());
    for location in &response.items {
        println!(
            "{:<44} {:<20} {:>7} {:>6}",
            truncate(display_address(location), 44),
            truncate(or_dash(location.building_owner.as_deref()), 20),
            location.device_count,
            location.open_deficiencies
        );
    }

    println!();
    println!(
        "{}",
        style(format!(
            "Page {} of {} ({} locations)",
            response.page,
            page_count(response.total, response.page_size),
            response.total
        ))
        .dim()
    );
    Ok(())
}

pub async fn show(ctx: &AppContext, address: &str, location_id: Option<i64>) -> Result<()> {
    let detail = ctx
        .client
        .fetch_location_detail(address, location_id)
        .await
        .with_context(|| format!("failed to load location {}", address))?;
    let summary = &detail.summary;

    ctx.print_header(&summary.address);
    if let Some(site) = &summary.site_name {
        ctx.print_field("Site", site);
    }
    ctx.print_field("Owner", or_dash(summary.building_owner.as_deref()));
    ctx.print_field("Devices", summary.device_count);
    ctx.print_field("Audits", summary.audit_count);
    ctx.print_field(
        "Deficiencies",
        format!(
            "{} open of {}",
            summary.open_deficiencies, summary.total_deficiencies
        ),
    );

    ctx.print_header("Visits");
    if detail.visits.is_empty() {
        println!("  {}", style("No visits recorded").dim());
    }
    for visit in &detail.visits {
        println!(
            "  {:<24} {:<20} {:>3} audits {:>3} open  {}",
            or_dash(visit.visit_id.as_deref()),
            format_timestamp(visit.started_at.as_deref()),
            visit.audit_count,
            visit.open_deficiencies,
            or_dash(visit.label.as_deref())
        );
    }

    print_versions(ctx, "Reports", &detail.reports);
    print_versions(ctx, "Deficiency lists", &detail.deficiency_reports);
    Ok(())
}

fn print_versions(ctx: &AppContext, title: &str, versions: &[ReportVersion]) {
    ctx.print_header(title);
    if versions.is_empty() {
        println!("  {}", style("None generated yet").dim());
        return;
    }
    for version in versions {
        let label = version
            .version
            .map(|v| format!("v{}", v))
            .unwrap_or_else(|| "-".to_string());
        let size = version
            .size_bytes
            .map(format_file_size)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<5} {:<20} {:>9}  {}",
            label,
            format_timestamp(version.completed_at.as_deref().or(version.created_at.as_deref())),
            size,
            version.job_id
        );
    }
}

fn display_address(location: &LocationSummary) -> &str {
    location
        .formatted_address
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(&location.address)
}

fn page_count(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(u64::from(page_size)).max(1)
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 25), 1);
        assert_eq!(page_count(25, 25), 1);
        assert_eq!(page_count(26, 25), 2);
        assert_eq!(page_count(10, 0), 1);
    }

    #[test]
    fn long_values_are_truncated_to_width() {
        assert_eq!(truncate("12 Elm St", 20), "12 Elm St");
        let cut = truncate("1200 Industrial Parkway North", 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with('…'));
    }
}
