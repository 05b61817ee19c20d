//! Audit and deficiency commands

use anyhow::{Context, Result};
use console::style;

use crate::context::AppContext;
use crate::utils::{format_timestamp, or_dash};

pub async fn show(ctx: &AppContext, audit_id: &str) -> Result<()> {
    let detail = ctx
        .client
        .fetch_audit_detail(audit_id)
        .await
        .with_context(|| format!("failed to load audit {}", audit_id))?;
    let audit = &detail.audit;

    ctx.print_header(&format!("Audit {}", audit.audit_uuid));
    ctx.print_field("Address", or_dash(audit.building_address.as_deref()));
    ctx.print_field("Owner", or_dash(audit.building_owner.as_deref()));
    ctx.print_field("Device", or_dash(audit.device_type.as_deref()));
    ctx.print_field("Bank", or_dash(audit.bank_name.as_deref()));
    ctx.print_field("Submitted", format_timestamp(audit.submitted_on.as_deref()));
    ctx.print_field("Photos", detail.photos.len());

    let open = detail.deficiencies.iter().filter(|d| !d.is_resolved()).count();
    ctx.print_header(&format!(
        "Deficiencies ({} open of {})",
        open,
        detail.deficiencies.len()
    ));
    for deficiency in &detail.deficiencies {
        let marker = if deficiency.is_resolved() {
            style("[x]").green()
        } else {
            style("[ ]").yellow()
        };
        let id = deficiency
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {:>6}  {}: {}",
            marker,
            id,
            or_dash(deficiency.violation_equipment.as_deref()),
            or_dash(deficiency.violation_condition.as_deref())
        );
        if let Some(remedy) = deficiency.violation_remedy.as_deref().filter(|r| !r.is_empty()) {
            println!("             {}", style(remedy).dim());
        }
    }
    Ok(())
}

pub async fn set_status(
    ctx: &AppContext,
    audit_id: &str,
    deficiency_id: i64,
    resolved: bool,
) -> Result<()> {
    let update = ctx
        .client
        .update_deficiency_status(audit_id, deficiency_id, resolved)
        .await
        .with_context(|| format!("failed to update deficiency {}", deficiency_id))?;

    if update.resolved {
        ctx.print_success(&format!(
            "Deficiency {} resolved ({})",
            deficiency_id,
            format_timestamp(update.resolved_at.as_deref())
        ));
    } else {
        ctx.print_success(&format!("Deficiency {} reopened", deficiency_id));
    }
    Ok(())
}
