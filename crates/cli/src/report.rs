//! Plain-text rendering of a nesting report.

use std::fmt::Write;
use u_cutlist_d1::NestingReport;

/// Renders the per-stock cut list followed by the totals.
pub fn render_text(report: &NestingReport) -> String {
    let mut out = String::new();
    let diag = &report.diagnostics;

    let _ = writeln!(
        out,
        "Status: {} ({}, {} ms, {} nodes)",
        report.status, diag.solver, diag.wall_time_ms, diag.nodes_explored
    );
    if !report.optimality_proven {
        let _ = writeln!(out, "WARNING: optimality not proven ({})", diag.message);
    }
    let _ = writeln!(out, "Kerf width: {}", report.kerf_width);

    for usage in &report.stock_usage {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} ({}, length {})",
            usage.stock_id, usage.provenance, usage.stock_length
        );
        let _ = writeln!(out, "  parts:    {}", usage.part_ids.join(", "));
        let _ = writeln!(
            out,
            "  utilised: {} (kerf loss {})",
            usage.length_utilised, usage.kerf_loss
        );
        let _ = writeln!(
            out,
            "  offcut:   {} ({:.1}% wastage)",
            usage.offcut, usage.wastage_pct
        );
    }

    let totals = &report.totals;
    let _ = writeln!(out);
    let _ = writeln!(out, "{:-<60}", "");
    let _ = writeln!(
        out,
        "Stock used:    {} (total length {})",
        totals.stock_count, totals.total_stock_length
    );
    let _ = writeln!(
        out,
        "Parts nested:  {} (total length {})",
        totals.parts_nested, totals.total_part_length
    );
    let _ = writeln!(
        out,
        "Total offcut:  {} ({:.1}% wastage)",
        totals.total_offcut, totals.wastage_pct
    );
    let _ = writeln!(
        out,
        "Utilisation:   {:.1}%",
        report.utilization() * 100.0
    );
    let _ = writeln!(out, "Cost value:    {}", totals.total_cost_value);
    if !report.unused_stock.is_empty() {
        let _ = writeln!(out, "Unused stock:  {}", report.unused_stock.join(", "));
    }
    out
}
