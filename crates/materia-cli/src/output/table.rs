use materia_core::catalog::Catalog;
use materia_core::correction::{CorrectionPlan, Decision};
use materia_core::manual::{KeyLevel, ManualSession};
use materia_core::report::{ConsolidatedReport, REPORT_HEADERS};

/// Equipment → [(conductor, poles)] for one structure.
pub type OptionTree = [(String, Vec<(String, Vec<String>)>)];

pub fn format_catalog_summary(catalog: &Catalog) -> String {
    let structures = catalog.structures();
    let mut out = vec![
        format!("  Entries:         {}", catalog.len()),
        format!("  Configurations:  {}", catalog.key_count()),
        format!("  Structures:      {}", structures.len()),
        String::new(),
    ];
    out.extend(structures.iter().map(|s| format!("    {s}")));
    out.join("\n")
}

pub fn format_option_tree(structure: &str, tree: &OptionTree) -> String {
    let mut out = vec![format!("=== {} ===", structure.trim().to_uppercase())];
    for (equipment, branches) in tree {
        out.push(format!("  {equipment}"));
        for (conductor, poles) in branches {
            out.push(format!("    {conductor}: {}", poles.join(", ")));
        }
    }
    out.join("\n")
}

pub fn format_options(level: KeyLevel, values: &[String]) -> String {
    let label = match level {
        KeyLevel::Structure => "Structures",
        KeyLevel::Equipment => "Equipment",
        KeyLevel::Conductor => "Conductors",
        KeyLevel::Pole => "Poles",
    };
    if values.is_empty() {
        return format!("{label}: none (check the values chosen so far)");
    }
    let mut out = vec![format!("{label}:")];
    out.extend(values.iter().map(|v| format!("  {v}")));
    out.join("\n")
}

pub fn format_plan(plan: &CorrectionPlan) -> String {
    if plan.is_empty() {
        return "  No unmatched configurations.".to_string();
    }
    let mut out = Vec::new();
    for entry in &plan.entries {
        out.push(format!(
            "  {}  ({} line(s), {} unit(s))",
            entry.key, entry.lines, entry.declared_total
        ));
        match &entry.decision {
            Some(Decision::Drop) => out.push("    decision: drop".into()),
            Some(Decision::Remap(v)) => out.push(format!("    decision: remap to {v}")),
            None if entry.alternatives.is_empty() => {
                out.push("    no alternatives under this structure; only drop".into())
            }
            None => {
                out.push("    alternatives:".into());
                out.extend(entry.alternatives.iter().map(|v| format!("      {v}")));
            }
        }
    }
    out.join("\n")
}

pub fn format_report(report: &ConsolidatedReport) -> String {
    let rows: Vec<[String; 4]> = report
        .items
        .iter()
        .map(|i| {
            [
                i.item_code.clone(),
                i.item_description.clone(),
                i.unit.clone(),
                i.total_quantity.to_string(),
            ]
        })
        .collect();

    let mut widths = REPORT_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 4]| {
        format!(
            "  {:<w0$}  {:<w1$}  {:<w2$}  {:>w3$}",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        )
    };

    let mut out = vec![format!("=== {} ===", report.project_name), String::new()];
    out.push(line(REPORT_HEADERS));
    for row in &rows {
        out.push(line([&row[0], &row[1], &row[2], &row[3]]));
    }
    out.push(String::new());
    out.push(format!(
        "  {} item(s) from {} project line(s)",
        report.item_count(),
        report.line_count
    ));
    out.join("\n")
}

pub fn format_manual_session(session: &ManualSession) -> String {
    let name = if session.project_name.is_empty() {
        "(unnamed)"
    } else {
        session.project_name.as_str()
    };
    let mut out = vec![format!("=== {name} ===")];
    if session.lines.is_empty() {
        out.push("  No lines yet.".into());
    }
    for (i, line) in session.lines.lines().iter().enumerate() {
        out.push(format!("  {:>3}. {} × {}", i + 1, line.key, line.declared_count));
    }
    out.join("\n")
}
