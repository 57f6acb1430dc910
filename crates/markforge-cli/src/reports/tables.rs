use crate::cmd::run::RunReport;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use markforge_core::bridge::MarkEnergy;
use markforge_core::optimizer::RunStatistics;

pub struct CandidateRow {
    pub id: u64,
    pub kind: String,
    pub voxels: usize,
    pub energy: f64,
    pub initial: bool,
}

fn right_align(table: &mut Table, columns: std::ops::Range<usize>) {
    for i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

pub fn summary(report: &RunReport) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let s = &report.statistics;
    let rows = [
        ("Scene", report.scene.clone()),
        ("Run", report.run_id.chars().take(12).collect()),
        ("Energy", format!("{:.3}", report.energy)),
        ("Marks", report.marks.len().to_string()),
        ("Iterations", report.iterations.to_string()),
        ("Stopped by", report.termination.clone()),
        ("Accepted", s.accepted.to_string()),
        ("Rejected", s.rejected.to_string()),
        ("No proposal", s.no_proposals.to_string()),
        ("Calc failures", s.calculation_failures.to_string()),
        ("Checkpoints", s.checkpoints.to_string()),
        ("Elapsed", format!("{:.2}s", s.elapsed_secs)),
    ];
    for (key, value) in rows {
        table.add_row(vec![
            Cell::new(key).add_attribute(Attribute::Bold),
            Cell::new(value),
        ]);
    }
    println!("\n{}", table);
}

pub fn kernels(stats: &RunStatistics) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Kernel").add_attribute(Attribute::Bold),
        Cell::new("Selected"),
        Cell::new("None"),
        Cell::new("Accepted").fg(Color::Green),
        Cell::new("Rejected").fg(Color::Red),
        Cell::new("Failed"),
        Cell::new("Rate").add_attribute(Attribute::Bold),
    ]);
    right_align(&mut table, 1..7);

    for k in &stats.per_kernel {
        table.add_row(vec![
            Cell::new(&k.name).add_attribute(Attribute::Bold),
            Cell::new(k.selected),
            Cell::new(k.no_proposal),
            Cell::new(k.accepted).fg(Color::Green),
            Cell::new(k.rejected).fg(Color::Red),
            Cell::new(k.failed),
            Cell::new(format!("{:.1}%", k.acceptance_rate() * 100.0)),
        ]);
    }
    println!("\n{}", table);
}

pub fn marks(contributions: &[MarkEnergy]) {
    if contributions.is_empty() {
        println!("\nNo marks accepted.");
        return;
    }
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    table.add_row(vec![
        Cell::new("Mark").add_attribute(Attribute::Bold),
        Cell::new("Voxels"),
        Cell::new("Energy").fg(Color::Cyan),
    ]);
    right_align(&mut table, 1..3);

    for c in contributions {
        table.add_row(vec![
            Cell::new(c.id.0),
            Cell::new(c.voxels),
            Cell::new(format!("{:.3}", c.energy)).fg(Color::Cyan),
        ]);
    }
    println!("\n{}", table);
}

pub fn candidates(rows: &[CandidateRow]) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Candidate").add_attribute(Attribute::Bold),
        Cell::new("Kind"),
        Cell::new("Voxels"),
        Cell::new("Energy").fg(Color::Cyan),
        Cell::new("Initial"),
    ]);
    right_align(&mut table, 2..4);

    for r in rows {
        let energy = Cell::new(format!("{:.3}", r.energy));
        let energy = if r.energy < 0.0 {
            energy.fg(Color::Green)
        } else {
            energy.fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(r.id).add_attribute(Attribute::Bold),
            Cell::new(&r.kind),
            Cell::new(r.voxels),
            energy,
            Cell::new(if r.initial { "yes" } else { "" }),
        ]);
    }
    println!("\n{}", table);
}
