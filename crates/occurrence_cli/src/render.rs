//! Text and JSON rendering of core outputs.

use anyhow::Result;
use occurrence_core::{
    format_duration_label, DailySummary, ImportConflict, ImportReport, Occurrence, PersonId,
    PersonTotal,
};
use serde::Serialize;

pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn occurrence(&self, item: &Occurrence) -> Result<()> {
        if self.json {
            return self.print_json(item);
        }
        println!("{}", occurrence_line(item));
        Ok(())
    }

    pub fn occurrences(&self, items: &[&Occurrence]) -> Result<()> {
        if self.json {
            return self.print_json(items);
        }
        if items.is_empty() {
            println!("no occurrences found");
        }
        for item in items {
            println!("{}", occurrence_line(item));
        }
        Ok(())
    }

    pub fn conflicts(&self, occurrence_count: usize, conflicts: &[ImportConflict]) -> Result<()> {
        if self.json {
            #[derive(Serialize)]
            struct CheckOutput<'a> {
                occurrence_count: usize,
                conflicts: &'a [ImportConflict],
            }
            return self.print_json(&CheckOutput {
                occurrence_count,
                conflicts,
            });
        }
        println!("{occurrence_count} occurrences");
        print_conflicts(conflicts);
        Ok(())
    }

    pub fn import_report(&self, report: &ImportReport) -> Result<()> {
        if self.json {
            return self.print_json(report);
        }
        println!(
            "imported {} occurrences for {} people",
            report.occurrence_count, report.people_count
        );
        if !report.skipped_lines.is_empty() {
            let lines: Vec<String> = report.skipped_lines.iter().map(ToString::to_string).collect();
            println!("skipped lines without name or date: {}", lines.join(", "));
        }
        if !report.duplicate_id_lines.is_empty() {
            let lines: Vec<String> = report
                .duplicate_id_lines
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("lines repeating an earlier occurrence ID: {}", lines.join(", "));
        }
        print_conflicts(&report.conflicts);
        Ok(())
    }

    pub fn totals(&self, totals: &[PersonTotal]) -> Result<()> {
        if self.json {
            return self.print_json(totals);
        }
        for total in totals {
            println!(
                "{:<8} {:<30} {:>4}x {}",
                total.person_id.as_str(),
                total.person_name,
                total.occurrence_count,
                format_minutes(total.total_minutes)
            );
        }
        Ok(())
    }

    pub fn summary(&self, summary: &DailySummary) -> Result<()> {
        if self.json {
            return self.print_json(summary);
        }
        println!("date:          {}", summary.date);
        println!("occurrences:   {}", summary.occurrence_count);
        println!("unique people: {}", summary.unique_people);
        match summary.average_minutes {
            Some(avg) => println!("average:       {avg} min"),
            None => println!("average:       -"),
        }
        println!(
            "top type:      {}",
            summary.top_type.as_deref().unwrap_or("-")
        );
        Ok(())
    }

    pub fn preview_id(&self, name: &str, person_id: &PersonId) -> Result<()> {
        if self.json {
            return self.print_json(&serde_json::json!({ "name": name, "person_id": person_id }));
        }
        println!("{person_id}");
        Ok(())
    }
}

fn occurrence_line(item: &Occurrence) -> String {
    format!(
        "{}  {}  {} ({})  {}  {}",
        item.occurrence_id,
        item.date,
        item.person_name,
        item.person_id,
        item.occurrence_type,
        format_duration_label(item.duration_minutes)
    )
}

fn format_minutes(minutes: u64) -> String {
    match u32::try_from(minutes) {
        Ok(value) => format_duration_label(value),
        Err(_) => format!("{minutes} min"),
    }
}

fn print_conflicts(conflicts: &[ImportConflict]) {
    if conflicts.is_empty() {
        return;
    }
    println!("conflicts detected in CSV:");
    for conflict in conflicts {
        println!("  - {conflict}");
    }
}
