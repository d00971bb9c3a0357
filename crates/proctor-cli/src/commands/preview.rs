//! The `proctor preview` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

pub fn execute(paper_path: PathBuf) -> Result<()> {
    let paper = proctor_core::parser::parse_paper(&paper_path)?;

    println!("{}", paper.title());

    let mut table = Table::new();
    table.set_header(vec!["#", "Section", "Kind", "Question", "Options"]);

    for (s, section) in paper.sections().iter().enumerate() {
        for (q, question) in section.questions.iter().enumerate() {
            let options = if question.options.is_empty() {
                "-".to_string()
            } else {
                question
                    .options
                    .iter()
                    .map(|o| o.id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            table.add_row(vec![
                Cell::new(paper.number_of(s, q)),
                Cell::new(&section.title),
                Cell::new(section.kind),
                Cell::new(&question.description),
                Cell::new(options),
            ]);
        }
    }

    println!("{table}");

    let total_secs: u64 = paper.sections().iter().map(|s| s.time_budget_secs).sum();
    println!(
        "{} sections, {} questions, {} minutes total",
        paper.sections().len(),
        paper.question_count(),
        total_secs / 60
    );

    Ok(())
}
