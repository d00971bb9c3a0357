//! The `proctor validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(paper_path: PathBuf) -> Result<()> {
    let papers = if paper_path.is_dir() {
        proctor_core::parser::load_paper_directory(&paper_path)?
    } else {
        vec![proctor_core::parser::parse_paper(&paper_path)?]
    };

    for paper in &papers {
        println!(
            "Paper: {} ({} questions)",
            paper.title(),
            paper.question_count()
        );
        for section in paper.sections() {
            println!(
                "  {} [{}]: {} questions, {} min",
                section.title,
                section.kind,
                section.questions.len(),
                section.time_budget_secs / 60
            );
        }
    }

    println!("All papers valid.");
    Ok(())
}
