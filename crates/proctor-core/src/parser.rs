//! TOML paper parser.
//!
//! Loads question papers from TOML files and directories, applying default
//! section budgets where a file omits them, and funnels everything through
//! [`ExamPaper::new`] so loaded papers carry the same structural
//! guarantees as papers fetched from the portal.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    ChoiceOption, ExamPaper, OptionId, Question, QuestionId, QuestionKind, Section,
    DEFAULT_CHOICE_BUDGET_SECS, DEFAULT_ESSAY_BUDGET_SECS,
};

/// Intermediate TOML structure for paper files.
#[derive(Debug, Deserialize)]
struct TomlPaperFile {
    paper: TomlPaperHeader,
    #[serde(default)]
    sections: Vec<TomlSection>,
}

#[derive(Debug, Deserialize)]
struct TomlPaperHeader {
    title: String,
}

#[derive(Debug, Deserialize)]
struct TomlSection {
    kind: String,
    title: String,
    #[serde(default)]
    time_budget_minutes: Option<u64>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: i64,
    description: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    options: Vec<TomlOption>,
}

#[derive(Debug, Deserialize)]
struct TomlOption {
    id: i64,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

/// Parse a single TOML file into an `ExamPaper`.
pub fn parse_paper(path: &Path) -> Result<ExamPaper> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read paper file: {}", path.display()))?;
    parse_paper_str(&content, path)
}

/// Parse a TOML string into an `ExamPaper` (useful for testing).
pub fn parse_paper_str(content: &str, source_path: &Path) -> Result<ExamPaper> {
    let parsed: TomlPaperFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let sections = parsed
        .sections
        .into_iter()
        .map(|s| {
            let kind: QuestionKind = s
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("{e}"))?;
            let time_budget_secs = match s.time_budget_minutes {
                Some(minutes) => minutes * 60,
                None => match kind {
                    QuestionKind::MultipleChoice => DEFAULT_CHOICE_BUDGET_SECS,
                    QuestionKind::Essay => DEFAULT_ESSAY_BUDGET_SECS,
                },
            };
            let questions = s
                .questions
                .into_iter()
                .map(|q| Question {
                    id: QuestionId(q.id),
                    description: q.description,
                    image_url: q.image_url,
                    kind,
                    options: q
                        .options
                        .into_iter()
                        .map(|o| ChoiceOption {
                            id: OptionId(o.id),
                            text: o.text,
                            image_url: o.image_url,
                        })
                        .collect(),
                })
                .collect();
            Ok(Section {
                kind,
                title: s.title,
                time_budget_secs,
                questions,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let paper = ExamPaper::new(parsed.paper.title, sections)
        .with_context(|| format!("invalid paper: {}", source_path.display()))?;
    Ok(paper)
}

/// Load every `.toml` paper in a directory (non-recursive), sorted by file
/// name for deterministic output.
pub fn load_paper_directory(dir: &Path) -> Result<Vec<ExamPaper>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read paper directory: {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    entries.sort();

    entries.iter().map(|path| parse_paper(path)).collect()
}
