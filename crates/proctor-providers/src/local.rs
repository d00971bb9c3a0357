//! File-backed question provider.
//!
//! Serves a paper from a local TOML file via the core parser. Used by
//! rehearsals and demos where no live portal is involved; the paper goes
//! through the same validation as one fetched over HTTP.

use std::path::PathBuf;

use async_trait::async_trait;

use proctor_core::model::ExamPaper;
use proctor_core::parser::parse_paper;
use proctor_core::traits::QuestionProvider;

/// Question provider that reads a TOML paper from disk on every fetch.
pub struct LocalPaperProvider {
    path: PathBuf,
}

impl LocalPaperProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl QuestionProvider for LocalPaperProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch_paper(&self) -> anyhow::Result<ExamPaper> {
        let path = self.path.clone();
        // Paper files are small; reading is done off the async path anyway
        // to keep the trait contract honest.
        let paper = tokio::task::spawn_blocking(move || parse_paper(&path)).await??;
        Ok(paper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER: &str = r#"
[paper]
title = "Local Paper"

[[sections]]
kind = "multiple-choice"
title = "Section One"

[[sections.questions]]
id = 1
description = "Q1"

[[sections.questions.options]]
id = 1
text = "A"

[[sections]]
kind = "essay"
title = "Section Two"

[[sections.questions]]
id = 2
description = "Q2"
"#;

    #[tokio::test]
    async fn loads_paper_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.toml");
        std::fs::write(&path, PAPER).unwrap();

        let provider = LocalPaperProvider::new(&path);
        let paper = provider.fetch_paper().await.unwrap();
        assert_eq!(paper.title(), "Local Paper");
        assert_eq!(paper.question_count(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let provider = LocalPaperProvider::new("/nonexistent/paper.toml");
        assert!(provider.fetch_paper().await.is_err());
    }
}
