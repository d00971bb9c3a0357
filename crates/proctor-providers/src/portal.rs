//! Recruitment portal HTTP client.
//!
//! Implements both collaborator traits against the portal REST API:
//! `GET /api/v1/assessment/paper` for the question set and
//! `POST /api/v1/assessment/submission` for the final payload.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use proctor_core::model::{
    ChoiceOption, ExamPaper, OptionId, Question, QuestionId, QuestionKind, Section,
    DEFAULT_CHOICE_BUDGET_SECS, DEFAULT_ESSAY_BUDGET_SECS,
};
use proctor_core::payload::{SubmissionPayload, SubmissionReceipt};
use proctor_core::traits::{QuestionProvider, SubmissionSink};

use crate::error::PortalError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the portal's assessment endpoints.
pub struct PortalClient {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
    /// Section budgets applied when the wire response omits
    /// `durationMinutes`.
    default_budgets: (u64, u64),
}

impl PortalClient {
    pub fn new(base_url: &str, api_token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            client,
            default_budgets: (DEFAULT_CHOICE_BUDGET_SECS, DEFAULT_ESSAY_BUDGET_SECS),
        }
    }

    /// Override the default section budgets (seconds) used when the portal
    /// omits them.
    pub fn with_default_budgets(mut self, choice_secs: u64, essay_secs: u64) -> Self {
        self.default_budgets = (choice_secs, essay_secs);
        self
    }

    fn classify_send_error(e: reqwest::Error) -> PortalError {
        if e.is_timeout() {
            PortalError::Timeout(DEFAULT_TIMEOUT_SECS)
        } else {
            PortalError::NetworkError(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PortalError> {
        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(PortalError::AuthenticationFailed(body));
        }
        if status == 404 {
            return Err(PortalError::PaperNotFound);
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<PortalErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(PortalError::ApiError { status, message });
        }
        Ok(response)
    }
}

#[derive(Deserialize)]
struct PortalErrorBody {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaperDto {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    sections: Vec<SectionDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionDto {
    kind: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration_minutes: Option<u64>,
    #[serde(default)]
    questions: Vec<QuestionDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionDto {
    id: i64,
    description: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    options: Vec<OptionDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionDto {
    id: i64,
    #[serde(default)]
    option_text: Option<String>,
    #[serde(default)]
    option_image_url: Option<String>,
}

#[derive(Deserialize)]
struct ReceiptDto {
    message: String,
}

impl PaperDto {
    fn into_paper(self, default_budgets: (u64, u64)) -> Result<ExamPaper, PortalError> {
        if self.sections.is_empty() {
            return Err(PortalError::MalformedPaper("no sections".to_string()));
        }
        let sections = self
            .sections
            .into_iter()
            .enumerate()
            .map(|(index, s)| {
                let kind: QuestionKind =
                    s.kind.parse().map_err(PortalError::MalformedPaper)?;
                let time_budget_secs = match s.duration_minutes {
                    Some(minutes) => minutes * 60,
                    None => match kind {
                        QuestionKind::MultipleChoice => default_budgets.0,
                        QuestionKind::Essay => default_budgets.1,
                    },
                };
                let title = s
                    .title
                    .unwrap_or_else(|| format!("Section {}", index + 1));
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
                                text: o.option_text,
                                image_url: o.option_image_url,
                            })
                            .collect(),
                    })
                    .collect();
                Ok(Section {
                    kind,
                    title,
                    time_budget_secs,
                    questions,
                })
            })
            .collect::<Result<Vec<_>, PortalError>>()?;

        let title = self.title.unwrap_or_else(|| "Assessment".to_string());
        ExamPaper::new(title, sections)
            .map_err(|e| PortalError::MalformedPaper(e.to_string()))
    }
}

#[async_trait]
impl QuestionProvider for PortalClient {
    fn name(&self) -> &str {
        "portal"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_paper(&self) -> anyhow::Result<ExamPaper> {
        let response = self
            .client
            .get(format!("{}/api/v1/assessment/paper", self.base_url))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        let response = Self::check_status(response).await?;
        let dto: PaperDto = response.json().await.map_err(|e| {
            PortalError::MalformedPaper(format!("failed to parse paper response: {e}"))
        })?;

        let paper = dto.into_paper(self.default_budgets)?;
        tracing::debug!(
            questions = paper.question_count(),
            title = paper.title(),
            "paper fetched"
        );
        Ok(paper)
    }
}

#[async_trait]
impl SubmissionSink for PortalClient {
    fn name(&self) -> &str {
        "portal"
    }

    #[instrument(skip(self, payload), fields(answers = payload.answer_count()))]
    async fn submit(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionReceipt> {
        let response = self
            .client
            .post(format!("{}/api/v1/assessment/submission", self.base_url))
            .bearer_auth(&self.api_token)
            .json(payload)
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        let response = Self::check_status(response).await?;
        let dto: ReceiptDto = response.json().await.map_err(|e| PortalError::ApiError {
            status: 0,
            message: format!("failed to parse submission response: {e}"),
        })?;

        Ok(SubmissionReceipt {
            message: dto.message,
        })
    }
}
