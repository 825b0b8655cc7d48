//! Orchestration of contract analysis: rate gating, quota, detection,
//! generation, parsing, and persistence, plus follow-up chat.

pub mod chat;
pub mod error;
pub mod extract;

pub use chat::ChatAnswer;
pub use error::EngineError;
pub use extract::{ExtractError, PlainTextExtractor, TextExtractor};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pactscan_ai::{Generator, detect_contract_type, detect_language, prompt};
use pactscan_core::{
    AnalysisRecord, AnalysisRequest, Feedback, detect_language_heuristic,
    expiration_from_duration, parse_analysis,
};
use pactscan_store::{AnalysisStore, Cache, RateLimiter};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifetime of a staged upload. Matches the cached-record TTL.
const STAGING_TTL: Duration = Duration::from_secs(3600);

/// Pipeline stage, for log correlation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    Detecting,
    Prompting,
    Generating,
    Parsing,
    Persisting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Detecting => "detecting",
            Stage::Prompting => "prompting",
            Stage::Generating => "generating",
            Stage::Parsing => "parsing",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

pub struct Engine {
    generator: Arc<dyn Generator>,
    analyses: Arc<AnalysisStore>,
    cache: Arc<dyn Cache>,
    limiter: RateLimiter,
}

impl Engine {
    pub fn new(
        generator: Arc<dyn Generator>,
        analyses: Arc<AnalysisStore>,
        cache: Arc<dyn Cache>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            generator,
            analyses,
            cache,
            limiter,
        }
    }

    /// Run the full pipeline for one document and persist the result.
    ///
    /// Quota is checked before the external call so a capped owner never
    /// spends generation time, and checked again atomically at insert so
    /// concurrent requests cannot overshoot. The parser cannot fail; a
    /// malformed completion yields a degraded record, not an error.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisRecord, EngineError> {
        debug!(owner = %request.owner_id, tier = %request.tier.as_str(), stage = %Stage::Received, "analysis requested");
        if !self.limiter.check(&request.owner_id).await.allowed {
            return Err(EngineError::RateLimited);
        }
        if request.document_text.trim().is_empty() {
            return Err(EngineError::Validation("document text is required"));
        }
        let quota = request.tier.stored_quota();
        if let Some(max) = quota
            && self.analyses.count_by_owner(&request.owner_id).await? >= max
        {
            return Err(EngineError::QuotaExceeded(max));
        }

        let staging_key = self.stage_upload(&request.owner_id, &request.document_text).await;
        let result = self.analyze_staged(request, quota).await;
        self.release_upload(&staging_key).await;
        result
    }

    async fn analyze_staged(
        &self,
        request: AnalysisRequest,
        quota: Option<usize>,
    ) -> Result<AnalysisRecord, EngineError> {
        debug!(stage = %Stage::Detecting, "detecting language and contract type");
        let language = match &request.language_hint {
            Some(hint) if !hint.trim().is_empty() => hint.trim().to_lowercase(),
            _ => match detect_language(self.generator.as_ref(), &request.document_text).await {
                Ok(code) => code,
                Err(e) => {
                    warn!(error = %e, "language detection failed, using heuristic");
                    detect_language_heuristic(&request.document_text).to_string()
                }
            },
        };
        let contract_type = if request.contract_type.trim().is_empty() {
            detect_contract_type(self.generator.as_ref(), &request.document_text).await?
        } else {
            request.contract_type.trim().to_string()
        };

        debug!(stage = %Stage::Prompting, %language, %contract_type, "building prompt");
        let prompt_text = prompt::analysis_prompt(
            &request.document_text,
            request.tier,
            &contract_type,
            &language,
        );

        debug!(stage = %Stage::Generating, "calling generator");
        let raw = self.generator.generate(&prompt_text).await?;

        debug!(stage = %Stage::Parsing, completion_chars = raw.len(), "parsing completion");
        let outcome = parse_analysis(&raw, request.tier);
        if outcome.degraded {
            warn!(owner = %request.owner_id, "completion was malformed, analysis stored degraded");
        }

        debug!(stage = %Stage::Persisting, "persisting analysis");
        let expiration_date = if request.tier.supports_levels() {
            expiration_from_duration(&outcome.contract_duration, Utc::now())
        } else {
            None
        };
        let record = AnalysisRecord {
            id: Uuid::new_v4(),
            owner_id: request.owner_id,
            project_id: request.project_id,
            contract_text: request.document_text,
            contract_type,
            language,
            tier: request.tier,
            outcome,
            expiration_date,
            feedback: None,
            created_at: Utc::now(),
        };
        self.analyses.create(record.clone(), quota).await?;
        info!(id = %record.id, owner = %record.owner_id, score = record.outcome.overall_score, stage = %Stage::Done, "analysis stored");
        Ok(record)
    }

    /// Extract text from an uploaded file, then run [`analyze`](Self::analyze).
    pub async fn analyze_upload(
        &self,
        extractor: &dyn TextExtractor,
        bytes: &[u8],
        filename: &str,
        mut request: AnalysisRequest,
    ) -> Result<AnalysisRecord, EngineError> {
        request.document_text = extractor.extract(bytes, filename)?;
        self.analyze(request).await
    }

    /// Classify a document without storing anything.
    pub async fn detect_type(&self, owner_id: &str, text: &str) -> Result<String, EngineError> {
        if !self.limiter.check(owner_id).await.allowed {
            return Err(EngineError::RateLimited);
        }
        if text.trim().is_empty() {
            return Err(EngineError::Validation("document text is required"));
        }
        let staging_key = self.stage_upload(owner_id, text).await;
        let result = detect_contract_type(self.generator.as_ref(), text).await;
        self.release_upload(&staging_key).await;
        Ok(result?)
    }

    /// Answer a follow-up question about a stored analysis.
    ///
    /// Ownership is re-checked against the durable store rather than the
    /// cache, since a stale cached copy must not grant access.
    pub async fn ask(
        &self,
        id: Uuid,
        owner_id: &str,
        question: &str,
    ) -> Result<ChatAnswer, EngineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EngineError::Validation("a question is required"));
        }
        if !self.limiter.check(owner_id).await.allowed {
            return Err(EngineError::RateLimited);
        }
        let record = self.analyses.get_durable(id, owner_id).await?;
        let prompt_text =
            prompt::chat_prompt(&chat::chat_context(&record), &record.contract_text, question);
        let answer = self.generator.generate(&prompt_text).await?;
        Ok(chat::interpret_answer(answer, question))
    }

    pub async fn get(&self, id: Uuid, owner_id: &str) -> Result<AnalysisRecord, EngineError> {
        Ok(self.analyses.get(id, owner_id).await?)
    }

    pub async fn list(
        &self,
        owner_id: &str,
        project: Option<&str>,
    ) -> Result<Vec<AnalysisRecord>, EngineError> {
        Ok(self.analyses.list_by_owner(owner_id, project).await?)
    }

    pub async fn delete(&self, id: Uuid, owner_id: &str) -> Result<(), EngineError> {
        self.analyses.delete(id, owner_id).await?;
        info!(%id, owner = %owner_id, "analysis deleted");
        Ok(())
    }

    pub async fn attach_feedback(
        &self,
        id: Uuid,
        owner_id: &str,
        feedback: Feedback,
    ) -> Result<(), EngineError> {
        if !(1..=5).contains(&feedback.rating) {
            return Err(EngineError::Validation("rating must be between 1 and 5"));
        }
        Ok(self.analyses.attach_feedback(id, owner_id, feedback).await?)
    }

    /// Park the raw document in the cache for the pipeline's lifetime.
    /// Returns the key; the caller must release it on every exit path.
    async fn stage_upload(&self, owner_id: &str, text: &str) -> String {
        let key = format!("file:{}:{}", owner_id, Utc::now().timestamp_millis());
        if let Err(e) = self.cache.set(&key, text, STAGING_TTL).await {
            warn!(key = %key, error = %e, "failed to stage upload");
        }
        key
    }

    async fn release_upload(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            warn!(key = %key, error = %e, "failed to release staged upload");
        }
    }
}
