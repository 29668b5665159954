use super::{client::LlmClient, extract::extract_first_json_object, prompt::build_prompt};
use crate::{
    error::{SeedError, SeedResult},
    fallback::FallbackGenerator,
    form::GenerationForm,
    record::{ClientRecord, GeneratedRecord},
    rng::SeedRng,
    types::{RecordSource, RiskLevel},
};
use std::sync::Arc;

/// Asks the model for one client and validates the answer. Never falls back
/// on its own; see `RecordGenerator`.
pub struct LlmRecordGenerator {
    client: Arc<dyn LlmClient>,
}

impl LlmRecordGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    pub async fn generate_client(
        &self,
        form: &GenerationForm,
        index: usize,
        risk_level: RiskLevel,
        jurisdictions: &[String],
    ) -> SeedResult<ClientRecord> {
        let prompt = build_prompt(form, index, risk_level, jurisdictions);
        let reply = self.client.complete(&prompt.system, &prompt.user).await?;
        parse_client_record(&reply, risk_level)
    }
}

/// Cut the first JSON object out of a model reply, deserialise and validate it.
pub fn parse_client_record(reply: &str, risk_level: RiskLevel) -> SeedResult<ClientRecord> {
    let json = extract_first_json_object(reply)
        .ok_or_else(|| SeedError::MalformedResponse("no JSON object in reply".into()))?;
    let record: ClientRecord = serde_json::from_str(json)
        .map_err(|e| SeedError::MalformedResponse(format!("reply does not match schema: {e}")))?;
    record.validate(risk_level)?;
    Ok(record)
}

/// LLM generation with deterministic fallback.
///
/// Without an LLM client every record comes from the fallback generator.
/// With one, any API, parse or validation failure is logged and recovered
/// by the fallback; errors never reach the caller.
pub struct RecordGenerator {
    llm: Option<LlmRecordGenerator>,
    fallback: FallbackGenerator,
}

impl RecordGenerator {
    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            llm: llm.map(LlmRecordGenerator::new),
            fallback: FallbackGenerator,
        }
    }

    /// Fallback-only generator.
    pub fn fallback_only() -> Self {
        Self::new(None)
    }

    pub fn uses_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn generate(
        &self,
        form: &GenerationForm,
        index: usize,
        risk_level: RiskLevel,
        jurisdictions: &[String],
        rng: &mut SeedRng,
    ) -> GeneratedRecord {
        if let Some(llm) = &self.llm {
            match llm.generate_client(form, index, risk_level, jurisdictions).await {
                Ok(record) => {
                    log::debug!(
                        "generator: client #{} from {} name={}",
                        index + 1,
                        llm.model_name(),
                        record.name
                    );
                    return GeneratedRecord {
                        record,
                        source: RecordSource::Llm,
                    };
                }
                Err(e) => {
                    log::warn!(
                        "generator: LLM generation failed for client #{}, using fallback: {e}",
                        index + 1
                    );
                }
            }
        }

        GeneratedRecord {
            record: self
                .fallback
                .fallback_client(form, index, risk_level, jurisdictions, rng),
            source: RecordSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_reply_without_json() {
        let err = parse_client_record("Sorry, I can't help with that.", RiskLevel::Low).unwrap_err();
        assert!(matches!(err, SeedError::MalformedResponse(_)));
    }

    #[test]
    fn rejects_json_missing_fields() {
        let err = parse_client_record(r#"{"name": "Half A Record"}"#, RiskLevel::Low).unwrap_err();
        assert!(matches!(err, SeedError::MalformedResponse(_)));
    }
}
