//! Advisory service: asks an LLM for a short pedagogic analysis of the
//! current grades plus actionable study tips.
//!
//! This is an opaque, fire-and-forget boundary as far as the core is
//! concerned: the call returns either a success payload or a uniform error
//! payload. It never panics, never propagates an error to the caller, and
//! the caller never blocks anything else on it.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{Bimester, YearRecord};
use crate::services::averaging::DerivedAverages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceStatus {
    Success,
    Error,
}

/// What the advisory boundary hands back, success or not.
#[derive(Debug, Clone)]
pub struct Advice {
    pub message: String,
    pub tips: Vec<String>,
    pub status: AdviceStatus,
}

impl Advice {
    fn error(message: impl Into<String>) -> Self {
        Advice {
            message: message.into(),
            tips: Vec::new(),
            status: AdviceStatus::Error,
        }
    }
}

/// Expected JSON shape of the model's answer.
#[derive(Debug, Deserialize)]
struct AdvicePayload {
    analysis: String,
    #[serde(default)]
    tips: Vec<String>,
}

pub struct AdvisorService {
    client: Client<OpenAIConfig>,
    model_name: String,
    has_key: bool,
}

impl AdvisorService {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            has_key: !config.llm_api_key.is_empty(),
        }
    }

    /// Analyzes one subject's year. Always returns a payload; failures of
    /// any kind collapse into the uniform error variant.
    pub async fn analyze(
        &self,
        subject: &str,
        record: &YearRecord,
        derived: &DerivedAverages,
    ) -> Advice {
        if !self.has_key {
            return Advice::error(
                "Chave de API não configurada. Não é possível gerar dicas de IA.",
            );
        }

        match self.try_analyze(subject, record, derived).await {
            Ok(advice) => advice,
            Err(e) => {
                warn!("análise de IA falhou: {}", e);
                Advice::error(
                    "Desculpe, ocorreu um erro ao analisar suas notas. Tente novamente mais tarde.",
                )
            }
        }
    }

    async fn try_analyze(
        &self,
        subject: &str,
        record: &YearRecord,
        derived: &DerivedAverages,
    ) -> Result<Advice> {
        let prompt = build_prompt(subject, record, derived);
        debug!("consultando {} ({} caracteres)", self.model_name, prompt.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(
                "Atue como um conselheiro pedagógico escolar experiente e motivador \
                 para um aluno brasileiro. Responda EXCLUSIVAMENTE em JSON no formato \
                 {\"analysis\": \"string\", \"tips\": [\"string\"]}.",
            )
            .build()?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.3)
            .max_tokens(1024u32)
            .build()?;

        let response = self.client.chat().create(request).await?;
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("resposta vazia do modelo"))?;

        let payload: AdvicePayload = serde_json::from_str(strip_code_fences(&content))?;
        Ok(Advice {
            message: payload.analysis,
            tips: payload.tips,
            status: AdviceStatus::Success,
        })
    }
}

/// Builds the Portuguese counseling prompt from the raw scores and the
/// derived averages.
fn build_prompt(subject: &str, record: &YearRecord, derived: &DerivedAverages) -> String {
    let fmt_raw = |v: Option<&String>| -> String {
        match v {
            Some(s) if !s.is_empty() => s.clone(),
            _ => "-".to_string(),
        }
    };
    let fmt_avg = |v: Option<f64>| -> String {
        v.map(|a| format!("{:.1}", a)).unwrap_or_else(|| "-".to_string())
    };

    let mut lines = String::new();
    for b in Bimester::ALL {
        let score = record.bimester(b);
        lines.push_str(&format!(
            "Bimestre {}: TM={}, TB={}, TD={} (Média: {})\n",
            b.ordinal(),
            fmt_raw(score.monthly_test.as_ref()),
            fmt_raw(score.bimester_test.as_ref()),
            fmt_raw(score.various_work.as_ref()),
            fmt_avg(derived.bimester(b)),
        ));
    }

    format!(
        "O sistema de notas é:\n\
         - 4 Bimestres (B1, B2, B3, B4).\n\
         - Cada bimestre tem 3 notas: TM (Teste Mensal), TB (Teste Bimestral), TD (Trabalhos/Diversos).\n\
         - A média para passar é 7.0.\n\n\
         Aqui estão os dados do aluno na matéria {}:\n\n\
         {}\n\
         Média Final Atual: {}\n\n\
         Por favor, forneça:\n\
         1. Uma breve análise geral do desempenho (máximo 2 frases).\n\
         2. Uma lista de 3 a 4 dicas práticas e acionáveis para o aluno melhorar ou manter \
         as notas. Se o aluno estiver reprovando, diga exatamente quanto falta para passar.",
        subject,
        lines,
        fmt_avg(derived.final_average),
    )
}

/// Models often wrap JSON in markdown fences; strip them before parsing.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}
