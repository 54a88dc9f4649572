//! Deficiency extraction from medical report text.
//!
//! The LLM response is untrusted: the analyzer decodes the first embedded
//! JSON block into an explicit schema with per-field defaults, and degrades
//! to a keyword line scan when no usable block is present. It never errors:
//! downstream sizing and generation always receive some list, possibly
//! empty.

use serde::Deserialize;
use std::str::FromStr;

use crate::llm::{extract_json_block, LlmClient};
use crate::models::{Deficiency, MedicalReport, Severity};

/// Keywords marking a line as deficiency-related in the degraded scan.
const FALLBACK_KEYWORDS: &[&str] = &["deficiency", "low", "high", "border"];

/// Wire schema of the `{ "deficiencies": [...] }` block.
#[derive(Debug, Deserialize)]
struct DeficiencyResponse {
    #[serde(default)]
    deficiencies: Vec<RawDeficiency>,
}

#[derive(Debug, Deserialize)]
struct RawDeficiency {
    #[serde(default)]
    name: String,
    #[serde(default)]
    current_value: String,
    #[serde(default)]
    normal_range: String,
    #[serde(default = "default_severity")]
    severity: String,
    #[serde(default)]
    is_border_value: bool,
}

fn default_severity() -> String {
    "medium".to_string()
}

/// Analyzes report text into a deficiency list.
pub struct ReportAnalyzer<C: LlmClient> {
    client: C,
}

impl<C: LlmClient> ReportAnalyzer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Extract deficiencies from raw report text. Never fails: generation
    /// errors and malformed output both land in the keyword fallback.
    pub fn analyze(&self, raw_text: &str) -> Vec<Deficiency> {
        let prompt = build_analysis_prompt(raw_text);

        let response = match self.client.generate(&prompt) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Deficiency analysis generation failed");
                String::new()
            }
        };

        let deficiencies = parse_deficiency_response(&response);
        tracing::info!(count = deficiencies.len(), "Report analysis complete");
        deficiencies
    }

    /// Analyze text and assemble the persisted report snapshot.
    pub fn analyze_report(
        &self,
        user_id: &str,
        source_file: &str,
        raw_text: &str,
    ) -> MedicalReport {
        let mut report = MedicalReport::new(user_id, source_file);
        report.deficiencies = self.analyze(raw_text);
        report
    }
}

fn build_analysis_prompt(report_content: &str) -> String {
    format!(
        "Analyze this medical report and identify all deficiencies and border values:\n\
         {report_content}\n\n\
         For each deficiency found, provide:\n\
         - Name of the deficiency\n\
         - Current value\n\
         - Normal range\n\
         - Severity (low, medium, high)\n\
         - Whether it's a border value (true/false)\n\n\
         Format as JSON:\n\
         {{\n\
             \"deficiencies\": [\n\
                 {{\n\
                     \"name\": \"Vitamin D\",\n\
                     \"current_value\": \"15 ng/mL\",\n\
                     \"normal_range\": \"30-100 ng/mL\",\n\
                     \"severity\": \"medium\",\n\
                     \"is_border_value\": false\n\
                 }}\n\
             ]\n\
         }}"
    )
}

/// Decode the structured block, or fall back to the line scan.
fn parse_deficiency_response(response: &str) -> Vec<Deficiency> {
    let decoded = extract_json_block(response)
        .and_then(|block| {
            serde_json::from_str::<DeficiencyResponse>(block)
                .map_err(|e| crate::llm::LlmError::JsonParsing(e.to_string()))
        });

    match decoded {
        Ok(parsed) => parsed
            .deficiencies
            .into_iter()
            .map(|raw| Deficiency {
                name: raw.name,
                current_value: raw.current_value,
                normal_range: raw.normal_range,
                severity: Severity::from_str(&raw.severity).unwrap_or(Severity::Medium),
                is_border_value: raw.is_border_value,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Structured deficiency block unusable, using line scan");
            fallback_parse(response)
        }
    }
}

/// Degraded extraction: scan lines shaped like `Name: value` that contain a
/// deficiency keyword. Severity comes from low/high keywords, the border
/// flag from "border"; the normal range is unknowable here and left empty.
fn fallback_parse(response: &str) -> Vec<Deficiency> {
    let mut deficiencies = Vec::new();

    for line in response.lines() {
        let lower = line.to_lowercase();
        if !line.contains(':') || !FALLBACK_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }

        let mut parts = line.splitn(2, ':');
        let name = parts.next().unwrap_or("").trim().to_string();
        let value = parts.next().unwrap_or("").trim().to_string();

        let severity = if lower.contains("low") {
            Severity::Low
        } else if lower.contains("high") {
            Severity::High
        } else {
            Severity::Medium
        };

        deficiencies.push(Deficiency {
            name,
            current_value: value,
            normal_range: String::new(),
            severity,
            is_border_value: lower.contains("border"),
        });
    }

    deficiencies
}
