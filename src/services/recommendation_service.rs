use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::LlmError;
use crate::services::llm_service::LlmService;

/// What came back from a recommendation request.
///
/// A reply that is not usable JSON is still returned to the caller,
/// together with the raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecommendationOutcome {
    Parsed(Value),
    Unparsed { error: String, raw_response: String },
}

pub fn build_prompt(stocks: &[String]) -> String {
    let listed = stocks
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"I have investments in the following stocks: {listed}.

Please analyze these stocks and recommend alternative stocks in similar sectors that
might perform better. For each recommendation:

1. Identify the sector of my current stock
2. Recommend 1-2 alternative stocks in the same sector with potentially better performance
3. Provide a brief rationale for why these alternatives might outperform my current holdings
4. Include relevant financial metrics comparison

Format your response as JSON with the following structure:
{{
    "recommendations": [
        {{
            "original_stock": "stock_name",
            "sector": "sector_name",
            "alternatives": [
                {{
                    "symbol": "alt_symbol",
                    "name": "alt_name",
                    "rationale": "brief_rationale",
                    "key_metrics": {{
                        "metric1": "value",
                        "metric2": "value"
                    }}
                }}
            ]
        }}
    ]
}}"#
    )
}

/// Parses the text between the first `{` and the last `}` of a reply
pub fn parse_recommendations(reply: &str) -> RecommendationOutcome {
    let span = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if end > start => &reply[start..=end],
        _ => {
            return RecommendationOutcome::Unparsed {
                error: "Could not extract JSON from response".to_string(),
                raw_response: reply.to_string(),
            }
        }
    };

    match serde_json::from_str(span) {
        Ok(value) => RecommendationOutcome::Parsed(value),
        Err(e) => {
            warn!("Recommendation reply was not valid JSON: {}", e);
            RecommendationOutcome::Unparsed {
                error: "Invalid JSON response from Gemini".to_string(),
                raw_response: reply.to_string(),
            }
        }
    }
}

pub async fn recommend_alternatives(llm: &LlmService, stocks: &[String]) -> Result<RecommendationOutcome, LlmError> {
    info!("Requesting alternatives for {} holdings", stocks.len());
    let reply = llm.complete(&build_prompt(stocks)).await?;
    Ok(parse_recommendations(&reply))
}
