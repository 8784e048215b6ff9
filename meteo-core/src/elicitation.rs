//! The host capability "present options, await a structured answer".

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::error::Result;

/// A prompt shown to the user together with the JSON schema its answer must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElicitationRequest {
    pub message: String,
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElicitationOutcome {
    /// The user answered; the payload may still be absent.
    Accept(Option<Value>),
    Decline,
    Cancel,
}

/// Answer to a location disambiguation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LocationChoice {
    /// 1-based position in the list of offered locations.
    #[serde(deserialize_with = "position")]
    #[schemars(with = "i64")]
    pub selected_location_id: i64,
}

// Hosts may forward integral floats (`2.0`) or numeric strings (`"2"`).
fn position<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let position = match &value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    position.ok_or_else(|| de::Error::custom(format!("expected a whole-number position, got {value}")))
}

impl LocationChoice {
    pub fn schema() -> Value {
        serde_json::to_value(schemars::schema_for!(LocationChoice)).unwrap_or(Value::Null)
    }
}

/// Host side of the elicitation exchange.
///
/// Implementations may suspend for as long as the user needs; the resolver imposes no
/// deadline.
#[async_trait]
pub trait Elicitor: Send + Sync {
    async fn elicit(&self, request: ElicitationRequest) -> Result<ElicitationOutcome>;
}

/// Answers every prompt with the same outcome. Used for non-interactive hosts.
#[derive(Debug, Clone)]
pub struct FixedElicitor(pub ElicitationOutcome);

impl FixedElicitor {
    pub fn choose(position: i64) -> Self {
        Self(ElicitationOutcome::Accept(Some(serde_json::json!({
            "selected_location_id": position
        }))))
    }

    pub fn decline() -> Self {
        Self(ElicitationOutcome::Decline)
    }
}

#[async_trait]
impl Elicitor for FixedElicitor {
    async fn elicit(&self, _request: ElicitationRequest) -> Result<ElicitationOutcome> {
        Ok(self.0.clone())
    }
}
