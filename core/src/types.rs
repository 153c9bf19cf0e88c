use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Current time as the RFC 3339 string stored on messages and threads.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Three-level classification derived from a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `< 50` is High, `50..80` Medium, `>= 80` Low.
    pub fn from_confidence(confidence: u32) -> Self {
        if confidence < 50 {
            RiskLevel::High
        } else if confidence < 80 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document metadata attached to a retrieved excerpt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Any other keys the backend attaches, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A retrieved document excerpt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub content: String,
    #[serde(default)]
    pub metadata: SourceMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
}

impl Source {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.similarity_score = Some(score);
        self
    }

    pub fn with_document(mut self, name: impl Into<String>, page: Option<i64>) -> Self {
        self.metadata.source = Some(name.into());
        self.metadata.page = page;
        self
    }

    /// Document name, or "Unknown" when the backend did not say
    pub fn document_name(&self) -> &str {
        self.metadata.source.as_deref().unwrap_or("Unknown")
    }
}

/// A medicine mentioned in an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    pub usage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A doctor or facility near a searched location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub name: String,
    pub specialization: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Request body for `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub query: String,
}

/// Response body of `POST /chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<Source>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub medicines: Vec<Medicine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialist_type: Option<String>,
}

/// Request body for `POST /doctors`
#[derive(Debug, Clone, Serialize)]
pub struct DoctorRequest {
    pub query: String,
    pub location: String,
}

/// Response body of `POST /doctors`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorSearch {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub doctors: Vec<Doctor>,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub location: String,
}

/// Response body of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// One entry of `GET /documents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentList {
    #[serde(default)]
    pub documents: Vec<DocumentInfo>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    #[serde(rename = "isUser")]
    pub is_user: bool,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medicines: Vec<Medicine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u32>,
    #[serde(
        rename = "responseTime",
        default,
        skip_serializing_if = "Option::is_none",
        with = "seconds"
    )]
    pub response_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: true,
            timestamp: now_timestamp(),
            sources: Vec::new(),
            medicines: Vec::new(),
            confidence: None,
            response_time: None,
            risk: None,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        sources: Vec<Source>,
        medicines: Vec<Medicine>,
        confidence: u32,
        response_time: f64,
    ) -> Self {
        Self {
            content: content.into(),
            is_user: false,
            timestamp: now_timestamp(),
            sources,
            medicines,
            confidence: Some(confidence),
            response_time: Some(response_time),
            risk: None,
        }
    }

    pub fn with_risk(mut self, risk: Option<RiskLevel>) -> Self {
        self.risk = risk;
        self
    }
}

/// `responseTime` is written as a 2-decimal string; older documents may
/// hold a bare number.
mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(secs) => serializer.serialize_str(&format!("{:.2}", secs)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Repr::Number(n)) => Ok(Some(n)),
            Some(Repr::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
