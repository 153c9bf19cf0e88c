use serde::{Serialize, Serializer};

use crate::types::Message;

/// Success rate every session starts with
pub const INITIAL_SUCCESS_RATE: u32 = 100;
/// Penalty for an answer that came back without any sources
pub const EMPTY_RESULT_PENALTY: u32 = 5;
/// Penalty for a request that failed outright
pub const FAILURE_PENALTY: u32 = 10;

/// Running aggregates over one session's question/answer exchanges.
///
/// Averages are derived from exact running sums, so after any number of
/// exchanges `avg_confidence` equals the rounded mean of every recorded
/// confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    questions_asked: u32,
    sources_retrieved: u32,
    avg_confidence: u32,
    #[serde(serialize_with = "two_decimals")]
    avg_response_time: f64,
    success_rate: u32,
    #[serde(skip)]
    confidence_sum: u64,
    #[serde(skip)]
    response_time_sum: f64,
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self {
            questions_asked: 0,
            sources_retrieved: 0,
            avg_confidence: 0,
            avg_response_time: 0.0,
            success_rate: INITIAL_SUCCESS_RATE,
            confidence_sum: 0,
            response_time_sum: 0.0,
        }
    }
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}

/// Round to the 2 decimals a response time is displayed with
pub fn round_seconds(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 100.0).round() / 100.0
    } else {
        0.0
    }
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one exchange into the aggregates.
    ///
    /// A failed exchange only costs success rate: there is no response, so
    /// counts and averages stay as they were.
    pub fn record(
        &mut self,
        source_count: usize,
        response_time_secs: f64,
        confidence: u32,
        succeeded: bool,
    ) {
        if !succeeded {
            self.penalize(FAILURE_PENALTY);
            return;
        }

        self.questions_asked += 1;
        self.sources_retrieved = self
            .sources_retrieved
            .saturating_add(u32::try_from(source_count).unwrap_or(u32::MAX));

        self.confidence_sum += u64::from(confidence);
        self.avg_confidence =
            (self.confidence_sum as f64 / f64::from(self.questions_asked)).round() as u32;

        self.response_time_sum += round_seconds(response_time_secs);
        self.avg_response_time =
            round_seconds(self.response_time_sum / f64::from(self.questions_asked));

        if source_count == 0 {
            self.penalize(EMPTY_RESULT_PENALTY);
        }
    }

    pub fn record_answer(&mut self, source_count: usize, response_time_secs: f64, confidence: u32) {
        self.record(source_count, response_time_secs, confidence, true);
    }

    pub fn record_failure(&mut self) {
        self.record(0, 0.0, 0, false);
    }

    fn penalize(&mut self, points: u32) {
        self.success_rate = self.success_rate.saturating_sub(points);
    }

    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    pub fn sources_retrieved(&self) -> u32 {
        self.sources_retrieved
    }

    pub fn avg_confidence(&self) -> u32 {
        self.avg_confidence
    }

    pub fn avg_response_time(&self) -> f64 {
        self.avg_response_time
    }

    /// Average response time as displayed, e.g. "1.25"
    pub fn avg_response_time_display(&self) -> String {
        format!("{:.2}", self.avg_response_time)
    }

    pub fn success_rate(&self) -> u32 {
        self.success_rate
    }
}

/// One labelled point of a per-answer chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub name: String,
    pub value: f64,
}

/// Confidence of every assistant turn that has a non-zero score, labelled Q1..Qn
pub fn confidence_series(messages: &[Message]) -> Vec<SeriesPoint> {
    label_series(
        messages
            .iter()
            .filter(|m| !m.is_user)
            .filter_map(|m| m.confidence)
            .filter(|c| *c > 0)
            .map(f64::from),
    )
}

/// Response time of every assistant turn that took a measurable time
pub fn response_time_series(messages: &[Message]) -> Vec<SeriesPoint> {
    label_series(
        messages
            .iter()
            .filter(|m| !m.is_user)
            .filter_map(|m| m.response_time)
            .filter(|t| *t > 0.0),
    )
}

fn label_series(values: impl Iterator<Item = f64>) -> Vec<SeriesPoint> {
    values
        .enumerate()
        .map(|(i, value)| SeriesPoint {
            name: format!("Q{}", i + 1),
            value,
        })
        .collect()
}
