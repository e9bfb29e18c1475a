//! Client for the remote prediction endpoint. The model itself is opaque:
//! one POST per request, `{task, input}` in, `{result}` or `{error}` out.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RampError, Result};

const ENDPOINT_PATH: &str = "unified-ml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionTask {
    Fraud,
    Spend,
}

impl PredictionTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fraud => "fraud",
            Self::Spend => "spend",
        }
    }
}

impl fmt::Display for PredictionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FraudFeatures {
    pub amount: f64,
    pub hour: u32,
    pub mcc: u32,
    pub zip: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendFeatures {
    pub age: u32,
    pub income: f64,
    pub avg_monthly_spend: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionRequest {
    Fraud(FraudFeatures),
    Spend(SpendFeatures),
}

impl PredictionRequest {
    pub fn task(&self) -> PredictionTask {
        match self {
            Self::Fraud(_) => PredictionTask::Fraud,
            Self::Spend(_) => PredictionTask::Spend,
        }
    }

    /// Reject inputs the endpoint could only answer with garbage.
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(RampError::Prediction(msg));
        match self {
            Self::Fraud(f) => {
                if !f.amount.is_finite() {
                    return bad(format!("amount must be a number, got {}", f.amount));
                }
                if f.hour > 23 {
                    return bad(format!("hour must be 0-23, got {}", f.hour));
                }
            }
            Self::Spend(s) => {
                if !s.income.is_finite() || !s.avg_monthly_spend.is_finite() {
                    return bad("income and spend must be numbers".to_string());
                }
            }
        }
        Ok(())
    }

    pub fn body(&self) -> Result<Value> {
        let input = match self {
            Self::Fraud(f) => serde_json::to_value(f)?,
            Self::Spend(s) => serde_json::to_value(s)?,
        };
        Ok(serde_json::json!({ "task": self.task().as_str(), "input": input }))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FraudPrediction {
    pub fraud_probability: f64,
    pub fraud_label: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpendPrediction {
    pub predicted_spending: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Fraud(FraudPrediction),
    Spend(SpendPrediction),
}

/// Requests reach a predictor already validated.
pub trait Predictor {
    fn predict(&self, request: &PredictionRequest) -> Result<Prediction>;
}

/// Interpret an endpoint reply. `ok` is whether the HTTP status was 2xx.
pub fn parse_response(task: PredictionTask, ok: bool, body: &str) -> Result<Prediction> {
    let data: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    if !ok {
        let msg = data
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("endpoint returned an error");
        return Err(RampError::Prediction(msg.to_string()));
    }
    let result = data
        .get("result")
        .cloned()
        .ok_or_else(|| RampError::Prediction("response has no result".to_string()))?;

    match task {
        PredictionTask::Fraud => {
            let p: FraudPrediction = serde_json::from_value(result)?;
            if !(0.0..=1.0).contains(&p.fraud_probability) {
                return Err(RampError::Prediction(format!(
                    "fraud probability {} outside [0, 1]",
                    p.fraud_probability
                )));
            }
            if p.fraud_label > 1 {
                return Err(RampError::Prediction(format!(
                    "fraud label {} is not 0 or 1",
                    p.fraud_label
                )));
            }
            Ok(Prediction::Fraud(p))
        }
        PredictionTask::Spend => {
            let p: SpendPrediction = serde_json::from_value(result)?;
            if !p.predicted_spending.is_finite() {
                return Err(RampError::Prediction("predicted spending is not a number".to_string()));
            }
            Ok(Prediction::Spend(p))
        }
    }
}

pub struct HttpPredictor {
    client: reqwest::blocking::Client,
    endpoint: reqwest::Url,
    api_key: String,
}

impl HttpPredictor {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = reqwest::Url::parse(&base)
            .and_then(|u| u.join(ENDPOINT_PATH))
            .map_err(|e| RampError::Settings(format!("invalid prediction url {base_url:?}: {e}")))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

impl Predictor for HttpPredictor {
    fn predict(&self, request: &PredictionRequest) -> Result<Prediction> {
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| RampError::Settings(format!("invalid api key: {e}")))?;
        log::debug!("POST {} task={}", self.endpoint, request.task());
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, auth)
            .json(&request.body()?)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        log::debug!("prediction endpoint answered {status}");
        parse_response(request.task(), status.is_success(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let req = PredictionRequest::Fraud(FraudFeatures {
            amount: 120.5,
            hour: 14,
            mcc: 5311,
            zip: "73301".to_string(),
            method: "Swipe".to_string(),
        });
        let body = req.body().unwrap();
        assert_eq!(body["task"], "fraud");
        assert_eq!(body["input"]["mcc"], 5311);
        assert_eq!(body["input"]["zip"], "73301");
        assert_eq!(body["input"]["method"], "Swipe");
    }

    #[test]
    fn test_validate_rejects_bad_hour() {
        let req = PredictionRequest::Fraud(FraudFeatures {
            amount: 1.0,
            hour: 24,
            mcc: 5411,
            zip: String::new(),
            method: "Chip".to_string(),
        });
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_parse_fraud_result() {
        let body = r#"{"result": {"fraud_probability": 0.82, "fraud_label": 1}}"#;
        let p = parse_response(PredictionTask::Fraud, true, body).unwrap();
        assert_eq!(
            p,
            Prediction::Fraud(FraudPrediction {
                fraud_probability: 0.82,
                fraud_label: 1
            })
        );
    }

    #[test]
    fn test_parse_rejects_probability_out_of_range() {
        let body = r#"{"result": {"fraud_probability": 1.4, "fraud_label": 1}}"#;
        let err = parse_response(PredictionTask::Fraud, true, body).unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_parse_spend_result() {
        let body = r#"{"result": {"predicted_spending": 1834.25}}"#;
        let p = parse_response(PredictionTask::Spend, true, body).unwrap();
        assert_eq!(
            p,
            Prediction::Spend(SpendPrediction {
                predicted_spending: 1834.25
            })
        );
    }

    #[test]
    fn test_parse_error_surfaces_message() {
        let body = r#"{"error": "model not loaded"}"#;
        let err = parse_response(PredictionTask::Spend, false, body).unwrap_err();
        assert_eq!(err.to_string(), "Prediction failed: model not loaded");

        let err = parse_response(PredictionTask::Spend, false, "<html>").unwrap_err();
        assert_eq!(err.to_string(), "Prediction failed: endpoint returned an error");
    }

    #[test]
    fn test_parse_missing_result() {
        assert!(parse_response(PredictionTask::Fraud, true, "{}").is_err());
    }

    #[test]
    fn test_endpoint_join() {
        let p = HttpPredictor::new("https://example.com/functions/v1/", "k").unwrap();
        assert_eq!(p.endpoint().as_str(), "https://example.com/functions/v1/unified-ml");
        assert!(HttpPredictor::new("not a url", "k").is_err());
    }
}
