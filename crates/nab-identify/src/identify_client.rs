//! HTTP client for the species identification service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::{IdentifyError, SpeciesIdentifier, SpeciesPrediction};

#[derive(Debug, Deserialize)]
struct IdentifyResponseBody {
    #[serde(default)]
    predictions: Vec<SpeciesPrediction>,
}

/// Reqwest-backed identifier with a bounded request timeout.
#[derive(Debug, Clone)]
pub struct HttpSpeciesIdentifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSpeciesIdentifier {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, IdentifyError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|error| IdentifyError::Transport(error.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SpeciesIdentifier for HttpSpeciesIdentifier {
    async fn identify(&self, image_url: &str) -> Result<Vec<SpeciesPrediction>, IdentifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "image_url": image_url }))
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    IdentifyError::Timeout
                } else {
                    IdentifyError::Transport(error.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(IdentifyError::Service {
                status: status.as_u16(),
                detail,
            });
        }

        let body = response
            .json::<IdentifyResponseBody>()
            .await
            .map_err(|error| IdentifyError::MalformedResponse(error.to_string()))?;

        for prediction in &body.predictions {
            if !prediction.confidence.is_finite()
                || !(0.0..=100.0).contains(&prediction.confidence)
            {
                return Err(IdentifyError::MalformedResponse(format!(
                    "confidence {} for label '{}' is outside [0, 100]",
                    prediction.confidence, prediction.label
                )));
            }
        }
        Ok(body.predictions)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::Method::POST;
    use httpmock::MockServer;

    use super::*;

    #[tokio::test]
    async fn functional_identify_parses_ordered_predictions() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/identify")
                .json_body_includes(r#"{"image_url":"https://cdn.example/a.png"}"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"predictions":[{"label":"Pikachu","confidence":45.0},{"label":"Raichu","confidence":72.3}]}"#);
        });

        let identifier = HttpSpeciesIdentifier::new(server.url("/identify"), Duration::from_secs(5))
            .expect("client");
        let predictions = identifier
            .identify("https://cdn.example/a.png")
            .await
            .expect("identify");

        mock.assert();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].label, "Pikachu");
        assert_eq!(predictions[1].confidence, 72.3);
    }

    #[tokio::test]
    async fn unit_identify_maps_service_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/identify");
            then.status(503).body("overloaded");
        });

        let identifier = HttpSpeciesIdentifier::new(server.url("/identify"), Duration::from_secs(5))
            .expect("client");
        let error = identifier
            .identify("https://cdn.example/a.png")
            .await
            .expect_err("503 should fail");
        match error {
            IdentifyError::Service { status, detail } => {
                assert_eq!(status, 503);
                assert_eq!(detail, "overloaded");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn regression_identify_rejects_out_of_range_confidence() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/identify");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"predictions":[{"label":"Glitch","confidence":250.0}]}"#);
        });

        let identifier = HttpSpeciesIdentifier::new(server.url("/identify"), Duration::from_secs(5))
            .expect("client");
        let error = identifier
            .identify("https://cdn.example/a.png")
            .await
            .expect_err("bad confidence should fail");
        assert!(matches!(error, IdentifyError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn regression_identify_accepts_empty_prediction_list() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/identify");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"predictions":[]}"#);
        });

        let identifier = HttpSpeciesIdentifier::new(server.url("/identify"), Duration::from_secs(5))
            .expect("client");
        let predictions = identifier
            .identify("https://cdn.example/a.png")
            .await
            .expect("empty list is a valid service answer");
        assert!(predictions.is_empty());
    }
}
