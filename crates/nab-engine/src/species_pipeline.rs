//! Species resolution pipeline for spawn events.
//!
//! Every step is a failure point and every failure is local: the outcome is
//! reported back to the session loop, which counts and logs it without ever
//! aborting the session or retrying the event.

use std::time::Duration;

use rand::seq::SliceRandom;

use nab_gateway::IncomingMessage;
use nab_identify::{SpeciesIdentifier, SpeciesPrediction};
use nab_species::SpeciesIndex;

/// Strict lower bound a best prediction must exceed before a dispatch.
pub const CATCH_CONFIDENCE_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
/// Result of one pipeline run over a spawn event.
pub enum SpawnOutcome {
    /// Resolution succeeded; hand `name` to the response dispatcher.
    Dispatch { name: String },
    /// The spawn embed carried no image URL; dropped silently.
    MalformedEvent,
    /// The identify call failed or timed out; event abandoned, no retry.
    IdentifyFailed { detail: String },
    /// Best prediction did not clear the threshold; deliberate no-op.
    LowConfidence { label: String, confidence: f64 },
}

/// Picks the maximum-confidence prediction, ties going to first occurrence.
pub fn best_prediction(predictions: &[SpeciesPrediction]) -> Option<&SpeciesPrediction> {
    let mut best: Option<&SpeciesPrediction> = None;
    for prediction in predictions {
        let replace = match best {
            None => true,
            Some(current) => prediction.confidence > current.confidence,
        };
        if replace {
            best = Some(prediction);
        }
    }
    best
}

/// Resolves a display name for `label` within the session's languages.
///
/// Multiple localized matches are picked among uniformly at random; no match
/// falls back to the lower-cased original label.
pub fn pick_localized_name(index: &SpeciesIndex, label: &str, languages: &[String]) -> String {
    let candidates = index.localized_names(label, languages);
    candidates
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| label.to_lowercase())
}

/// Runs the full pipeline for one spawn event.
pub async fn resolve_spawn(
    message: &IncomingMessage,
    identifier: &dyn SpeciesIdentifier,
    identify_timeout: Duration,
    species: &SpeciesIndex,
    languages: &[String],
) -> SpawnOutcome {
    let Some(image_url) = message
        .embeds
        .first()
        .and_then(|embed| embed.image_url.as_deref())
    else {
        return SpawnOutcome::MalformedEvent;
    };

    let predictions = match tokio::time::timeout(identify_timeout, identifier.identify(image_url)).await
    {
        Err(_) => {
            return SpawnOutcome::IdentifyFailed {
                detail: format!(
                    "identify call exceeded {}ms deadline",
                    identify_timeout.as_millis()
                ),
            }
        }
        Ok(Err(error)) => {
            return SpawnOutcome::IdentifyFailed {
                detail: error.to_string(),
            }
        }
        Ok(Ok(predictions)) => predictions,
    };

    let Some(best) = best_prediction(&predictions) else {
        return SpawnOutcome::IdentifyFailed {
            detail: "identifier returned no predictions".to_string(),
        };
    };

    if best.confidence <= CATCH_CONFIDENCE_THRESHOLD {
        return SpawnOutcome::LowConfidence {
            label: best.label.clone(),
            confidence: best.confidence,
        };
    }

    SpawnOutcome::Dispatch {
        name: pick_localized_name(species, &best.label, languages),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use nab_gateway::MessageEmbed;
    use nab_identify::IdentifyError;
    use nab_species::{AlternateName, SpeciesRecord};

    use super::*;

    struct StaticIdentifier {
        predictions: Vec<SpeciesPrediction>,
    }

    #[async_trait]
    impl SpeciesIdentifier for StaticIdentifier {
        async fn identify(
            &self,
            _image_url: &str,
        ) -> Result<Vec<SpeciesPrediction>, IdentifyError> {
            Ok(self.predictions.clone())
        }
    }

    struct FailingIdentifier;

    #[async_trait]
    impl SpeciesIdentifier for FailingIdentifier {
        async fn identify(
            &self,
            _image_url: &str,
        ) -> Result<Vec<SpeciesPrediction>, IdentifyError> {
            Err(IdentifyError::Transport("connection reset".to_string()))
        }
    }

    fn prediction(label: &str, confidence: f64) -> SpeciesPrediction {
        SpeciesPrediction {
            label: label.to_string(),
            confidence,
        }
    }

    fn spawn_message(image_url: Option<&str>) -> IncomingMessage {
        IncomingMessage {
            schema_version: 1,
            author_id: 716390085896962058,
            channel_id: 123,
            content: String::new(),
            embeds: vec![MessageEmbed {
                title: "A wild pokémon has appeared!".to_string(),
                image_url: image_url.map(str::to_string),
                description: String::new(),
            }],
        }
    }

    fn empty_index() -> SpeciesIndex {
        SpeciesIndex::from_records(Vec::new()).expect("empty index")
    }

    fn english() -> Vec<String> {
        vec!["english".to_string()]
    }

    #[test]
    fn unit_best_prediction_takes_maximum_confidence() {
        let predictions = vec![prediction("Pikachu", 45.0), prediction("Raichu", 72.3)];
        let best = best_prediction(&predictions).expect("best");
        assert_eq!(best.label, "Raichu");
    }

    #[test]
    fn unit_best_prediction_breaks_ties_by_first_occurrence() {
        let predictions = vec![prediction("Plusle", 70.0), prediction("Minun", 70.0)];
        let best = best_prediction(&predictions).expect("best");
        assert_eq!(best.label, "Plusle");
    }

    #[tokio::test]
    async fn functional_pipeline_dispatches_best_prediction_above_threshold() {
        let identifier = StaticIdentifier {
            predictions: vec![prediction("Pikachu", 45.0), prediction("Raichu", 72.3)],
        };
        let outcome = resolve_spawn(
            &spawn_message(Some("https://cdn.example/a.png")),
            &identifier,
            Duration::from_secs(1),
            &empty_index(),
            &english(),
        )
        .await;
        assert_eq!(
            outcome,
            SpawnOutcome::Dispatch {
                name: "raichu".to_string()
            }
        );
    }

    #[tokio::test]
    async fn regression_confidence_exactly_at_threshold_aborts() {
        let identifier = StaticIdentifier {
            predictions: vec![prediction("Raichu", 60.0)],
        };
        let outcome = resolve_spawn(
            &spawn_message(Some("https://cdn.example/a.png")),
            &identifier,
            Duration::from_secs(1),
            &empty_index(),
            &english(),
        )
        .await;
        assert_eq!(
            outcome,
            SpawnOutcome::LowConfidence {
                label: "Raichu".to_string(),
                confidence: 60.0
            }
        );
    }

    #[tokio::test]
    async fn regression_confidence_just_above_threshold_proceeds() {
        let identifier = StaticIdentifier {
            predictions: vec![prediction("Raichu", 60.01)],
        };
        let outcome = resolve_spawn(
            &spawn_message(Some("https://cdn.example/a.png")),
            &identifier,
            Duration::from_secs(1),
            &empty_index(),
            &english(),
        )
        .await;
        assert!(matches!(outcome, SpawnOutcome::Dispatch { .. }));
    }

    #[tokio::test]
    async fn unit_pipeline_reports_malformed_event_without_image_url() {
        let identifier = StaticIdentifier {
            predictions: vec![prediction("Raichu", 99.0)],
        };
        let outcome = resolve_spawn(
            &spawn_message(None),
            &identifier,
            Duration::from_secs(1),
            &empty_index(),
            &english(),
        )
        .await;
        assert_eq!(outcome, SpawnOutcome::MalformedEvent);
    }

    #[tokio::test]
    async fn unit_pipeline_abandons_event_on_identify_failure() {
        let outcome = resolve_spawn(
            &spawn_message(Some("https://cdn.example/a.png")),
            &FailingIdentifier,
            Duration::from_secs(1),
            &empty_index(),
            &english(),
        )
        .await;
        match outcome {
            SpawnOutcome::IdentifyFailed { detail } => {
                assert!(detail.contains("connection reset"));
            }
            other => panic!("expected identify failure, got {other:?}"),
        }
    }

    #[test]
    fn unit_localized_name_falls_back_to_lowercased_label() {
        let index = SpeciesIndex::from_records(vec![SpeciesRecord {
            name: "Bulbasaur".to_string(),
            altnames: vec![AlternateName {
                language: "German".to_string(),
                name: "Bisasam".to_string(),
            }],
        }])
        .expect("index");
        let name = pick_localized_name(&index, "Bulbasaur", &["french".to_string()]);
        assert_eq!(name, "bulbasaur");
    }

    #[test]
    fn functional_localized_name_picks_among_language_matches() {
        let index = SpeciesIndex::from_records(vec![SpeciesRecord {
            name: "Eevee".to_string(),
            altnames: vec![
                AlternateName {
                    language: "Japanese".to_string(),
                    name: "Eievui".to_string(),
                },
                AlternateName {
                    language: "French".to_string(),
                    name: "Evoli".to_string(),
                },
            ],
        }])
        .expect("index");
        let languages = vec!["japanese".to_string(), "french".to_string()];
        for _ in 0..16 {
            let name = pick_localized_name(&index, "eevee", &languages);
            assert!(name == "eievui" || name == "evoli", "unexpected name {name}");
        }
    }
}
