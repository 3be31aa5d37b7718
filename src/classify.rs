//! One-vs-rest linear decision function and the classifier engine.
//!
//! `score[i] = dot(coef[i], x) + intercept[i]`; the highest score wins and
//! ties go to the lowest class index.

use serde::Serialize;
use std::time::Duration;

use crate::BrainFilterError;
use crate::model::{self, Model, ModelSource};
use crate::vectorize::vectorize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassScore {
    pub category: String,
    pub score: f64,
}

/// Winning category, its decision score, and every class score in class order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub category: String,
    pub score: f64,
    pub all_scores: Vec<ClassScore>,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Decision scores for a precomputed document vector.
pub fn decision_scores(vector: &[f64], model: &Model) -> Vec<f64> {
    model
        .coefficients()
        .iter()
        .zip(model.intercepts())
        .map(|(coef, intercept)| dot(coef, vector) + intercept)
        .collect()
}

/// Index of the first maximal score. `None` only for an empty slice.
pub(crate) fn argmax(scores: &[f64]) -> Option<usize> {
    let (first, rest) = scores.split_first()?;
    let mut best = (0, *first);
    for (i, &score) in rest.iter().enumerate() {
        if score > best.1 {
            best = (i + 1, score);
        }
    }
    Some(best.0)
}

/// Classify a title against a loaded model.
pub fn predict(text: &str, model: &Model) -> Prediction {
    let vector = vectorize(text, model);
    let scores = decision_scores(&vector, model);
    // Validated models always carry at least one class
    let winner = argmax(&scores).unwrap_or(0);

    let all_scores: Vec<ClassScore> = model
        .classes()
        .iter()
        .zip(&scores)
        .map(|(category, &score)| ClassScore {
            category: category.clone(),
            score,
        })
        .collect();

    Prediction {
        category: model.classes()[winner].clone(),
        score: scores[winner],
        all_scores,
    }
}

/// Classifier engine: owns a model source and, once loaded, the model.
///
/// Construct one per process and pass it by reference. Loading takes
/// `&mut self`, so a single engine can never have two loads in flight.
pub struct Classifier {
    source: Option<ModelSource>,
    timeout: Duration,
    model: Option<Model>,
}

impl Classifier {
    pub fn new(source: ModelSource, timeout: Duration) -> Self {
        Self {
            source: Some(source),
            timeout,
            model: None,
        }
    }

    /// Engine that is ready from the start, for callers that already hold a
    /// model. It has no source, so `load` fails and the model stays as is.
    pub fn with_model(model: Model) -> Self {
        Self {
            source: None,
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
            model: Some(model),
        }
    }

    pub fn source(&self) -> Option<&ModelSource> {
        self.source.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Fetch and parse the model, replacing any previous one.
    ///
    /// On failure the error is logged and returned; an engine that was
    /// already ready keeps its previous model.
    pub fn load(&mut self) -> Result<&Model, BrainFilterError> {
        let Some(source) = &self.source else {
            return Err(BrainFilterError::Config(
                "classifier has no model source to load from".into(),
            ));
        };
        match model::load(source, self.timeout) {
            Ok(m) => {
                log::info!(
                    "loaded model from {source} ({} features, {} classes, hash {})",
                    m.n_features(),
                    m.n_classes(),
                    m.hash()
                );
                let m: &Model = self.model.insert(m);
                Ok(m)
            }
            Err(e) => {
                log::error!("failed to load model from {source}: {e}");
                Err(e)
            }
        }
    }

    /// Load on first use; later calls return the cached model.
    pub fn ensure_loaded(&mut self) -> Result<&Model, BrainFilterError> {
        if self.model.is_none() {
            return self.load();
        }
        self.model.as_ref().ok_or(BrainFilterError::NotReady)
    }

    /// Classify a title. Fails with `NotReady` until a load has succeeded.
    pub fn predict(&self, title: &str) -> Result<Prediction, BrainFilterError> {
        let model = self.model.as_ref().ok_or(BrainFilterError::NotReady)?;
        Ok(predict(title, model))
    }
}
