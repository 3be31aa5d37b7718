//! Model loader: TF-IDF vocabulary plus LinearSVC weights exported from
//! scikit-learn as a single JSON artifact.
//!
//! ```text
//! {
//!   "metadata": { "n_features": 500, "model_type": "TF-IDF + LinearSVC", ... },
//!   "tfidf": { "vocabulary": {"minecraft": 0, ...}, "idf": [...], "ngram_range": [1, 2] },
//!   "svm": { "coef": [[...], ...], "intercept": [...], "classes": ["education", ...] }
//! }
//! ```
//!
//! The artifact is checked for shape consistency before it is handed out; a
//! model that passes `Model::from_json` never indexes out of bounds at
//! inference time.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::BrainFilterError;
use crate::config::ModelConfig;
use crate::text::DEFAULT_NGRAM_RANGE;

pub const MODEL_FILENAME: &str = "model.json";

#[derive(Deserialize, Default)]
struct ExportedMetadata {
    n_features: Option<usize>,
    model_type: Option<String>,
}

#[derive(Deserialize)]
struct ExportedTfidf {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    ngram_range: [usize; 2],
    max_features: Option<usize>,
}

fn default_ngram_range() -> [usize; 2] {
    DEFAULT_NGRAM_RANGE
}

#[derive(Deserialize)]
struct ExportedSvm {
    coef: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    intercept: Vec<f64>,
    #[serde(default)]
    classes: Vec<String>,
    /// Present only in the old kernel-SVC export, which we cannot score.
    dual_coef: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ExportedModel {
    #[serde(default)]
    metadata: ExportedMetadata,
    tfidf: ExportedTfidf,
    svm: ExportedSvm,
}

/// Immutable, validated model ready for inference.
#[derive(Debug)]
pub struct Model {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    classes: Vec<String>,
    ngram_range: [usize; 2],
    model_type: Option<String>,
    max_features: Option<usize>,
    hash: String,
}

impl Model {
    /// Parse and validate a model artifact from raw JSON bytes.
    pub fn from_json(raw: &[u8]) -> Result<Self, BrainFilterError> {
        let hash = siphash_hex(raw);
        let exported: ExportedModel = serde_json::from_slice(raw)?;

        let coefficients = match exported.svm.coef {
            Some(coef) => coef,
            None if exported.svm.dual_coef.is_some() => {
                return Err(BrainFilterError::InvalidModel(
                    "kernel SVC export (support_vectors/dual_coef) is not supported; \
                     re-export a LinearSVC with svm.coef"
                        .into(),
                ));
            }
            None => return Err(BrainFilterError::InvalidModel("missing svm.coef".into())),
        };

        let model = Model {
            vocabulary: exported.tfidf.vocabulary,
            idf: exported.tfidf.idf,
            coefficients,
            intercepts: exported.svm.intercept,
            classes: exported.svm.classes,
            ngram_range: exported.tfidf.ngram_range,
            model_type: exported.metadata.model_type,
            max_features: exported.tfidf.max_features,
            hash,
        };
        model.validate(exported.metadata.n_features)?;
        Ok(model)
    }

    fn validate(&self, declared_features: Option<usize>) -> Result<(), BrainFilterError> {
        let invalid = |msg: String| Err(BrainFilterError::InvalidModel(msg));
        let n_features = self.vocabulary.len();

        if let Some(declared) = declared_features
            && declared != n_features
        {
            return invalid(format!(
                "metadata.n_features = {declared} but vocabulary has {n_features} entries"
            ));
        }
        if self.idf.len() != n_features {
            return invalid(format!(
                "idf has {} values, expected {n_features}",
                self.idf.len()
            ));
        }

        // Vocabulary values must be a permutation of 0..n_features.
        let mut seen = vec![false; n_features];
        for (token, &idx) in &self.vocabulary {
            if idx >= n_features {
                return invalid(format!(
                    "vocabulary index {idx} for {token:?} is out of range 0..{n_features}"
                ));
            }
            if std::mem::replace(&mut seen[idx], true) {
                return invalid(format!("vocabulary index {idx} is used more than once"));
            }
        }

        if self.classes.is_empty() {
            return invalid("svm.classes is empty".into());
        }
        if self.coefficients.len() != self.classes.len() {
            return invalid(format!(
                "svm.coef has {} rows for {} classes",
                self.coefficients.len(),
                self.classes.len()
            ));
        }
        if self.intercepts.len() != self.classes.len() {
            return invalid(format!(
                "svm.intercept has {} values for {} classes",
                self.intercepts.len(),
                self.classes.len()
            ));
        }
        for (class, row) in self.classes.iter().zip(&self.coefficients) {
            if row.len() != n_features {
                return invalid(format!(
                    "svm.coef row for {class:?} has {} values, expected {n_features}",
                    row.len()
                ));
            }
        }

        let [lo, hi] = self.ngram_range;
        if lo == 0 || lo > hi {
            return invalid(format!("tfidf.ngram_range [{lo}, {hi}] is not a valid range"));
        }

        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn coefficients(&self) -> &[Vec<f64>] {
        &self.coefficients
    }

    pub fn intercepts(&self) -> &[f64] {
        &self.intercepts
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn ngram_range(&self) -> [usize; 2] {
        self.ngram_range
    }

    pub fn model_type(&self) -> Option<&str> {
        self.model_type.as_deref()
    }

    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    /// SipHash fingerprint of the artifact bytes this model was parsed from.
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

/// Compute a SipHash fingerprint of raw bytes, returned as 16-char hex string.
pub(crate) fn siphash_hex(data: &[u8]) -> String {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::hash::DefaultHasher::new();
    data.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Where the artifact comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    File(PathBuf),
    Url(String),
}

impl ModelSource {
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            ModelSource::Url(s.to_string())
        } else {
            ModelSource::File(PathBuf::from(s))
        }
    }

    /// Read the raw artifact bytes. One attempt, no retry.
    pub fn fetch(&self, timeout: Duration) -> Result<Vec<u8>, BrainFilterError> {
        match self {
            ModelSource::File(path) => Ok(std::fs::read(path)?),
            ModelSource::Url(url) => {
                let agent = ureq::Agent::new_with_config(
                    ureq::config::Config::builder()
                        .timeout_global(Some(timeout))
                        .build(),
                );
                let bytes = agent.get(url.as_str()).call()?.body_mut().read_to_vec()?;
                Ok(bytes)
            }
        }
    }
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::File(path) => write!(f, "{}", path.display()),
            ModelSource::Url(url) => f.write_str(url),
        }
    }
}

/// Fetch and parse a model.
pub fn load(source: &ModelSource, timeout: Duration) -> Result<Model, BrainFilterError> {
    let raw = source.fetch(timeout)?;
    Model::from_json(&raw)
}

fn brainfilter_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".brainfilter"))
}

/// Pick the model source: explicit argument, then config, then the first
/// existing file among `~/.brainfilter/model.json` and `./model.json`.
pub fn resolve_source(explicit: Option<&str>, config: &ModelConfig) -> ModelSource {
    if let Some(s) = explicit.or(config.source.as_deref()) {
        return ModelSource::parse(s);
    }

    let candidates = [
        brainfilter_dir().map(|d| d.join(MODEL_FILENAME)),
        Some(PathBuf::from(MODEL_FILENAME)),
    ];
    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return ModelSource::File(candidate);
        }
    }

    // Fallback; loading will fail and the engine stays not-ready
    ModelSource::File(PathBuf::from(MODEL_FILENAME))
}


#[cfg(test)]
mod tests {
    use super::fixtures::{sample_json, sample_model};
    use super::*;

    fn parse(value: &serde_json::Value) -> Result<Model, BrainFilterError> {
        Model::from_json(&serde_json::to_vec(value).unwrap())
    }

    fn assert_invalid(value: &serde_json::Value, needle: &str) {
        match parse(value) {
            Err(BrainFilterError::InvalidModel(msg)) => {
                assert!(msg.contains(needle), "{msg:?} should mention {needle:?}")
            }
            other => panic!("expected InvalidModel, got {other:?}"),
        }
    }

    #[test]
    fn parses_sample_model() {
        let model = sample_model();
        assert_eq!(model.n_features(), 5);
        assert_eq!(model.n_classes(), 3);
        assert_eq!(model.classes(), ["education", "jeux", "sport"]);
        assert_eq!(model.ngram_range(), [1, 2]);
        assert_eq!(model.model_type(), Some("TF-IDF + LinearSVC"));
        assert_eq!(model.max_features(), Some(500));
        assert_eq!(model.vocabulary()["minecraft gameplay"], 4);
        assert_eq!(model.hash().len(), 16);
    }

    #[test]
    fn metadata_and_ngram_range_are_optional() {
        let mut value = sample_json();
        value.as_object_mut().unwrap().remove("metadata");
        value["tfidf"].as_object_mut().unwrap().remove("ngram_range");
        let model = parse(&value).unwrap();
        assert_eq!(model.ngram_range(), DEFAULT_NGRAM_RANGE);
        assert_eq!(model.model_type(), None);
    }

    #[test]
    fn hash_tracks_artifact_bytes() {
        let a = siphash_hex(b"{\"a\":1}");
        let b = siphash_hex(b"{\"a\":2}");
        assert_ne!(a, b);
        assert_eq!(a, siphash_hex(b"{\"a\":1}"));
    }

    #[test]
    fn rejects_declared_feature_mismatch() {
        let mut value = sample_json();
        value["metadata"]["n_features"] = 6.into();
        assert_invalid(&value, "metadata.n_features");
    }

    #[test]
    fn rejects_short_idf() {
        let mut value = sample_json();
        value["tfidf"]["idf"] = serde_json::json!([1.0, 1.0]);
        assert_invalid(&value, "idf");
    }

    #[test]
    fn rejects_sparse_vocabulary_indices() {
        let mut value = sample_json();
        value["tfidf"]["vocabulary"]["squat"] = 9.into();
        assert_invalid(&value, "out of range");
    }

    #[test]
    fn rejects_duplicate_vocabulary_indices() {
        let mut value = sample_json();
        value["tfidf"]["vocabulary"]["squat"] = 0.into();
        assert_invalid(&value, "more than once");
    }

    #[test]
    fn rejects_coef_row_length_mismatch() {
        let mut value = sample_json();
        value["svm"]["coef"][1] = serde_json::json!([1.0, 2.0]);
        assert_invalid(&value, "\"jeux\"");
    }

    #[test]
    fn rejects_class_count_mismatch() {
        let mut value = sample_json();
        value["svm"]["intercept"] = serde_json::json!([0.0, 0.0]);
        assert_invalid(&value, "svm.intercept");

        let mut value = sample_json();
        value["svm"]["classes"] = serde_json::json!(["a", "b"]);
        assert_invalid(&value, "svm.coef has 3 rows for 2 classes");
    }

    #[test]
    fn rejects_empty_classes() {
        let mut value = sample_json();
        value["svm"] = serde_json::json!({ "coef": [], "intercept": [], "classes": [] });
        assert_invalid(&value, "empty");
    }

    #[test]
    fn rejects_bad_ngram_range() {
        let mut value = sample_json();
        value["tfidf"]["ngram_range"] = serde_json::json!([2, 1]);
        assert_invalid(&value, "ngram_range");
    }

    #[test]
    fn rejects_kernel_svc_export() {
        let mut value = sample_json();
        value["svm"] = serde_json::json!({
            "support_vectors": [[0.0, 1.0]],
            "dual_coef": [[0.5]],
            "intercept": [0.1],
            "classes": ["a", "b"]
        });
        assert_invalid(&value, "kernel SVC");
    }

    #[test]
    fn malformed_json_is_a_load_failure() {
        let err = Model::from_json(b"{not json").unwrap_err();
        assert!(matches!(err, BrainFilterError::Json(_)));
        assert!(err.is_load_failure());
    }

    #[test]
    fn missing_file_is_a_load_failure() {
        let source = ModelSource::File(PathBuf::from("/nonexistent/brainfilter/model.json"));
        let err = load(&source, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, BrainFilterError::Io(_)));
        assert!(err.is_load_failure());
    }

    #[test]
    fn source_parse() {
        assert_eq!(
            ModelSource::parse("https://example.com/model.json"),
            ModelSource::Url("https://example.com/model.json".into())
        );
        assert_eq!(
            ModelSource::parse("models/model.json"),
            ModelSource::File(PathBuf::from("models/model.json"))
        );
    }

    #[test]
    fn explicit_source_wins_over_config() {
        let config = ModelConfig {
            source: Some("/etc/brainfilter/model.json".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_source(Some("/tmp/other.json"), &config),
            ModelSource::File(PathBuf::from("/tmp/other.json"))
        );
        assert_eq!(
            resolve_source(None, &config),
            ModelSource::File(PathBuf::from("/etc/brainfilter/model.json"))
        );
    }
}
