//! Learned value surrogate: approximates the explicit value sum in O(1) per
//! candidate instead of O(targets). The artifact (regression network, label
//! embedding, feature scaler) is produced by the offline trainer and consumed
//! here as an opaque, immutable triple. A missing artifact is a normal state:
//! the engine falls back to explicit summation.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL_PATH: &str = "cache/value_predictor_model.json";

#[derive(Debug)]
pub enum PredictorError {
    /// Prediction requested without a loaded model artifact.
    NotInitialized,
    /// Label has no entry in the embedding table.
    UnknownLabel(String),
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for PredictorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "value predictor model is not initialized"),
            Self::UnknownLabel(label) => write!(f, "no embedding for label {label:?}"),
            Self::Io(err) => write!(f, "predictor io error: {err}"),
            Self::Serde(err) => write!(f, "predictor serialization error: {err}"),
        }
    }
}

impl std::error::Error for PredictorError {}

impl From<std::io::Error> for PredictorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for PredictorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

/// One fully-connected layer: `weights[out][in]` and one bias per output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl DenseLayer {
    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| {
                row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias
            })
            .collect()
    }
}

/// Feed-forward regression network: ReLU hidden layers, identity output.
/// The final layer has width one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlpRegressor {
    pub layers: Vec<DenseLayer>,
}

impl MlpRegressor {
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn forward(&self, features: &[f64]) -> f64 {
        let last = self.layers.len().saturating_sub(1);
        let mut activations = features.to_vec();
        for (i, layer) in self.layers.iter().enumerate() {
            activations = layer.forward(&activations);
            if i < last {
                for a in &mut activations {
                    *a = a.max(0.0);
                }
            }
        }
        activations.first().copied().unwrap_or(0.0)
    }
}

/// Per-feature standardization fitted by the trainer: `(x - mean) / std`.
/// The same transform must be applied at inference as at training time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl FeatureScaler {
    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        if self.mean.is_empty() {
            return features.to_vec();
        }
        features
            .iter()
            .enumerate()
            .map(|(i, x)| {
                let mean = self.mean.get(i).copied().unwrap_or(0.0);
                let std = self.std.get(i).copied().unwrap_or(1.0).max(1e-8);
                (x - mean) / std
            })
            .collect()
    }
}

/// The opaque artifact triple produced by the offline trainer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictorArtifact {
    pub model: MlpRegressor,
    /// Sector label -> fixed-width embedding vector (one-hot at training time).
    pub label_embedding: HashMap<String, Vec<f64>>,
    pub scaler: FeatureScaler,
}

#[derive(Debug, Clone)]
pub struct ValuePredictor {
    artifact: PredictorArtifact,
    path: PathBuf,
}

impl ValuePredictor {
    /// Load the artifact from `path`. A missing or unreadable file yields an
    /// uninitialized predictor, never an error.
    pub fn load(path: &Path) -> Self {
        let artifact = fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        let predictor = Self {
            artifact,
            path: path.to_path_buf(),
        };
        if !predictor.is_initialized() {
            println!("value predictor model not found, falling back to explicit summation");
        }
        predictor
    }

    pub fn from_artifact(artifact: PredictorArtifact, path: &Path) -> Self {
        Self {
            artifact,
            path: path.to_path_buf(),
        }
    }

    /// True only when a non-empty model artifact is loaded.
    pub fn is_initialized(&self) -> bool {
        !self.artifact.model.is_empty()
    }

    fn feature_vector(&self, lat: f64, lon: f64, label: &str) -> Result<Vec<f64>, PredictorError> {
        let embedded = self
            .artifact
            .label_embedding
            .get(label)
            .ok_or_else(|| PredictorError::UnknownLabel(label.to_string()))?;
        let mut features = vec![lat, lon];
        features.extend_from_slice(embedded);
        Ok(features)
    }

    /// Predict the value at one location for one sector label.
    pub fn predict_single(&self, lat: f64, lon: f64, label: &str) -> Result<f64, PredictorError> {
        if !self.is_initialized() {
            return Err(PredictorError::NotInitialized);
        }
        let features = self.feature_vector(lat, lon, label)?;
        let scaled = self.artifact.scaler.transform(&features);
        Ok(self.artifact.model.forward(&scaled))
    }

    pub fn predict(&self, batch: &[(f64, f64, String)]) -> Result<Vec<f64>, PredictorError> {
        batch
            .iter()
            .map(|(lat, lon, label)| self.predict_single(*lat, *lon, label))
            .collect()
    }

    /// Install a freshly trained artifact and persist it. Offline-trainer
    /// entry point; never called from the live recommendation path.
    pub fn initialize(
        &mut self,
        model: MlpRegressor,
        label_embedding: HashMap<String, Vec<f64>>,
        scaler: FeatureScaler,
    ) -> Result<(), PredictorError> {
        self.artifact = PredictorArtifact {
            model,
            label_embedding,
            scaler,
        };
        self.save()
    }

    pub fn save(&self) -> Result<(), PredictorError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(&self.artifact)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single linear layer computing 2*lat + lon with identity scaling.
    fn linear_artifact() -> PredictorArtifact {
        PredictorArtifact {
            model: MlpRegressor {
                layers: vec![DenseLayer {
                    weights: vec![vec![2.0, 1.0, 0.0]],
                    biases: vec![0.5],
                }],
            },
            label_embedding: HashMap::from([("Steel".to_string(), vec![1.0])]),
            scaler: FeatureScaler::default(),
        }
    }

    #[test]
    fn missing_artifact_file_is_uninitialized() {
        let predictor = ValuePredictor::load(Path::new("/nonexistent/model.json"));
        assert!(!predictor.is_initialized());
        assert!(matches!(
            predictor.predict_single(50.0, 10.0, "Steel"),
            Err(PredictorError::NotInitialized)
        ));
    }

    #[test]
    fn linear_model_predicts_expected_value() {
        let predictor =
            ValuePredictor::from_artifact(linear_artifact(), Path::new("/tmp/unused.json"));
        assert!(predictor.is_initialized());
        let y = predictor.predict_single(50.0, 10.0, "Steel").unwrap();
        assert!((y - 110.5).abs() < 1e-12);
    }

    #[test]
    fn unknown_label_is_an_error() {
        let predictor =
            ValuePredictor::from_artifact(linear_artifact(), Path::new("/tmp/unused.json"));
        assert!(matches!(
            predictor.predict_single(50.0, 10.0, "Retail"),
            Err(PredictorError::UnknownLabel(_))
        ));
    }

    #[test]
    fn relu_clips_hidden_layers_only() {
        // Hidden layer outputs -1 (clipped to 0) and 3; output layer sums.
        let model = MlpRegressor {
            layers: vec![
                DenseLayer {
                    weights: vec![vec![1.0], vec![3.0]],
                    biases: vec![-2.0, 0.0],
                },
                DenseLayer {
                    weights: vec![vec![1.0, 1.0]],
                    biases: vec![-10.0],
                },
            ],
        };
        // Input 1.0: hidden = [max(-1, 0), max(3, 0)] = [0, 3]; out = 3 - 10.
        assert!((model.forward(&[1.0]) - (-7.0)).abs() < 1e-12);
    }

    #[test]
    fn scaler_standardizes_features() {
        let scaler = FeatureScaler {
            mean: vec![10.0, 0.0],
            std: vec![2.0, 1.0],
        };
        let scaled = scaler.transform(&[14.0, 3.0]);
        assert_eq!(scaled, vec![2.0, 3.0]);
    }

    #[test]
    fn initialize_persists_and_reloads() {
        let dir = std::env::temp_dir().join(format!("standort-predictor-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("value_predictor_model.json");

        let mut predictor = ValuePredictor::load(&path);
        assert!(!predictor.is_initialized());
        let artifact = linear_artifact();
        predictor
            .initialize(artifact.model, artifact.label_embedding, artifact.scaler)
            .unwrap();

        let reloaded = ValuePredictor::load(&path);
        assert!(reloaded.is_initialized());
        let y = reloaded.predict_single(50.0, 10.0, "Steel").unwrap();
        assert!((y - 110.5).abs() < 1e-12);
        let _ = fs::remove_dir_all(&dir);
    }
}
