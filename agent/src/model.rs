//! Hedge decision models

use serde::Deserialize;
use std::path::Path;

use crate::error::{AgentError, Result};

const INPUTS: usize = 2;
const HIDDEN: usize = 64;

pub trait DecisionModel: Send + Sync {
    /// true means hedge
    fn decide(&self, yield_rate: f64, volatility: f64) -> Result<bool>;

    fn name(&self) -> &'static str;
}

/// Rule the reference training data was labelled with
#[derive(Debug, Clone, Copy)]
pub struct RiskRuleModel {
    pub min_yield: f64,
    pub max_volatility: f64,
}

impl Default for RiskRuleModel {
    fn default() -> Self {
        Self {
            min_yield: 0.05,
            max_volatility: 0.30,
        }
    }
}

impl DecisionModel for RiskRuleModel {
    fn decide(&self, yield_rate: f64, volatility: f64) -> Result<bool> {
        Ok(yield_rate < self.min_yield || volatility > self.max_volatility)
    }

    fn name(&self) -> &'static str {
        "risk-rule"
    }
}

/// Raw layer weights as stored on disk
#[derive(Deserialize)]
struct MlpWeights {
    fc1_weight: Vec<Vec<f64>>,
    fc1_bias: Vec<f64>,
    fc2_weight: Vec<Vec<f64>>,
    fc2_bias: Vec<f64>,
}

/// 2 → 64 (ReLU) → 1 (sigmoid) network
///
/// Deserializing checks layer shapes, so a constructed model is always
/// well formed.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "MlpWeights")]
pub struct MlpModel {
    /// [HIDDEN][INPUTS]
    fc1_weight: Vec<Vec<f64>>,
    fc1_bias: Vec<f64>,
    /// [HIDDEN]
    fc2_weight: Vec<f64>,
    fc2_bias: f64,
}

impl TryFrom<MlpWeights> for MlpModel {
    type Error = AgentError;

    fn try_from(weights: MlpWeights) -> Result<Self> {
        let MlpWeights { fc1_weight, fc1_bias, fc2_weight, fc2_bias } = weights;

        let hidden_ok = fc1_weight.len() == HIDDEN
            && fc1_weight.iter().all(|row| row.len() == INPUTS)
            && fc1_bias.len() == HIDDEN;

        match (hidden_ok, <[Vec<f64>; 1]>::try_from(fc2_weight), fc2_bias.as_slice()) {
            (true, Ok([output]), &[bias]) if output.len() == HIDDEN => Ok(Self {
                fc1_weight,
                fc1_bias,
                fc2_weight: output,
                fc2_bias: bias,
            }),
            _ => Err(AgentError::Model(format!(
                "Expected {}x{} hidden and 1x{} output layers",
                HIDDEN, INPUTS, HIDDEN
            ))),
        }
    }
}

impl MlpModel {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AgentError::Model(format!("Invalid weights: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AgentError::Model(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Sigmoid output in (0, 1)
    pub fn score(&self, yield_rate: f64, volatility: f64) -> f64 {
        let input = [yield_rate, volatility];

        let logit = self
            .fc1_weight
            .iter()
            .zip(&self.fc1_bias)
            .map(|(row, bias)| {
                let z = row.iter().zip(&input).map(|(w, x)| w * x).sum::<f64>() + bias;
                z.max(0.0)
            })
            .zip(&self.fc2_weight)
            .map(|(h, w)| h * w)
            .sum::<f64>()
            + self.fc2_bias;

        1.0 / (1.0 + (-logit).exp())
    }
}

impl DecisionModel for MlpModel {
    fn decide(&self, yield_rate: f64, volatility: f64) -> Result<bool> {
        let score = self.score(yield_rate, volatility);
        if score.is_nan() {
            return Err(AgentError::Model("Network produced NaN".to_string()));
        }
        Ok(score > 0.5)
    }

    fn name(&self) -> &'static str {
        "mlp"
    }
}

/// Load MLP weights when a path is configured, otherwise the rule model
pub fn load_model(path: Option<&Path>) -> Result<Box<dyn DecisionModel>> {
    match path {
        Some(path) => {
            let model = MlpModel::load(path)?;
            tracing::info!(path = %path.display(), "Loaded MLP weights");
            Ok(Box::new(model))
        }
        None => {
            tracing::info!("No model weights configured, using risk rule");
            Ok(Box::new(RiskRuleModel::default()))
        }
    }
}
