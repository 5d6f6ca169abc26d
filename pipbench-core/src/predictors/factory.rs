//! Predictor registry: converts a `PredictorConfig` into a boxed predictor.

use super::{
    Bollinger, DoNothing, FixedTarget, Predictor, PredictorContext, RandomDirection, RandomWalk,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry keys, in documentation order.
pub const PREDICTOR_TYPES: [&str; 5] = ["do_nothing", "random", "static", "random_walk", "bollinger"];

/// Name and numeric parameters of a predictor.
///
/// `BTreeMap` keeps parameter order stable in serialized output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    #[serde(rename = "type")]
    pub predictor_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl PredictorConfig {
    pub fn new(predictor_type: impl Into<String>) -> Self {
        Self {
            predictor_type: predictor_type.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: f64) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("unknown predictor type: {0}")]
    UnknownPredictor(String),
    #[error("predictor {predictor}: parameter {name} = {value} is out of range")]
    BadParam {
        predictor: String,
        name: String,
        value: f64,
    },
}

pub fn is_known_predictor(name: &str) -> bool {
    PREDICTOR_TYPES.contains(&name)
}

fn param(config: &PredictorConfig, name: &str, default: f64) -> Result<f64, FactoryError> {
    let value = config.params.get(name).copied().unwrap_or(default);
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FactoryError::BadParam {
            predictor: config.predictor_type.clone(),
            name: name.to_string(),
            value,
        })
    }
}

fn param_usize(config: &PredictorConfig, name: &str, default: usize) -> Result<usize, FactoryError> {
    let value = param(config, name, default as f64)?;
    Ok(value as usize)
}

/// Build a predictor for one period.
pub fn create_predictor(
    config: &PredictorConfig,
    ctx: PredictorContext,
) -> Result<Box<dyn Predictor>, FactoryError> {
    match config.predictor_type.as_str() {
        "do_nothing" => Ok(Box::new(DoNothing)),
        "random" => Ok(Box::new(RandomDirection::new(ctx.rng))),
        "static" => {
            let pips = param(config, "take_profit_pips", 100.0)?;
            Ok(Box::new(FixedTarget::new(pips)))
        }
        "random_walk" => Ok(Box::new(RandomWalk)),
        "bollinger" => {
            let window = param_usize(config, "window", 500)?;
            let multiplier = param(config, "multiplier", 1.0)?;
            let pips = param(config, "take_profit_pips", 100.0)?;
            Ok(Box::new(Bollinger::new(window, multiplier, pips)))
        }
        other => Err(FactoryError::UnknownPredictor(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PeriodId;
    use crate::lock::ResourceLock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ctx() -> PredictorContext {
        PredictorContext {
            period_id: PeriodId(0),
            rng: StdRng::seed_from_u64(1),
            lock: ResourceLock::new(),
        }
    }

    #[test]
    fn every_registered_type_builds() {
        for name in PREDICTOR_TYPES {
            let predictor = create_predictor(&PredictorConfig::new(name), ctx()).unwrap();
            assert_eq!(predictor.name(), name);
            assert!(is_known_predictor(name));
        }
    }

    #[test]
    fn unknown_type_is_an_error() {
        let err = create_predictor(&PredictorConfig::new("oracle"), ctx()).err();
        assert_eq!(err, Some(FactoryError::UnknownPredictor("oracle".into())));
        assert!(!is_known_predictor("oracle"));
    }

    #[test]
    fn bad_params_are_rejected() {
        let config = PredictorConfig::new("bollinger").with_param("window", -3.0);
        assert!(matches!(
            create_predictor(&config, ctx()),
            Err(FactoryError::BadParam { .. })
        ));
    }

    #[test]
    fn config_reads_type_key() {
        let config: PredictorConfig =
            serde_json::from_str(r#"{"type":"static","params":{"take_profit_pips":50.0}}"#).unwrap();
        assert_eq!(config.predictor_type, "static");
        assert_eq!(config.params.get("take_profit_pips"), Some(&50.0));
    }
}
