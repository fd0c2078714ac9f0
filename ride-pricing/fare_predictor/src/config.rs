use anyhow::{Context, Result};
use fare_features::{CoordinateCheck, FeatureSchema, PricingProfile, SurgePolicy, Variant};
use serde::Deserialize;
use std::{fs, net::SocketAddr, path::PathBuf};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub meta_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub variant: String,
    pub surge_alpha: Option<f64>,
    pub coordinate_check: String,
    /// Explicit column list; defaults to the variant's schema.
    pub features: Option<Vec<String>>,
    pub log_predictions: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.json"),
            meta_path: PathBuf::from("meta.json"),
            host: "0.0.0.0".to_string(),
            port: 8000,
            variant: Variant::Surge.to_string(),
            surge_alpha: None,
            coordinate_check: "enforce".to_string(),
            features: None,
            log_predictions: false,
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("config file not found at {}", path))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path))
    }

    /// `FARE_CONFIG` file (if set), then individual env var overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match std::env::var("FARE_CONFIG") {
            Ok(path) => Self::load(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("MODEL_PATH") {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("META_PATH") {
            self.meta_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("HOST") {
            self.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.port = v.parse().with_context(|| format!("PORT must be a number, got {v:?}"))?;
        }
        if let Some(v) = lookup("FARE_VARIANT") {
            self.variant = v;
        }
        if let Some(v) = lookup("SURGE_ALPHA") {
            let alpha = v
                .parse()
                .with_context(|| format!("SURGE_ALPHA must be a number, got {v:?}"))?;
            self.surge_alpha = Some(alpha);
        }
        if let Some(v) = lookup("COORDINATE_CHECK") {
            self.coordinate_check = v;
        }
        if let Some(v) = lookup("LOG_PRED") {
            self.log_predictions = v == "1";
        }
        Ok(())
    }

    pub fn variant(&self) -> Result<Variant> {
        Ok(self.variant.parse()?)
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid HOST:PORT {}:{}", self.host, self.port))
    }

    /// Pricing profile this deployment runs with; fails on any inconsistency.
    pub fn profile(&self) -> Result<PricingProfile> {
        let variant = self.variant()?;
        let check: CoordinateCheck = self.coordinate_check.parse()?;
        let mut profile = PricingProfile::for_variant(variant).with_coordinate_check(check);

        if let Some(names) = &self.features {
            profile = profile.with_schema(FeatureSchema::from_names(names)?)?;
        }
        if let Some(alpha) = self.surge_alpha {
            profile = profile.with_surge(SurgePolicy::with_alpha(alpha)?)?;
        }
        profile.validate()?;
        Ok(profile)
    }
}
