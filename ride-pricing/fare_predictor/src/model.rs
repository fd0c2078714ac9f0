use anyhow::{bail, Context, Result};
use fare_features::model::ensure_dimension;
use fare_features::{ConfigurationError, FareModel, FeatureVector, ModelError, ModelMeta};
use serde::Deserialize;
use std::{fmt, fs, path::Path, sync::Arc};

/// Load `meta.json` plus the model it describes.
///
/// The backend is picked from the model file extension: `.json` is a tree
/// ensemble, `.pt`/`.ts` a TorchScript module (needs the `torch` feature).
pub fn load(model_path: &Path, meta_path: &Path) -> Result<(Arc<dyn FareModel>, ModelMeta)> {
    let meta_txt = fs::read_to_string(meta_path).map_err(|e| artifact_error(meta_path, e))?;
    let meta: ModelMeta =
        serde_json::from_str(&meta_txt).map_err(|e| artifact_error(meta_path, e))?;
    let in_dim = meta.in_dim();
    if in_dim != meta.feat_list.len() {
        bail!(artifact_error(
            meta_path,
            format!(
                "in_dim ({}) != feat_list.len() ({})",
                in_dim,
                meta.feat_list.len()
            )
        ));
    }

    let ext = model_path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let model: Arc<dyn FareModel> = match ext {
        "json" => {
            let txt = fs::read_to_string(model_path).map_err(|e| artifact_error(model_path, e))?;
            let ensemble = TreeEnsemble::from_json(&txt, in_dim)
                .map_err(|e| artifact_error(model_path, format!("{e:#}")))?;
            Arc::new(ensemble)
        }
        #[cfg(feature = "torch")]
        "pt" | "ts" => Arc::new(
            torch::TorchRegressor::load(model_path, in_dim)
                .map_err(|e| artifact_error(model_path, format!("{e:#}")))?,
        ),
        #[cfg(not(feature = "torch"))]
        "pt" | "ts" => bail!(artifact_error(
            model_path,
            "TorchScript models need the `torch` feature"
        )),
        other => bail!(artifact_error(
            model_path,
            format!("unsupported model format {other:?}")
        )),
    };

    Ok((model, meta))
}

/// Missing, unreadable or malformed artifacts all surface as one config error.
fn artifact_error(path: &Path, reason: impl fmt::Display) -> ConfigurationError {
    ConfigurationError::ModelArtifact {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

// ---------- Gradient-boosted trees ----------

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Deserialize, Debug)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn score(&self, x: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Leaf { leaf } => return *leaf,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => i = if x[*feature] < *threshold { *left } else { *right },
            }
        }
    }
}

#[derive(Deserialize)]
struct EnsembleJson {
    #[serde(default)]
    base_score: f64,
    trees: Vec<Tree>,
}

/// Regression tree ensemble: `base_score + sum(tree leaves)`.
///
/// A split sends a row left when `x[feature] < threshold`. Children must
/// sit after their parent in `nodes`, which rules out cycles.
#[derive(Debug)]
pub struct TreeEnsemble {
    base_score: f64,
    trees: Vec<Tree>,
    in_dim: usize,
}

impl TreeEnsemble {
    pub fn from_json(txt: &str, in_dim: usize) -> Result<Self> {
        let raw: EnsembleJson = serde_json::from_str(txt).context("malformed ensemble JSON")?;
        if raw.trees.is_empty() {
            bail!("ensemble has no trees");
        }
        for (t, tree) in raw.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                bail!("tree {t} has no nodes");
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                if let Node::Split {
                    feature,
                    left,
                    right,
                    threshold,
                } = node
                {
                    if *feature >= in_dim {
                        bail!("tree {t} node {i}: feature {feature} >= in_dim {in_dim}");
                    }
                    if !threshold.is_finite() {
                        bail!("tree {t} node {i}: non-finite threshold");
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= tree.nodes.len() {
                            bail!("tree {t} node {i}: bad child index {child}");
                        }
                    }
                }
            }
        }
        Ok(Self {
            base_score: raw.base_score,
            trees: raw.trees,
            in_dim,
        })
    }

}

impl FareModel for TreeEnsemble {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        ensure_dimension(features, self.in_dim)?;
        let x = features.values();
        Ok(self.base_score + self.trees.iter().map(|t| t.score(x)).sum::<f64>())
    }

    fn name(&self) -> &str {
        "tree-ensemble"
    }
}

// ---------- TorchScript ----------

#[cfg(feature = "torch")]
mod torch {
    use anyhow::{bail, Context, Result};
    use fare_features::model::ensure_dimension;
    use fare_features::{FareModel, FeatureVector, ModelError};
    use std::path::Path;
    use tch::{kind::Kind, CModule, Device, Tensor};

    /// TorchScript module mapping `[1, in_dim]` f32 to one fare.
    pub struct TorchRegressor {
        model: CModule,
        device: Device,
        in_dim: usize,
    }

    impl TorchRegressor {
        pub fn load(path: &Path, in_dim: usize) -> Result<Self> {
            let device = Device::Cpu;
            let model = CModule::load_on_device(path, device)
                .with_context(|| format!("failed to load TorchScript {}", path.display()))?;

            // Probe output shape with a dummy forward; expect a single scalar
            let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
            let t = model.forward_ts(&[dummy])?;
            if t.numel() != 1 {
                bail!("unexpected model output size: {:?}", t.size());
            }

            Ok(Self {
                model,
                device,
                in_dim,
            })
        }
    }

    impl FareModel for TorchRegressor {
        fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
            ensure_dimension(features, self.in_dim)?;
            let input = Tensor::from_slice(&features.to_f32())
                .reshape([1, self.in_dim as i64])
                .to_device(self.device);
            let out = self
                .model
                .forward_ts(&[input])
                .map_err(|e| ModelError::Backend(e.to_string()))?;
            if out.numel() != 1 {
                return Err(ModelError::Backend(format!(
                    "unexpected model output size: {:?}",
                    out.size()
                )));
            }
            Ok(out.reshape([-1]).double_value(&[0]))
        }

        fn name(&self) -> &str {
            "torchscript"
        }
    }
}
