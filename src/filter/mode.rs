//! Inference mode dispatch.
//!
//! The filter supports exactly three processing strategies, selected by
//! a mode flag. The set is closed, so dispatch is a plain enum rather
//! than trait objects; no plugin-style extension exists.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

const SHARED_DIR: &str = "/usr/share/";

const DEFAULT_MODEL_POSENET: &str =
    "google-coral/project-posenet/posenet_mobilenet_v1_075_353_481_quant_decoder.tflite";
const DEFAULT_MODEL_MOBILENET_SSD: &str =
    "google-coral/examples-camera/mobilenet_ssd_v2_coco_quant_postprocess.tflite";
const DEFAULT_LABEL_MOBILENET_SSD: &str = "google-coral/examples-camera/coco_labels.txt";

fn shared_path(rel: &str) -> PathBuf {
    Path::new(SHARED_DIR).join(rel)
}

/// Which processing strategy the filter runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum InferenceMode {
    /// Pose estimation (keypoint overlay).
    #[default]
    Posenet,
    /// Object detection with labelled boxes.
    MobilenetSsd,
    /// Raw model benchmark, no drawing.
    Benchmark,
}

impl InferenceMode {
    /// Short name, matching the property string values.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Posenet => "posenet",
            Self::MobilenetSsd => "mobilenet-ssd",
            Self::Benchmark => "benchmark",
        }
    }
}

impl std::fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for InferenceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "posenet" => Ok(Self::Posenet),
            "mobilenet-ssd" => Ok(Self::MobilenetSsd),
            "benchmark" => Ok(Self::Benchmark),
            other => Err(Error::Config(format!("unknown inference mode `{other}`"))),
        }
    }
}

/// Class-id to name mapping loaded from a label file.
///
/// Each line is `<id><two spaces><name>`; lines without the separator
/// are ignored.
#[derive(Debug, Default, Clone)]
pub struct Labels {
    entries: Vec<(u32, String)>,
}

impl Labels {
    /// Load labels from a file.
    pub fn load(path: &Path) -> Result<Self> {
        trace!(path = %path.display(), "loading labels");
        let file = File::open(path)
            .map_err(|e| Error::ModelLoad(format!("failed to open {}: {e}", path.display())))?;
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let Some(pos) = line.find("  ") else {
                continue;
            };
            let (id, name) = line.split_at(pos);
            match id.parse::<u32>() {
                Ok(id) => entries.push((id, name[2..].to_string())),
                Err(_) => warn!("skipping malformed label line: {line}"),
            }
        }
        Ok(Self { entries })
    }

    /// Look up the name for a class id.
    pub fn get(&self, id: u32) -> Option<&str> {
        self.entries
            .iter()
            .find(|(i, _)| *i == id)
            .map(|(_, name)| name.as_str())
    }

    /// Number of known classes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no labels were loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A configured inference engine, one variant per mode.
#[derive(Debug)]
pub enum Engine {
    /// Pose estimation.
    Posenet {
        /// Model file in use.
        model: PathBuf,
    },
    /// Object detection.
    MobilenetSsd {
        /// Model file in use.
        model: PathBuf,
        /// Class-id to name mapping.
        labels: Labels,
    },
    /// Benchmark run.
    Benchmark {
        /// Model file in use.
        model: PathBuf,
    },
}

impl Engine {
    /// Build the engine for `mode`.
    ///
    /// `model` and `label` override the built-in defaults; benchmark
    /// mode has no default and requires an explicit model.
    pub fn new(mode: InferenceMode, model: Option<&Path>, label: Option<&Path>) -> Result<Self> {
        match mode {
            InferenceMode::Posenet => {
                let model = model
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| shared_path(DEFAULT_MODEL_POSENET));
                Ok(Self::Posenet { model })
            }
            InferenceMode::MobilenetSsd => {
                let model = model
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| shared_path(DEFAULT_MODEL_MOBILENET_SSD));
                let label_path = label
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| shared_path(DEFAULT_LABEL_MOBILENET_SSD));
                let labels = Labels::load(&label_path)?;
                Ok(Self::MobilenetSsd { model, labels })
            }
            InferenceMode::Benchmark => {
                let model = model.ok_or_else(|| {
                    Error::Config("benchmark mode requires an explicit model path".into())
                })?;
                Ok(Self::Benchmark {
                    model: model.to_path_buf(),
                })
            }
        }
    }

    /// The mode this engine implements.
    pub const fn mode(&self) -> InferenceMode {
        match self {
            Self::Posenet { .. } => InferenceMode::Posenet,
            Self::MobilenetSsd { .. } => InferenceMode::MobilenetSsd,
            Self::Benchmark { .. } => InferenceMode::Benchmark,
        }
    }

    /// Path of the model file in use.
    pub fn model_path(&self) -> &Path {
        match self {
            Self::Posenet { model }
            | Self::MobilenetSsd { model, .. }
            | Self::Benchmark { model } => model,
        }
    }
}
