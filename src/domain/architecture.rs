// ============================================================
// Layer 3: Architecture Selector
// ============================================================
// The closed set of backbones the trainer knows how to build.
// Construction lives in the ml layer; this enum only names the
// variant and carries the facts the rest of the app needs
// (input resolution, artifact prefix).

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    ResNet18,
    ResNet34,
    DenseNet121,
    DenseNet169,
}

impl Architecture {
    pub const ALL: [Architecture; 4] = [
        Architecture::ResNet18,
        Architecture::ResNet34,
        Architecture::DenseNet121,
        Architecture::DenseNet169,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::ResNet18 => "resnet18",
            Architecture::ResNet34 => "resnet34",
            Architecture::DenseNet121 => "densenet121",
            Architecture::DenseNet169 => "densenet169",
        }
    }

    /// Square input resolution expected by the pretrained backbone
    pub fn input_size(&self) -> usize {
        224
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        match Architecture::ALL.iter().find(|a| a.as_str() == lower) {
            Some(a) => Ok(*a),
            None => bail!(
                "invalid model name '{s}' (expected one of resnet18, resnet34, densenet121, densenet169)"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_variant() {
        for arch in Architecture::ALL {
            assert_eq!(arch.as_str().parse::<Architecture>().unwrap(), arch);
        }
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        assert!("vgg16".parse::<Architecture>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Architecture::DenseNet169).unwrap();
        assert_eq!(json, "\"densenet169\"");
    }
}
