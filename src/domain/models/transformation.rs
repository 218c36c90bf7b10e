//! Transformation requests
//!
//! A closed set of variants, each with its own configuration. On the wire a
//! transformation is `{"name": <kind>, "config": {...}}`; decoding goes through
//! [`RawTransformation`] so unknown kinds and out-of-range configurations are
//! rejected instead of being carried around as loose JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::shared::errors::ValidationError;
use crate::shared::logging::log_unsupported_transformation;

/// Transformation discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformationKind {
    Resize,
    Grayscale,
    Trim,
    Blur,
    Rotate,
}

impl TransformationKind {
    pub const ALL: [TransformationKind; 5] = [
        TransformationKind::Resize,
        TransformationKind::Grayscale,
        TransformationKind::Trim,
        TransformationKind::Blur,
        TransformationKind::Rotate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformationKind::Resize => "resize",
            TransformationKind::Grayscale => "grayscale",
            TransformationKind::Trim => "trim",
            TransformationKind::Blur => "blur",
            TransformationKind::Rotate => "rotate",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TransformationKind::Resize => "Resize",
            TransformationKind::Grayscale => "Grayscale",
            TransformationKind::Trim => "Trim",
            TransformationKind::Blur => "Blur",
            TransformationKind::Rotate => "Rotate",
        }
    }
}

impl std::fmt::Display for TransformationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransformationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        TransformationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownTransformation(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeConfig {
    pub width: u32,
    pub height: u32,
}

/// Edge-detection threshold, 0-255
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimConfig {
    pub threshold: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurConfig {
    pub sigma: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateAngle {
    Deg90,
    Deg180,
    Deg270,
}

impl RotateAngle {
    pub fn degrees(&self) -> u16 {
        match self {
            RotateAngle::Deg90 => 90,
            RotateAngle::Deg180 => 180,
            RotateAngle::Deg270 => 270,
        }
    }
}

impl TryFrom<i64> for RotateAngle {
    type Error = ValidationError;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        match degrees {
            90 => Ok(RotateAngle::Deg90),
            180 => Ok(RotateAngle::Deg180),
            270 => Ok(RotateAngle::Deg270),
            other => Err(invalid(
                TransformationKind::Rotate,
                format!("angle must be one of 90, 180, 270 (got {})", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotateConfig {
    pub angle: RotateAngle,
}

/// One transformation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransformation", into = "RawTransformation")]
pub enum Transformation {
    Resize(ResizeConfig),
    Grayscale,
    Trim(TrimConfig),
    Blur(BlurConfig),
    Rotate(RotateConfig),
    /// A stored step this client cannot represent (unknown kind or a config
    /// outside the accepted ranges). Only produced by
    /// [`decode_stored`]; never passes [`Transformation::validate`], so it is
    /// never submitted.
    Unsupported { name: String, config: Value },
}

impl Transformation {
    pub fn resize(width: u32, height: u32) -> Result<Self, ValidationError> {
        let transformation = Transformation::Resize(ResizeConfig { width, height });
        transformation.validate()?;
        Ok(transformation)
    }

    pub fn grayscale() -> Self {
        Transformation::Grayscale
    }

    pub fn trim(threshold: i64) -> Result<Self, ValidationError> {
        let threshold = u8::try_from(threshold).map_err(|_| {
            invalid(
                TransformationKind::Trim,
                format!("threshold must be between 0 and 255 (got {})", threshold),
            )
        })?;
        Ok(Transformation::Trim(TrimConfig { threshold }))
    }

    pub fn blur(sigma: f64) -> Result<Self, ValidationError> {
        let transformation = Transformation::Blur(BlurConfig { sigma });
        transformation.validate()?;
        Ok(transformation)
    }

    pub fn rotate(degrees: i64) -> Result<Self, ValidationError> {
        Ok(Transformation::Rotate(RotateConfig {
            angle: RotateAngle::try_from(degrees)?,
        }))
    }

    /// Editor defaults for a freshly added step
    pub fn default_for(kind: TransformationKind) -> Self {
        match kind {
            TransformationKind::Resize => Transformation::Resize(ResizeConfig {
                width: 800,
                height: 600,
            }),
            TransformationKind::Grayscale => Transformation::Grayscale,
            TransformationKind::Trim => Transformation::Trim(TrimConfig { threshold: 10 }),
            TransformationKind::Blur => Transformation::Blur(BlurConfig { sigma: 1.5 }),
            TransformationKind::Rotate => Transformation::Rotate(RotateConfig {
                angle: RotateAngle::Deg90,
            }),
        }
    }

    /// `None` for [`Transformation::Unsupported`]
    pub fn kind(&self) -> Option<TransformationKind> {
        match self {
            Transformation::Resize(_) => Some(TransformationKind::Resize),
            Transformation::Grayscale => Some(TransformationKind::Grayscale),
            Transformation::Trim(_) => Some(TransformationKind::Trim),
            Transformation::Blur(_) => Some(TransformationKind::Blur),
            Transformation::Rotate(_) => Some(TransformationKind::Rotate),
            Transformation::Unsupported { .. } => None,
        }
    }

    /// Wire name of the step
    pub fn name(&self) -> &str {
        match self {
            Transformation::Unsupported { name, .. } => name,
            other => other.kind().map_or("", |kind| kind.as_str()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Transformation::Unsupported { .. })
    }

    /// Check invariants the field types cannot express on their own.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Transformation::Resize(config) => {
                if config.width == 0 || config.height == 0 {
                    return Err(invalid(
                        TransformationKind::Resize,
                        format!(
                            "width and height must be positive (got {}x{})",
                            config.width, config.height
                        ),
                    ));
                }
                Ok(())
            }
            Transformation::Blur(config) => {
                if !config.sigma.is_finite() || config.sigma <= 0.0 {
                    return Err(invalid(
                        TransformationKind::Blur,
                        format!("sigma must be a positive number (got {})", config.sigma),
                    ));
                }
                Ok(())
            }
            Transformation::Grayscale | Transformation::Trim(_) | Transformation::Rotate(_) => Ok(()),
            Transformation::Unsupported { name, .. } => {
                Err(ValidationError::UnsupportedTransformation(name.clone()))
            }
        }
    }
}

impl std::fmt::Display for Transformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transformation::Resize(c) => write!(f, "resize {}x{}", c.width, c.height),
            Transformation::Grayscale => f.write_str("grayscale"),
            Transformation::Trim(c) => write!(f, "trim threshold={}", c.threshold),
            Transformation::Blur(c) => write!(f, "blur sigma={}", c.sigma),
            Transformation::Rotate(c) => write!(f, "rotate {}°", c.angle.degrees()),
            Transformation::Unsupported { name, config } => {
                write!(f, "{} {} (unsupported)", name, config)
            }
        }
    }
}

/// Command-line syntax: `resize:800x600`, `grayscale`, `trim:10`, `blur:1.5`,
/// `rotate:90`. A bare kind takes the editor defaults.
impl std::str::FromStr for Transformation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (s, None),
        };
        let kind: TransformationKind = name.parse()?;

        let Some(arg) = arg else {
            return Ok(Transformation::default_for(kind));
        };

        match kind {
            TransformationKind::Resize => {
                let (w, h) = arg
                    .split_once(['x', 'X'])
                    .ok_or_else(|| invalid(kind, format!("expected WIDTHxHEIGHT, got '{}'", arg)))?;
                Transformation::resize(parse_arg(kind, w)?, parse_arg(kind, h)?)
            }
            TransformationKind::Grayscale => {
                Err(invalid(kind, "grayscale takes no configuration".to_string()))
            }
            TransformationKind::Trim => Transformation::trim(parse_arg(kind, arg)?),
            TransformationKind::Blur => Transformation::blur(parse_arg(kind, arg)?),
            TransformationKind::Rotate => Transformation::rotate(parse_arg(kind, arg)?),
        }
    }
}

fn parse_arg<T: std::str::FromStr>(kind: TransformationKind, arg: &str) -> Result<T, ValidationError> {
    arg.trim()
        .parse()
        .map_err(|_| invalid(kind, format!("cannot parse '{}'", arg.trim())))
}

fn invalid(kind: TransformationKind, reason: String) -> ValidationError {
    ValidationError::InvalidConfig {
        kind: kind.as_str(),
        reason,
    }
}

/// Wire shape of a transformation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTransformation {
    name: String,
    #[serde(default)]
    config: Value,
}

impl TryFrom<RawTransformation> for Transformation {
    type Error = ValidationError;

    fn try_from(raw: RawTransformation) -> Result<Self, Self::Error> {
        let kind: TransformationKind = raw.name.parse()?;
        let config = &raw.config;

        match kind {
            TransformationKind::Resize => {
                let width = integer_field(config, kind, "width")?;
                let height = integer_field(config, kind, "height")?;
                let to_dimension = |value: i64| {
                    u32::try_from(value).map_err(|_| {
                        invalid(kind, format!("dimensions must be positive integers (got {})", value))
                    })
                };
                Transformation::resize(to_dimension(width)?, to_dimension(height)?)
            }
            TransformationKind::Grayscale => Ok(Transformation::Grayscale),
            TransformationKind::Trim => Transformation::trim(integer_field(config, kind, "threshold")?),
            TransformationKind::Blur => {
                let sigma = config
                    .get("sigma")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| invalid(kind, "missing numeric 'sigma'".to_string()))?;
                Transformation::blur(sigma)
            }
            TransformationKind::Rotate => Transformation::rotate(integer_field(config, kind, "angle")?),
        }
    }
}

impl From<Transformation> for RawTransformation {
    fn from(transformation: Transformation) -> Self {
        let config = match &transformation {
            Transformation::Resize(c) => json!({ "width": c.width, "height": c.height }),
            Transformation::Grayscale => json!({}),
            Transformation::Trim(c) => json!({ "threshold": c.threshold }),
            Transformation::Blur(c) => json!({ "sigma": c.sigma }),
            Transformation::Rotate(c) => json!({ "angle": c.angle.degrees() }),
            Transformation::Unsupported { config, .. } => config.clone(),
        };
        RawTransformation {
            name: transformation.name().to_string(),
            config,
        }
    }
}

/// Lenient decoding for transformation lists on stored records.
///
/// A step that fails strict decoding is kept as
/// [`Transformation::Unsupported`] so one odd record cannot fail a whole
/// response. `null` means an empty list.
pub(crate) fn decode_stored<'de, D>(deserializer: D) -> Result<Vec<Transformation>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values.into_iter().map(stored_step).collect())
}

fn stored_step(value: Value) -> Transformation {
    match serde_json::from_value::<Transformation>(value.clone()) {
        Ok(transformation) => transformation,
        Err(error) => {
            let name = value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            log_unsupported_transformation(&name, &error);
            Transformation::Unsupported {
                name,
                config: value.get("config").cloned().unwrap_or(Value::Null),
            }
        }
    }
}

/// Integer config field; integral floats (`10.0`) are accepted.
fn integer_field(config: &Value, kind: TransformationKind, field: &str) -> Result<i64, ValidationError> {
    let value = config
        .get(field)
        .ok_or_else(|| invalid(kind, format!("missing '{}'", field)))?;

    if let Some(int) = value.as_i64() {
        return Ok(int);
    }
    match value.as_f64() {
        Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => Ok(float as i64),
        _ => Err(invalid(kind, format!("'{}' must be an integer (got {})", field, value))),
    }
}
