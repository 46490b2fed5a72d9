//! Data models for the cube store and the pallet layout.
//!
//! - `Cube`: a stored record with dimensions, mass and case name
//! - `CubeDraft`: the record fields without an identifier (create/update body)
//! - `Pallet`: the footprint cubes are laid out on
//! - `PalletPreset`: the pallet sizes offered by the viewer

use std::str::FromStr;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Dimensional, Footprint, Vec3};

/// Identifier assigned by the store on creation.
pub type CubeId = u64;

/// Centre point computed for one cube in one layout pass.
pub type Placement = Vec3;

/// Validation error for request data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid mass: {0}")]
    InvalidMass(String),
    #[error("Invalid pallet: {0}")]
    InvalidPallet(String),
}

fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_mass(value: f64) -> Result<(), ValidationError> {
    if value < 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidMass(format!(
            "Mass must not be negative, got: {}",
            value
        )));
    }
    Ok(())
}

fn validate_pallet_side(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidPallet(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Cube fields as supplied by a client, without an identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "caseName": "Case A",
    "width": 1.0,
    "height": 1.0,
    "length": 1.0,
    "mass": 2.5
}))]
pub struct CubeDraft {
    #[serde(default)]
    pub case_name: String,
    pub width: f64,
    pub height: f64,
    pub length: f64,
    #[serde(default)]
    pub mass: f64,
}

impl CubeDraft {
    /// Checks that all dimensions are strictly positive and the mass is not negative.
    ///
    /// # Examples
    /// ```
    /// use cube_store::model::CubeDraft;
    ///
    /// let draft = CubeDraft {
    ///     case_name: "A".into(),
    ///     width: 1.0,
    ///     height: 1.0,
    ///     length: 1.0,
    ///     mass: 0.0,
    /// };
    /// assert!(draft.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.width, "Width")?;
        validate_dimension(self.height, "Height")?;
        validate_dimension(self.length, "Length")?;
        validate_mass(self.mass)?;
        Ok(())
    }
}

/// A stored cube record.
///
/// Dimensions are not re-validated here: the layout engine checks them
/// again before placing, so records created outside the API cannot break it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cube {
    pub id: CubeId,
    #[serde(default)]
    pub case_name: String,
    pub width: f64,
    pub height: f64,
    pub length: f64,
    #[serde(default)]
    pub mass: f64,
}

impl Cube {
    /// Builds a record from a draft and the identifier the store assigned.
    pub fn from_draft(id: CubeId, draft: CubeDraft) -> Self {
        let CubeDraft {
            case_name,
            width,
            height,
            length,
            mass,
        } = draft;
        Self {
            id,
            case_name,
            width,
            height,
            length,
            mass,
        }
    }

    /// Overwrites every field except the identifier.
    pub fn apply(&mut self, draft: CubeDraft) {
        *self = Self::from_draft(self.id, draft);
    }
}

impl Dimensional for Cube {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.length)
    }
}

/// The rectangular surface cubes are arranged on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "width": 10.0, "length": 10.0 }))]
pub struct Pallet {
    pub width: f64,
    pub length: f64,
}

impl Pallet {
    /// Creates a pallet after validating both sides.
    pub fn new(width: f64, length: f64) -> Result<Self, ValidationError> {
        let pallet = Self { width, length };
        pallet.validate()?;
        Ok(pallet)
    }

    /// Checks that width and length are positive and finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_pallet_side(self.width, "Pallet width")?;
        validate_pallet_side(self.length, "Pallet length")?;
        Ok(())
    }

    /// Footprint of the whole pallet, centred at the origin.
    pub fn footprint(&self) -> Footprint {
        Footprint::around(Vec3::zero(), Vec3::new(self.width, 0.0, self.length))
    }
}

impl Default for Pallet {
    fn default() -> Self {
        PalletPreset::Standard.pallet()
    }
}

impl FromStr for Pallet {
    type Err = ValidationError;

    /// Parses a preset name (`standard`, `large`, `small`) or a `WxL` size such as `10x12`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Ok(preset) = raw.parse::<PalletPreset>() {
            return Ok(preset.pallet());
        }

        let lowered = raw.trim().to_ascii_lowercase();
        let (width, length) = lowered.split_once('x').ok_or_else(|| {
            ValidationError::InvalidPallet(format!(
                "expected a preset name or '<width>x<length>', got: '{}'",
                raw
            ))
        })?;
        let parse_side = |value: &str, name: &str| {
            value.trim().parse::<f64>().map_err(|err| {
                ValidationError::InvalidPallet(format!("{} '{}': {}", name, value.trim(), err))
            })
        };
        Pallet::new(
            parse_side(width, "Pallet width")?,
            parse_side(length, "Pallet length")?,
        )
    }
}

/// Pallet sizes offered by the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PalletPreset {
    Standard,
    Large,
    Small,
}

impl PalletPreset {
    pub const ALL: [PalletPreset; 3] = [
        PalletPreset::Standard,
        PalletPreset::Large,
        PalletPreset::Small,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PalletPreset::Standard => "standard",
            PalletPreset::Large => "large",
            PalletPreset::Small => "small",
        }
    }

    pub fn pallet(&self) -> Pallet {
        let side = match self {
            PalletPreset::Standard => 10.0,
            PalletPreset::Large => 12.0,
            PalletPreset::Small => 8.0,
        };
        Pallet {
            width: side,
            length: side,
        }
    }
}

impl FromStr for PalletPreset {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let lowered = raw.trim().to_ascii_lowercase();
        PalletPreset::ALL
            .into_iter()
            .find(|preset| preset.name() == lowered)
            .ok_or_else(|| ValidationError::InvalidPallet(format!("unknown preset '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(width: f64, height: f64, length: f64, mass: f64) -> CubeDraft {
        CubeDraft {
            case_name: "Case".to_string(),
            width,
            height,
            length,
            mass,
        }
    }

    #[test]
    fn draft_accepts_zero_mass() {
        assert!(draft(1.0, 2.0, 3.0, 0.0).validate().is_ok());
    }

    #[test]
    fn draft_rejects_non_positive_dimensions() {
        assert!(matches!(
            draft(0.0, 1.0, 1.0, 1.0).validate(),
            Err(ValidationError::InvalidDimension(_))
        ));
        assert!(matches!(
            draft(1.0, -1.0, 1.0, 1.0).validate(),
            Err(ValidationError::InvalidDimension(_))
        ));
        assert!(matches!(
            draft(1.0, 1.0, f64::NAN, 1.0).validate(),
            Err(ValidationError::InvalidDimension(_))
        ));
    }

    #[test]
    fn draft_rejects_negative_mass() {
        assert!(matches!(
            draft(1.0, 1.0, 1.0, -0.5).validate(),
            Err(ValidationError::InvalidMass(_))
        ));
    }

    #[test]
    fn cube_json_uses_camel_case() {
        let cube = Cube::from_draft(7, draft(1.0, 2.0, 3.0, 4.0));
        let value = serde_json::to_value(&cube).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["caseName"], "Case");
        assert_eq!(value["length"], 3.0);
    }

    #[test]
    fn draft_defaults_case_name_and_mass() {
        let parsed: CubeDraft =
            serde_json::from_str(r#"{"width": 1.0, "height": 1.0, "length": 1.0}"#).unwrap();
        assert_eq!(parsed.case_name, "");
        assert_eq!(parsed.mass, 0.0);
    }

    #[test]
    fn apply_keeps_identifier() {
        let mut cube = Cube::from_draft(3, draft(1.0, 1.0, 1.0, 1.0));
        cube.apply(draft(2.0, 3.0, 4.0, 5.0));
        assert_eq!(cube.id, 3);
        assert_eq!(cube.dimensions(), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(cube.mass, 5.0);
    }

    #[test]
    fn pallet_parses_presets_and_sizes() {
        assert_eq!("Standard".parse::<Pallet>().unwrap(), Pallet::new(10.0, 10.0).unwrap());
        assert_eq!("large".parse::<Pallet>().unwrap(), Pallet::new(12.0, 12.0).unwrap());
        assert_eq!(" 8x8 ".parse::<Pallet>().unwrap(), Pallet::new(8.0, 8.0).unwrap());
        assert_eq!("10X12.5".parse::<Pallet>().unwrap(), Pallet::new(10.0, 12.5).unwrap());
    }

    #[test]
    fn pallet_rejects_invalid_sizes() {
        assert!("huge".parse::<Pallet>().is_err());
        assert!("0x10".parse::<Pallet>().is_err());
        assert!("10x".parse::<Pallet>().is_err());
        assert!(Pallet::new(10.0, f64::INFINITY).is_err());
    }

    #[test]
    fn pallet_footprint_is_centred() {
        let fp = Pallet::new(10.0, 8.0).unwrap().footprint();
        assert_eq!(fp, Footprint::new(-5.0, -4.0, 5.0, 4.0));
    }
}
