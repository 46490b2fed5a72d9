//! Pallet layout engine.
//!
//! Computes a centre point for every cube of an ordered snapshot. Two
//! strategies are available:
//! - `Grid`: the column count is recomputed for every cube from its own
//!   width, and the cube's ordinal decides its row and column. Mixed sizes
//!   can overlap across rows; the report's diagnostics list such pairs.
//! - `Shelf`: cubes are appended to a row cursor and a new row starts below
//!   the longest cube of the previous row. Footprints never overlap.
//!
//! Both strategies place a single layer, resting on the pallet at
//! `y = height / 2`. Nothing is cached between calls.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::geometry::{find_overlaps, footprint_of, outside_pallet};
use crate::model::{Cube, CubeId, Pallet, Placement, ValidationError};
use crate::types::{Dimensional, EPSILON_GENERAL, Footprint, Vec3};

/// Placement rule used by the engine.
///
/// Names are matched case-insensitively, from the environment as well as
/// from request bodies and query strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    #[default]
    Grid,
    Shelf,
}

impl LayoutStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutStrategy::Grid => "grid",
            LayoutStrategy::Shelf => "shelf",
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutStrategy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(LayoutStrategy::Grid),
            "shelf" => Ok(LayoutStrategy::Shelf),
            other => Err(format!("unknown layout strategy '{}'", other)),
        }
    }
}

impl<'de> Deserialize<'de> for LayoutStrategy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Configuration for the layout engine.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Clearance between adjacent cubes on both axes
    pub gap: f64,
    /// Placement rule
    pub strategy: LayoutStrategy,
}

impl LayoutConfig {
    pub const DEFAULT_GAP: f64 = 0.1;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::default()
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            gap: Self::DEFAULT_GAP,
            strategy: LayoutStrategy::default(),
        }
    }
}

/// Builder for `LayoutConfig`.
#[derive(Clone, Debug, Default)]
pub struct LayoutConfigBuilder {
    config: LayoutConfig,
}

impl LayoutConfigBuilder {
    /// Sets the gap between adjacent cubes.
    pub fn gap(mut self, gap: f64) -> Self {
        self.config.gap = gap;
        self
    }

    /// Sets the placement strategy.
    pub fn strategy(mut self, strategy: LayoutStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn build(self) -> LayoutConfig {
        self.config
    }
}

/// Errors reported by the layout engine.
///
/// All of them are deterministic: calling again with the same input
/// fails the same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("Cube {cube_id} (index {index}): {dimension} must be positive, got {value}")]
    NonPositiveDimension {
        cube_id: CubeId,
        index: usize,
        dimension: &'static str,
        value: f64,
    },
    #[error(
        "Cube {cube_id} (index {index}): width {width} plus gap {gap} exceeds pallet width {pallet_width}"
    )]
    InvalidLayoutInput {
        cube_id: CubeId,
        index: usize,
        width: f64,
        gap: f64,
        pallet_width: f64,
    },
    #[error(transparent)]
    InvalidPallet(ValidationError),
    #[error("Invalid gap: {0} (must be finite and not negative)")]
    InvalidGap(f64),
}

impl LayoutError {
    pub fn code(&self) -> &'static str {
        match self {
            LayoutError::NonPositiveDimension { .. } => "non_positive_dimension",
            LayoutError::InvalidLayoutInput { .. } => "invalid_layout_input",
            LayoutError::InvalidPallet(_) => "invalid_pallet",
            LayoutError::InvalidGap(_) => "invalid_gap",
        }
    }
}

/// Number of columns a cube of `cube_width` gets on a pallet of `pallet_width`.
///
/// # Example
/// ```
/// use cube_store::layout::columns_for;
///
/// assert_eq!(columns_for(1.0, 10.0, 0.1), 9);
/// assert_eq!(columns_for(10.0, 10.0, 0.1), 0);
/// ```
pub fn columns_for(cube_width: f64, pallet_width: f64, gap: f64) -> usize {
    let columns = (pallet_width / (cube_width + gap)).floor();
    if columns >= 1.0 { columns as usize } else { 0 }
}

/// Computes one placement per cube, in input order, with the default configuration.
///
/// Fails on the first cube that cannot be placed.
pub fn compute_layout(cubes: &[Cube], pallet: &Pallet) -> Result<Vec<Placement>, LayoutError> {
    compute_layout_with_config(cubes, pallet, &LayoutConfig::default())
}

/// Like `compute_layout`, with a configurable gap and strategy.
pub fn compute_layout_with_config(
    cubes: &[Cube],
    pallet: &Pallet,
    config: &LayoutConfig,
) -> Result<Vec<Placement>, LayoutError> {
    check_inputs(pallet, config)?;
    let mut engine = Engine::new(pallet, config);
    cubes
        .iter()
        .enumerate()
        .map(|(index, cube)| engine.place(index, cube))
        .collect()
}

/// A cube with its computed placement.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacedCube {
    pub id: CubeId,
    /// Position of the cube in the input sequence
    pub index: usize,
    pub case_name: String,
    pub mass: f64,
    /// Centre point of the cube
    pub position: Vec3,
    /// Dimensions as (width, height, length)
    pub dims: Vec3,
    pub footprint: Footprint,
}

impl PlacedCube {
    fn new(index: usize, cube: &Cube, position: Placement) -> Self {
        Self {
            id: cube.id,
            index,
            case_name: cube.case_name.clone(),
            mass: cube.mass,
            position,
            dims: Vec3::new(cube.width, cube.height, cube.length),
            footprint: footprint_of(cube, &position),
        }
    }
}

/// A cube the engine refused to place.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectedCube {
    pub id: CubeId,
    pub index: usize,
    pub reason_code: String,
    pub reason: String,
    #[serde(skip)]
    pub error: Option<LayoutError>,
}

impl RejectedCube {
    fn new(index: usize, cube: &Cube, error: LayoutError) -> Self {
        Self {
            id: cube.id,
            index,
            reason_code: error.code().to_string(),
            reason: error.to_string(),
            error: Some(error),
        }
    }
}

/// Two placed cubes whose footprints overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct OverlapPair {
    pub first: CubeId,
    pub second: CubeId,
}

/// Geometric findings about a computed layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDiagnostics {
    pub overlapping: Vec<OverlapPair>,
    /// Cubes whose footprint extends beyond the pallet border
    pub outside_pallet: Vec<CubeId>,
}

impl LayoutDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.overlapping.is_empty() && self.outside_pallet.is_empty()
    }
}

/// Result of a layout pass that keeps going past offending cubes.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub pallet: Pallet,
    pub gap: f64,
    pub strategy: LayoutStrategy,
    pub placed: Vec<PlacedCube>,
    pub rejected: Vec<RejectedCube>,
    pub is_complete: bool,
    pub diagnostics: LayoutDiagnostics,
}

impl LayoutReport {
    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Lays out all cubes and collects the ones that cannot be placed instead of failing.
///
/// With the grid strategy a rejected cube still occupies its ordinal, so
/// every placed cube lands exactly where `compute_layout` would put it.
/// Only an invalid pallet or gap fails the whole pass.
pub fn layout_report(
    cubes: &[Cube],
    pallet: &Pallet,
    config: &LayoutConfig,
) -> Result<LayoutReport, LayoutError> {
    check_inputs(pallet, config)?;
    let mut engine = Engine::new(pallet, config);

    let mut placed = Vec::with_capacity(cubes.len());
    let mut rejected = Vec::new();
    for (index, cube) in cubes.iter().enumerate() {
        match engine.place(index, cube) {
            Ok(position) => placed.push(PlacedCube::new(index, cube, position)),
            Err(error) => {
                warn!("⚠️ Cube {} not placed: {}", cube.id, error);
                rejected.push(RejectedCube::new(index, cube, error));
            }
        }
    }

    let diagnostics = diagnose(pallet, &placed);
    debug!(
        placed = placed.len(),
        rejected = rejected.len(),
        overlapping = diagnostics.overlapping.len(),
        strategy = %config.strategy,
        "layout computed"
    );

    Ok(LayoutReport {
        pallet: *pallet,
        gap: config.gap,
        strategy: config.strategy,
        is_complete: rejected.is_empty(),
        placed,
        rejected,
        diagnostics,
    })
}

fn diagnose(pallet: &Pallet, placed: &[PlacedCube]) -> LayoutDiagnostics {
    let footprints: Vec<Footprint> = placed.iter().map(|p| p.footprint).collect();
    LayoutDiagnostics {
        overlapping: find_overlaps(&footprints)
            .into_iter()
            .map(|(a, b)| OverlapPair {
                first: placed[a].id,
                second: placed[b].id,
            })
            .collect(),
        outside_pallet: outside_pallet(pallet, &footprints)
            .into_iter()
            .map(|idx| placed[idx].id)
            .collect(),
    }
}

fn check_inputs(pallet: &Pallet, config: &LayoutConfig) -> Result<(), LayoutError> {
    pallet.validate().map_err(LayoutError::InvalidPallet)?;
    if !config.gap.is_finite() || config.gap < 0.0 {
        return Err(LayoutError::InvalidGap(config.gap));
    }
    Ok(())
}

fn check_dimensions(index: usize, cube: &Cube) -> Result<(), LayoutError> {
    let dims = cube.dimensions();
    if dims.is_valid_dimension() {
        return Ok(());
    }
    let (dimension, value) = [("width", dims.x), ("height", dims.y), ("length", dims.z)]
        .into_iter()
        .find(|(_, value)| !(*value > 0.0 && value.is_finite()))
        .unwrap_or(("width", dims.x));
    Err(LayoutError::NonPositiveDimension {
        cube_id: cube.id,
        index,
        dimension,
        value,
    })
}

/// Row cursor of the shelf strategy, measured from the pallet's corner.
#[derive(Debug, Default)]
struct ShelfCursor {
    x: f64,
    row_z: f64,
    row_depth: f64,
}

struct Engine<'a> {
    pallet: &'a Pallet,
    gap: f64,
    strategy: LayoutStrategy,
    shelf: ShelfCursor,
}

impl<'a> Engine<'a> {
    fn new(pallet: &'a Pallet, config: &LayoutConfig) -> Self {
        Self {
            pallet,
            gap: config.gap,
            strategy: config.strategy,
            shelf: ShelfCursor::default(),
        }
    }

    /// Places the cube at input position `index`. Leaves the engine untouched on error.
    fn place(&mut self, index: usize, cube: &Cube) -> Result<Placement, LayoutError> {
        check_dimensions(index, cube)?;

        let columns = columns_for(cube.width, self.pallet.width, self.gap);
        if columns == 0 {
            return Err(LayoutError::InvalidLayoutInput {
                cube_id: cube.id,
                index,
                width: cube.width,
                gap: self.gap,
                pallet_width: self.pallet.width,
            });
        }

        Ok(match self.strategy {
            LayoutStrategy::Grid => self.grid_position(index, columns, cube),
            LayoutStrategy::Shelf => self.shelf_position(cube),
        })
    }

    fn grid_position(&self, index: usize, columns: usize, cube: &Cube) -> Placement {
        let column = (index % columns) as f64;
        let row = (index / columns) as f64;
        Vec3::new(
            column * (cube.width + self.gap) - self.pallet.width / 2.0 + cube.width / 2.0,
            cube.height / 2.0,
            row * (cube.length + self.gap) - self.pallet.length / 2.0 + cube.length / 2.0,
        )
    }

    fn shelf_position(&mut self, cube: &Cube) -> Placement {
        let cursor = &mut self.shelf;
        if cursor.x > 0.0 && cursor.x + cube.width > self.pallet.width + EPSILON_GENERAL {
            cursor.row_z += cursor.row_depth + self.gap;
            cursor.x = 0.0;
            cursor.row_depth = 0.0;
        }

        let position = Vec3::new(
            cursor.x - self.pallet.width / 2.0 + cube.width / 2.0,
            cube.height / 2.0,
            cursor.row_z - self.pallet.length / 2.0 + cube.length / 2.0,
        );
        cursor.x += cube.width + self.gap;
        cursor.row_depth = cursor.row_depth.max(cube.length);
        position
    }
}
