//! Obstacle parameters as they arrive from a configuration store.

use anyhow::Context;
use serde::Deserialize;

use crate::error::VolumeError;
use crate::volume::cylinder::{BoundingCylinder, CYLINDER_POLYGON_SIDES};
use crate::volume::prism::BoundingRectangularPrism;
use crate::volume::{DeflectionAlgorithm, SurfaceProperties, VolumeObject};

/// Shape specific parameters, tagged by `"shape"`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ShapeConfig {
    Cylinder {
        /// Centre of the top face.
        origin: [f64; 3],
        radius: f64,
        height: f64,
        #[serde(default)]
        sides: Option<usize>,
    },
    RectangularPrism {
        corner_a: [f64; 3],
        corner_b: [f64; 3],
    },
}

/// One obstacle entry. Missing probabilities and permeabilities default to zero.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct VolumeObjectConfig {
    #[serde(flatten)]
    pub shape: ShapeConfig,
    #[serde(default)]
    pub deflection_algorithm: Option<String>,
    #[serde(default)]
    pub top_rpp: f64,
    #[serde(default)]
    pub bottom_rpp: f64,
    #[serde(default)]
    pub side_rpp: f64,
    #[serde(default)]
    pub top_permeability: f64,
    #[serde(default)]
    pub bottom_permeability: f64,
    #[serde(default)]
    pub side_permeability: f64,
}

impl VolumeObjectConfig {
    pub fn surface_properties(&self) -> SurfaceProperties {
        let algorithm = self
            .deflection_algorithm
            .as_deref()
            .map(DeflectionAlgorithm::from_name)
            .unwrap_or_default();
        SurfaceProperties {
            algorithm,
            top_rpp: self.top_rpp,
            bottom_rpp: self.bottom_rpp,
            side_rpp: self.side_rpp,
            top_permeability: self.top_permeability,
            bottom_permeability: self.bottom_permeability,
            side_permeability: self.side_permeability,
        }
    }

    /// Constructs the obstacle with registry index `id`.
    pub fn build(&self, id: usize) -> Result<VolumeObject, VolumeError> {
        let properties = self.surface_properties();
        let object = match &self.shape {
            ShapeConfig::Cylinder { origin, radius, height, sides } => {
                let sides = sides.unwrap_or(CYLINDER_POLYGON_SIDES);
                if sides < 3 {
                    return Err(VolumeError::InvalidConfig(format!("cylinder needs at least 3 sides, got {}", sides)));
                }
                let cylinder = BoundingCylinder::with_resolution(*origin, *radius, *height, properties, sides)?;
                VolumeObject::new(id, Box::new(cylinder))
            }
            ShapeConfig::RectangularPrism { corner_a, corner_b } => {
                let prism = BoundingRectangularPrism::new(*corner_a, *corner_b, properties)?;
                VolumeObject::new(id, Box::new(prism))
            }
        };
        Ok(object)
    }
}

/// Parses a JSON array of obstacle entries and builds them with indices in order.
pub fn load_volume_objects(json: &str) -> anyhow::Result<Vec<VolumeObject>> {
    let configs: Vec<VolumeObjectConfig> =
        serde_json::from_str(json).context("failed to parse volume object configuration")?;
    configs
        .iter()
        .enumerate()
        .map(|(id, config)| config.build(id).with_context(|| format!("invalid volume object {}", id)))
        .collect()
}
