//! # rootvolume
//!
//! `rootvolume` is the geometric interaction engine for rigid obstacles ("volume
//! objects") embedded in a simulated soil volume: pots, barriers and root
//! exclusion zones that growing roots and diffusing solutes have to deal with.
//!
//! ## Features
//!
//! - **Containment**: strict point-in-obstacle and obstacle-in-obstacle tests.
//! - **Boundary crossing**: the first point where a root segment crosses an obstacle surface.
//! - **Root deflection**: probabilistic penetration or deflection of a root at a surface.
//! - **Cell overlap**: the fraction of a grid cell occupied by an obstacle and which cell faces it obstructs.
//! - **Sampling**: random points in a cell constrained to the inside or outside of an obstacle.
//!
//! Two shapes are provided: a vertical [`BoundingCylinder`] and an axis-aligned
//! [`BoundingRectangularPrism`]. The coordinate system has z growing with depth,
//! so the top of an obstacle is its smallest z.
//!
//! ## Main Interface
//!
//! The primary entry point is the [`VolumeObject`] struct, which pairs a
//! [`VolumeGeometry`] implementation with the index assigned by the owning registry.

pub mod bounds;
pub mod config;
pub mod error;
pub mod polygon;
pub mod vector;
pub mod volume;

pub use bounds::BoundingBox;
pub use bounds::Direction;
pub use bounds::DIRECTIONS;
pub use config::load_volume_objects;
pub use config::VolumeObjectConfig;
pub use error::VolumeError;
pub use polygon::Polygon;
pub use volume::coincidence::Coincidence;
pub use volume::coincidence::TransferRestriction;
pub use volume::cylinder::BoundingCylinder;
pub use volume::prism::BoundingRectangularPrism;
pub use volume::Deflection;
pub use volume::DeflectionAlgorithm;
pub use volume::GeometryVisitor;
pub use volume::InteractionType;
pub use volume::Intersection;
pub use volume::Surface;
pub use volume::SurfaceProperties;
pub use volume::VolumeGeometry;
pub use volume::VolumeObject;
