//! Identification providers.
//!
//! The service talks to providers only through [`IdentificationProvider`].
//! [`PlantIdClient`] is the production backend; the invasive species list
//! lives here because providers do not report invasiveness themselves.

pub mod invasive;
pub mod plant_id;
pub mod traits;

pub use invasive::InvasiveSpecies;
pub use plant_id::PlantIdClient;
pub use traits::IdentificationProvider;
