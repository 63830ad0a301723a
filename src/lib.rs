#![doc = "Mapweave public API"]
mod build;
mod config;
mod error;
mod input;
mod ruleset;
mod tags;

pub mod ele;
pub mod index;
pub mod model;

#[doc(inline)]
pub use build::Converter;

#[doc(inline)]
pub use config::{ConversionConfig, SolverConfig};

#[doc(inline)]
pub use error::BuildError;

#[doc(inline)]
pub use input::{Bounds, Dataset, MemberKind, RawMember, RawNode, RawRelation, RawWay, SourceId, SourceRef};

#[doc(inline)]
pub use model::MapModel;

#[doc(inline)]
pub use ruleset::Ruleset;

#[doc(inline)]
pub use tags::TagGroup;

pub use planegeom as geometry;
