pub mod curve;
pub mod error;
pub mod hexbytes;
pub mod ids;
pub mod model;

pub use curve::Curve;
pub use error::FrostError;
pub use hexbytes::HexBytes;
pub use ids::{DkgId, NodeId, SignatureId};
