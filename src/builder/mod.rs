//! Multi-step fixture construction with immediate id registration.

pub mod composite;
pub mod error;

pub use composite::{CompositeOrder, CompositeOrderBuilder};
pub use error::{BuildError, BuildStep};
