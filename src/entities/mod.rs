mod draft;
mod location;
pub(crate) mod ride;

pub use draft::{RideDraft, ValidationRules};
pub use location::{City, Location};
pub use ride::{NewRide, Ride};
