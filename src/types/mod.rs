//! Public types for the Mocache API.

mod domain;
mod key;
mod location;
mod lookup;

pub use domain::Domain;
pub use key::{CacheKey, KEY_LEN};
pub use location::CatalogLocation;
pub use lookup::LookupArgs;
