//! Transfer requests as the matching engine sees them.
//!
//! Creating and editing requests happens elsewhere; this domain only loads
//! submitted requests and applies the status side effects of match outcomes.

pub mod models;

pub use models::{GeoFlexibility, LocationChain, Preference, TransferRequest, TransferStatus, Urgency};
