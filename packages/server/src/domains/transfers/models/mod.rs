pub mod location;
pub mod transfer_request;

pub use location::LocationChain;
pub use transfer_request::{GeoFlexibility, Preference, TransferRequest, TransferStatus, Urgency};
