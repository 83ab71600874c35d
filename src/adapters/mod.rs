// Adapters layer: concrete implementations for external systems (detection service, partner files).

pub mod moss_client;
pub mod partners;

pub use moss_client::MossClient;
pub use partners::{load_partners, PairListPartnerSource, PartnerFormat, RosterPartnerSource};
