//! Pet catalog and shelter directory.
//!
//! Reads go through the shared [`ReadThroughCache`](crate::cache::ReadThroughCache); every
//! successful mutation invalidates the keys whose snapshots it could have changed.

pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Page, PageRequest, Pet, PetChanges, PetDraft, PetId, PetKind, PetQuery, PetStatus, PetView,
    Shelter, ShelterChanges, ShelterDraft, ShelterId, ShelterView,
};
pub use router::{pet_router, shelter_router};
pub use service::{CatalogError, PetCatalog, ShelterDirectory};
