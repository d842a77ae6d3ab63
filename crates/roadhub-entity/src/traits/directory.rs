//! Contractor directory trait.

use async_trait::async_trait;

use roadhub_core::result::AppResult;
use roadhub_core::types::geo::GeoPoint;
use roadhub_core::types::id::ContractorId;

use crate::contractor::profile::ContractorProfile;
use crate::contractor::vacation::VacationRequest;

/// Read access to contractor profiles, availability flags, and vacations.
#[async_trait]
pub trait ContractorDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch a contractor's profile.
    async fn get_contractor(&self, id: ContractorId) -> AppResult<Option<ContractorProfile>>;

    /// A contractor's approved vacation intervals.
    async fn approved_vacations(&self, id: ContractorId) -> AppResult<Vec<VacationRequest>>;

    /// Contractors whose own flags (online + available) permit assignment,
    /// ordered by distance to `near` when a location is given and in
    /// arbitrary order otherwise. Contractors without a stored base
    /// location sort last.
    async fn available_for_assignment(
        &self,
        near: Option<GeoPoint>,
    ) -> AppResult<Vec<ContractorProfile>>;
}
