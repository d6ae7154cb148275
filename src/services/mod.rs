//! Business logic services

pub mod audit;
pub mod eligibility;
pub mod fines;
pub mod inventory;
pub mod loans;
pub mod reviews;

use std::sync::Arc;

use crate::{config::LendingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub inventory: inventory::InventoryService,
    pub loans: loans::LoansService,
    pub fines: fines::FinesService,
    pub reviews: reviews::ReviewsService,
    pub audit: audit::AuditService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the default unpaid-fines policy
    pub fn new(repository: Repository, lending: LendingConfig) -> Self {
        let policy = Arc::new(eligibility::UnpaidFinesThreshold::new(lending.max_unpaid_fines));
        Self::with_policy(repository, lending, policy)
    }

    /// Create all services with a caller-supplied eligibility policy
    pub fn with_policy(
        repository: Repository,
        lending: LendingConfig,
        policy: Arc<dyn eligibility::EligibilityPolicy>,
    ) -> Self {
        Self {
            inventory: inventory::InventoryService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), lending, policy),
            fines: fines::FinesService::new(repository.clone()),
            reviews: reviews::ReviewsService::new(repository.clone()),
            audit: audit::AuditService::new(repository.clone()),
            repository,
        }
    }
}
