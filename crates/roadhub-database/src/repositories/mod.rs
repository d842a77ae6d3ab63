//! Concrete repository implementations over PostgreSQL.

pub mod contractor;
pub mod job;
pub mod queue;

pub use contractor::ContractorRepository;
pub use job::JobRepository;
pub use queue::QueueRepository;
