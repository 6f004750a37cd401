pub mod admission;
pub mod identifier;
pub mod middleware;
pub mod policy;
pub mod store;
pub mod sweeper;
pub mod window;

pub use admission::{Admission, AdmissionResult, Allowance, ClientKey, RateLimitStatus, Rejection, ReleaseToken};
pub use identifier::{RequestMeta, identify};
pub use middleware::{EndpointGuard, enforce};
pub use policy::{PolicyTable, RateLimitPolicy};
pub use store::{MemoryStore, RateLimitStore};
pub use sweeper::Sweeper;
