//! JsonApiService: generic operations over registered resource types, plus the algorithms they share.

mod crud;
mod include;
mod pagination;
mod query;
mod sync;
mod validation;

pub use crud::JsonApiService;
pub use include::IncludeResolver;
pub use pagination::{PageLinks, PageSpec, Paginator, SortField, Sortable, Sorter};
pub use query::ListParams;
pub use sync::{
    FailedDelivery, MembershipDiff, RelationshipSyncEngine, RoleChange, RoleOutcome, SyncEvent, SyncOutcome, SyncPlan,
};
pub use validation::{RelationshipData, RequestValidator, UniquenessProbe};
