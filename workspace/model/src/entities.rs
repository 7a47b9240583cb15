//! Root for all SeaORM entity modules of the requirements tracker.
//!
//! Ownership edges: a user owns projects; a project owns requirements and use
//! cases; a requirement may refine a parent requirement and own use cases; a
//! use case owns scenarios. Actors and requirement/use-case links are catalog
//! tables without an owner.

pub mod actor;
pub mod project;
pub mod requirement;
pub mod requirement_use_case;
pub mod scenario;
pub mod use_case;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::actor::Entity as Actor;
    pub use super::project::Entity as Project;
    pub use super::requirement::Entity as Requirement;
    pub use super::requirement_use_case::Entity as RequirementUseCase;
    pub use super::scenario::Entity as Scenario;
    pub use super::use_case::Entity as UseCase;
    pub use super::user::Entity as User;
}
