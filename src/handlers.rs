pub mod actors;
pub mod auth;
pub mod health;
pub mod projects;
pub mod relations;
pub mod requirements;
pub mod scenarios;
pub mod use_cases;
