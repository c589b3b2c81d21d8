pub mod auth_manager;
pub mod extract;
pub mod feedback_workflow;
pub mod normalize;
pub mod repair;
