//! These models represent the objects passed between the engine, the model
//! provider and the tool bridge.
//!
//! The wire formats in play overlap but do not match exactly:
//! - role/text history pairs, sent from the interface to the backend
//! - model API contents/parts, sent between the backend and the LLM
//! - function declarations, converted from the bridge's tool records
//!
//! Incoming shapes are converted into these internal structs immediately at
//! the boundary; the parts serialize directly in the model API shape so a
//! conversation turn can be posted without an extra mapping layer.
pub mod content;
pub mod part;
pub mod role;
pub mod tool;
