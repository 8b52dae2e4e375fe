//! # services
//!
//! Application use cases. Each service composes the domain decisions
//! (lifecycle, ownership, threading, visibility) with the ports.

pub mod auth;
pub mod comments;
pub mod input;
pub mod posts;
pub mod views;

pub use auth::{AuthService, Session};
pub use comments::CommentService;
pub use posts::PostService;
pub use views::{CommentView, PostView, Repositories};
