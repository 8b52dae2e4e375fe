use std::sync::Arc;

use domains::{PasswordHasher, TokenService};
use services::{AuthService, CommentService, PostService, Repositories};

use crate::metrics::Metrics;

/// State shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub comments: CommentService,
    pub auth: AuthService,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(repos: Repositories, hasher: Arc<dyn PasswordHasher>, tokens: Arc<dyn TokenService>) -> Self {
        Self {
            auth: AuthService::new(repos.users.clone(), hasher, tokens),
            posts: PostService::new(repos.clone()),
            comments: CommentService::new(repos),
            metrics: Arc::new(Metrics::new()),
        }
    }
}
