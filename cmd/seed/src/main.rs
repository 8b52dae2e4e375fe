//! Seeds a test user and a published post into the configured database.
//! Safe to re-run: an existing test user is reused.

use anyhow::Context;
use secrecy::ExposeSecret;
use tracing::info;

use auth_adapters::Argon2Hasher;
use configs::Settings;
use domains::{NewPost, NewUser, PasswordHasher, PostRepository, PostStatus, UserRepository};
use storage_adapters::PgStore;

const EMAIL: &str = "test@example.com";
const PASSWORD: &str = "password123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    settings.log.init();

    let store = PgStore::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await
    .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;

    let user = match store.find_by_email(EMAIL).await? {
        Some(user) => {
            info!(user_id = %user.id, "reusing existing test user");
            user
        }
        None => {
            let password_hash = Argon2Hasher::new().hash(PASSWORD).await?;
            let user = UserRepository::create(
                &store,
                NewUser {
                    name: "Test User".into(),
                    email: EMAIL.into(),
                    password_hash,
                },
            )
            .await?;
            info!(user_id = %user.id, "created test user");
            user
        }
    };

    let post = PostRepository::insert(
        &store,
        NewPost {
            title: "Test Post".into(),
            content: "This is a test post content.".into(),
            status: PostStatus::Published,
            user_id: user.id,
        },
    )
    .await?;
    info!(post_id = %post.id, user_id = %user.id, "created test post");
    Ok(())
}
