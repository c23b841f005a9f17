mod hosted;
mod session;
mod user;

use async_trait::async_trait;

use crate::error::Error;

pub use hosted::{HostedAuth, SignUp};
pub use session::Session;
pub use user::User;

/// Answers "who is acting right now", or `None` when nobody is signed in.
#[async_trait]
pub trait Identity: Send + Sync {
    async fn current_actor(&self) -> Result<Option<User>, Error>;
}
