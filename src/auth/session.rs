use std::sync::RwLock;

use async_trait::async_trait;

use crate::auth::{Identity, User};
use crate::error::Error;

/// An in-process session, for deployments where the actor is known up front.
#[derive(Debug, Default)]
pub struct Session {
    user: RwLock<Option<User>>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    pub fn sign_in(&self, user: User) {
        *self.user.write().unwrap_or_else(|p| p.into_inner()) = Some(user);
    }

    pub fn sign_out(&self) {
        *self.user.write().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

#[async_trait]
impl Identity for Session {
    async fn current_actor(&self) -> Result<Option<User>, Error> {
        Ok(self.user.read().unwrap_or_else(|p| p.into_inner()).clone())
    }
}

#[test]
fn sign_in_and_out() {
    use tokio_test::block_on;
    use uuid::Uuid;

    let session = Session::anonymous();
    assert_eq!(block_on(session.current_actor()).unwrap(), None);

    let user = User::new(Uuid::new_v4());
    session.sign_in(user.clone());
    assert_eq!(block_on(session.current_actor()).unwrap(), Some(user));

    session.sign_out();
    assert_eq!(block_on(session.current_actor()).unwrap(), None);
}
