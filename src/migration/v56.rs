//! Data changes introduced with version 5.6.

use crate::{Clock, Connection, Error, Handler, Row, UpdateBinding, migration::Context};

use super::MigrationStep;

/// Identity provider assigned to users which never had an external identity.
pub const DEFAULT_IDENTITY_PROVIDER: &str = "sonarqube";

const SELECT_USERS: &str = "SELECT u.id, u.login FROM users u \
    WHERE external_identity_provider IS NULL OR external_identity IS NULL";
const UPDATE_USER: &str = "UPDATE users \
    SET external_identity_provider=?, external_identity=?, updated_at=? WHERE id=?";

/// Sets `users.external_identity_provider` to `sonarqube` and `users.external_identity` to the
/// login of the user, wherever one of these two columns is `NULL`.
pub struct UpdateUsersExternalIdentityWhenEmpty<'c, C, K> {
    connection: &'c C,
    clock: K,
}

impl<'c, C, K> UpdateUsersExternalIdentityWhenEmpty<'c, C, K> {
    pub fn new(connection: &'c C, clock: K) -> Self {
        Self { connection, clock }
    }
}

impl<C, K> MigrationStep for UpdateUsersExternalIdentityWhenEmpty<'_, C, K>
where
    C: Connection,
    K: Clock,
{
    fn execute(&mut self) -> Result<(), Error> {
        let context = Context::new(self.connection);
        context
            .prepare_mass_update(SELECT_USERS, UPDATE_USER)
            .row_plural_name("users")
            .execute(DefaultExternalIdentity {
                now: self.clock.now(),
            })?;
        Ok(())
    }
}

struct DefaultExternalIdentity {
    now: i64,
}

impl Handler for DefaultExternalIdentity {
    fn handle(&mut self, row: &Row<'_>, update: &mut UpdateBinding) -> Result<bool, Error> {
        update
            .set_text(1, DEFAULT_IDENTITY_PROVIDER)?
            // A missing login is passed on as NULL.
            .set(2, row.get_nullable_text(2)?)?
            .set_i64(3, self.now)?
            .set_i64(4, row.get_i64(1)?)?;
        Ok(true)
    }
}
