use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use crate::domain::{DeletePolicy, UserError};
use crate::entities::{behavior_records, prelude::*, users};
use crate::models::user::{NewUser, User, UserPatch};

pub const DEFAULT_PAGE_SIZE: u64 = 100;

pub struct UserRepository<'a> {
    conn: &'a DatabaseConnection,
    on_delete: DeletePolicy,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(conn: &'a DatabaseConnection, on_delete: DeletePolicy) -> Self {
        Self { conn, on_delete }
    }

    /// Insert a user. Uniqueness of `username` is left to the store.
    pub async fn create(&self, new_user: NewUser) -> Result<User, UserError> {
        let active_model = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            role: Set(new_user.role),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            ..Default::default()
        };

        let model = active_model.insert(self.conn).await?;
        info!(user_id = model.id, username = %model.username, "Created user");

        Ok(User::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<User>, UserError> {
        let user = Users::find_by_id(id).one(self.conn).await?;
        debug!(user_id = id, found = user.is_some(), "Fetched user");

        Ok(user.map(User::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(self.conn)
            .await?;

        Ok(user.map(User::from))
    }

    /// Page through users in store order (no explicit ordering).
    pub async fn list(&self, skip: u64, limit: u64) -> Result<Vec<User>, UserError> {
        let rows = Users::find()
            .offset(skip)
            .limit(limit)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn count(&self) -> Result<u64, UserError> {
        Ok(Users::find().count(self.conn).await?)
    }

    /// Apply `patch` to the user, returning the refreshed row.
    ///
    /// Missing users yield `Ok(None)` and nothing is written.
    pub async fn update(&self, id: i32, patch: UserPatch) -> Result<Option<User>, UserError> {
        let Some(user) = Users::find_by_id(id).one(self.conn).await? else {
            return Ok(None);
        };

        if patch.is_empty() {
            return Ok(Some(User::from(user)));
        }

        let mut active: users::ActiveModel = user.into();
        if let Some(username) = patch.username {
            active.username = Set(username);
        }
        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(role) = patch.role {
            active.role = Set(role);
        }
        if let Some(first_name) = patch.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = patch.last_name {
            active.last_name = Set(last_name);
        }

        let model = active.update(self.conn).await?;
        info!(user_id = id, "Updated user");

        Ok(Some(User::from(model)))
    }

    /// Delete a user, honoring the configured [`DeletePolicy`] for behavior
    /// records that reference them.
    ///
    /// Returns `Ok(false)` when no such user exists.
    pub async fn delete(&self, id: i32) -> Result<bool, UserError> {
        if Users::find_by_id(id).one(self.conn).await?.is_none() {
            return Ok(false);
        }

        let references = referencing(id);
        let records = BehaviorRecords::find()
            .filter(references.clone())
            .count(self.conn)
            .await?;

        match self.on_delete {
            DeletePolicy::Restrict if records > 0 => {
                warn!(user_id = id, records, "Refusing to delete referenced user");
                Err(UserError::Referenced { id, records })
            }
            DeletePolicy::Restrict => {
                let result = Users::delete_by_id(id).exec(self.conn).await?;
                info!(user_id = id, "Deleted user");
                Ok(result.rows_affected > 0)
            }
            DeletePolicy::Cascade => {
                let txn = self.conn.begin().await?;

                let removed = BehaviorRecords::delete_many()
                    .filter(references)
                    .exec(&txn)
                    .await?;
                let result = Users::delete_by_id(id).exec(&txn).await?;

                txn.commit().await?;

                info!(
                    user_id = id,
                    records = removed.rows_affected,
                    "Deleted user and their behavior records"
                );
                Ok(result.rows_affected > 0)
            }
        }
    }
}

/// Records naming the user as either student or recorder.
fn referencing(user_id: i32) -> Condition {
    Condition::any()
        .add(behavior_records::Column::StudentId.eq(user_id))
        .add(behavior_records::Column::RecordedById.eq(user_id))
}
