use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::UserRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Store a user record and update the username and email indexes.
    /// Fails with `Duplicate` if either index key already maps to a
    /// different user; redb is single-writer, so the check and the insert
    /// are atomic and the indexes can never alias two accounts.
    pub fn put_user(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        debug_assert!(!user.id.is_empty(), "user id must not be empty");
        debug_assert!(!user.username.is_empty(), "username must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut name_table = write_txn.open_table(USER_NAMES)?;
            if let Some(existing) = name_table.get(user.username.as_str())? {
                if existing.value() != user.id {
                    return Err(DatabaseError::Duplicate(user.username.clone()));
                }
            }

            let mut email_table = write_txn.open_table(USER_EMAILS)?;
            if let Some(existing) = email_table.get(user.email.as_str())? {
                if existing.value() != user.id {
                    return Err(DatabaseError::Duplicate(user.email.clone()));
                }
            }

            let mut table = write_txn.open_table(USERS)?;
            let data = rmp_serde::to_vec_named(user)?;
            table.insert(user.id.as_str(), data.as_slice())?;

            name_table.insert(user.username.as_str(), user.id.as_str())?;
            email_table.insert(user.email.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a user by their UUID
    pub fn get_user(&self, id: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(id)? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Get a user by username (resolves username -> uuid -> user)
    pub fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let name_table = read_txn.open_table(USER_NAMES)?;

        let id = match name_table.get(username)? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        let users_table = read_txn.open_table(USERS)?;
        match users_table.get(id.as_str())? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Check whether a username or an email is already taken.
    /// `exclude_id`, when set, ignores matches belonging to that user
    /// (used when re-checking on profile update).
    pub fn credentials_in_use(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;

        if let Some(username) = username {
            let name_table = read_txn.open_table(USER_NAMES)?;
            if let Some(id) = name_table.get(username)? {
                if Some(id.value()) != exclude_id {
                    return Ok(true);
                }
            }
        }

        if let Some(email) = email {
            let email_table = read_txn.open_table(USER_EMAILS)?;
            if let Some(id) = email_table.get(email)? {
                if Some(id.value()) != exclude_id {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Update a user's mutable fields, keeping the username and email indexes
    /// in step. Fails with `Duplicate` if a new username or email already
    /// maps to another user. Returns false when the user does not exist.
    pub fn update_user(
        &self,
        id: &str,
        username: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(USERS)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let user: UserRecord = rmp_serde::from_slice(data.value())?;
                    Some(user)
                }
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut user) => {
                if let Some(new_username) = username {
                    if new_username != user.username {
                        let mut name_table = write_txn.open_table(USER_NAMES)?;
                        if let Some(existing) = name_table.get(new_username)? {
                            if existing.value() != id {
                                return Err(DatabaseError::Duplicate(new_username.to_string()));
                            }
                        }
                        name_table.remove(user.username.as_str())?;
                        name_table.insert(new_username, id)?;
                        user.username = new_username.to_string();
                    }
                }
                if let Some(new_email) = email {
                    if new_email != user.email {
                        let mut email_table = write_txn.open_table(USER_EMAILS)?;
                        if let Some(existing) = email_table.get(new_email)? {
                            if existing.value() != id {
                                return Err(DatabaseError::Duplicate(new_email.to_string()));
                            }
                        }
                        email_table.remove(user.email.as_str())?;
                        email_table.insert(new_email, id)?;
                        user.email = new_email.to_string();
                    }
                }
                if let Some(new_hash) = password_hash {
                    user.password_hash = new_hash.to_string();
                }

                let serialized = rmp_serde::to_vec_named(&user)?;
                let mut table = write_txn.open_table(USERS)?;
                table.insert(id, serialized.as_slice())?;
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a user by their UUID and clean up the username and email
    /// indexes. Returns the deleted record.
    pub fn delete_user(&self, id: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(USERS)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let user: UserRecord = rmp_serde::from_slice(data.value())?;
                    Some(user)
                }
                None => None,
            };
            result
        };

        if let Some(ref user) = existing {
            {
                let mut table = write_txn.open_table(USERS)?;
                table.remove(id)?;
            }
            {
                let mut name_table = write_txn.open_table(USER_NAMES)?;
                name_table.remove(user.username.as_str())?;
            }
            {
                let mut email_table = write_txn.open_table(USER_EMAILS)?;
                email_table.remove(user.email.as_str())?;
            }
        }

        write_txn.commit()?;
        Ok(existing)
    }

    /// List users ordered by join date, optionally filtered by a
    /// case-insensitive substring match on username or email.
    pub fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        let mut users = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let user: UserRecord = rmp_serde::from_slice(value.value())?;
            users.push(user);
        }

        if let Some(term) = search {
            let term = term.to_lowercase();
            users.retain(|u| {
                u.username.to_lowercase().contains(&term)
                    || u.email.to_lowercase().contains(&term)
            });
        }

        users.sort_by(|a, b| {
            a.joined_date
                .cmp(&b.joined_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(users)
    }
}
