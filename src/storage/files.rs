use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::FileRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Store a file record and update the owner index
    pub fn put_file(&self, file: &FileRecord) -> Result<(), DatabaseError> {
        debug_assert!(!file.id.is_empty(), "file id must not be empty");
        debug_assert!(!file.owner_id.is_empty(), "file owner must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(FILES)?;
            let data = rmp_serde::to_vec_named(file)?;
            table.insert(file.id.as_str(), data.as_slice())?;

            let mut owner_table = write_txn.open_table(OWNER_FILES)?;
            let mut file_ids: Vec<String> = owner_table
                .get(file.owner_id.as_str())?
                .map(|v| rmp_serde::from_slice(v.value()).unwrap_or_default())
                .unwrap_or_default();

            if !file_ids.contains(&file.id) {
                file_ids.push(file.id.clone());
                let index_data = rmp_serde::to_vec_named(&file_ids)?;
                owner_table.insert(file.owner_id.as_str(), index_data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a file by its UUID, regardless of owner
    pub fn get_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(id)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Ownership-scoped lookup. A file owned by someone else is
    /// indistinguishable from a nonexistent one.
    pub fn get_file_owned(
        &self,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<FileRecord>, DatabaseError> {
        Ok(self.get_file(id)?.filter(|f| f.owner_id == owner_id))
    }

    /// Get all files for an owner via the owner index
    pub fn get_files_by_owner(&self, owner_id: &str) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let owner_table = read_txn.open_table(OWNER_FILES)?;
        let files_table = read_txn.open_table(FILES)?;

        let file_ids: Vec<String> = match owner_table.get(owner_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut files = Vec::new();
        for file_id in file_ids {
            if let Some(data) = files_table.get(file_id.as_str())? {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                files.push(file);
            }
        }

        Ok(files)
    }

    /// List files ordered by upload date, optionally restricted to an owner
    /// and filtered by a case-insensitive substring match on filename.
    pub fn list_files(
        &self,
        owner_id: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<FileRecord>, DatabaseError> {
        // Use the owner index when an owner is given
        let mut files = match owner_id {
            Some(owner) => self.get_files_by_owner(owner)?,
            None => {
                let read_txn = self.begin_read()?;
                let table = read_txn.open_table(FILES)?;
                let mut all = Vec::new();
                for result in table.iter()? {
                    let (_, value) = result?;
                    let file: FileRecord = rmp_serde::from_slice(value.value())?;
                    all.push(file);
                }
                all
            }
        };

        if let Some(term) = search {
            let term = term.to_lowercase();
            files.retain(|f| f.filename.to_lowercase().contains(&term));
        }

        files.sort_by(|a, b| {
            a.upload_date
                .cmp(&b.upload_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(files)
    }

    /// Update a file's filename and path together after a rename.
    /// Returns false when the file does not exist.
    pub fn rename_file(
        &self,
        id: &str,
        filename: &str,
        file_path: &str,
    ) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(FILES)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let file: FileRecord = rmp_serde::from_slice(data.value())?;
                    Some(file)
                }
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut file) => {
                file.filename = filename.to_string();
                file.file_path = file_path.to_string();

                let serialized = rmp_serde::to_vec_named(&file)?;
                let mut table = write_txn.open_table(FILES)?;
                table.insert(id, serialized.as_slice())?;
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a file by its UUID and clean up the owner index.
    /// Returns the deleted record.
    pub fn delete_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(FILES)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let file: FileRecord = rmp_serde::from_slice(data.value())?;
                    Some(file)
                }
                None => None,
            };
            result
        };

        if let Some(ref file) = existing {
            {
                let mut table = write_txn.open_table(FILES)?;
                table.remove(id)?;
            }

            let file_ids: Option<Vec<String>> = {
                let owner_table = write_txn.open_table(OWNER_FILES)?;
                let result = match owner_table.get(file.owner_id.as_str())? {
                    Some(data) => Some(rmp_serde::from_slice(data.value())?),
                    None => None,
                };
                result
            };

            if let Some(mut ids) = file_ids {
                ids.retain(|fid| fid != id);
                let mut owner_table = write_txn.open_table(OWNER_FILES)?;
                if ids.is_empty() {
                    owner_table.remove(file.owner_id.as_str())?;
                } else {
                    let new_data = rmp_serde::to_vec_named(&ids)?;
                    owner_table.insert(file.owner_id.as_str(), new_data.as_slice())?;
                }
            }
        }

        write_txn.commit()?;
        Ok(existing)
    }
}
