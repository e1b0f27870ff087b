// src/db/models/author.rs

//! Authors attached to dataset or feature-model metadata

use crate::error::Result;
use rusqlite::{Connection, Row, params};

/// Where an author row hangs; never both
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorOwner {
    /// `ds_meta_data.id`
    Dataset(i64),
    /// `fm_meta_data.id`
    FeatureModel(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: Option<i64>,
    pub name: String,
    pub affiliation: Option<String>,
    /// ORCID researcher identifier
    pub orcid: Option<String>,
    pub owner: AuthorOwner,
}

impl Author {
    pub fn new(name: String, owner: AuthorOwner) -> Self {
        Self {
            id: None,
            name,
            affiliation: None,
            orcid: None,
            owner,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        let (ds_id, fm_id) = match self.owner {
            AuthorOwner::Dataset(id) => (Some(id), None),
            AuthorOwner::FeatureModel(id) => (None, Some(id)),
        };

        conn.execute(
            "INSERT INTO author (name, affiliation, orcid, ds_meta_data_id, fm_meta_data_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![&self.name, &self.affiliation, &self.orcid, ds_id, fm_id],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Authors of a dataset, in insertion order
    pub fn find_by_dataset_metadata(conn: &Connection, metadata_id: i64) -> Result<Vec<Self>> {
        Self::query(
            conn,
            "SELECT id, name, affiliation, orcid, ds_meta_data_id, fm_meta_data_id
             FROM author WHERE ds_meta_data_id = ?1 ORDER BY id",
            metadata_id,
        )
    }

    /// Authors of one feature model, in insertion order
    pub fn find_by_fm_metadata(conn: &Connection, metadata_id: i64) -> Result<Vec<Self>> {
        Self::query(
            conn,
            "SELECT id, name, affiliation, orcid, ds_meta_data_id, fm_meta_data_id
             FROM author WHERE fm_meta_data_id = ?1 ORDER BY id",
            metadata_id,
        )
    }

    fn query(conn: &Connection, sql: &str, owner_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(sql)?;
        let authors = stmt
            .query_map([owner_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(authors)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let ds_id: Option<i64> = row.get(4)?;
        let fm_id: Option<i64> = row.get(5)?;
        let owner = match (ds_id, fm_id) {
            (Some(id), None) => AuthorOwner::Dataset(id),
            (None, Some(id)) => AuthorOwner::FeatureModel(id),
            _ => {
                return Err(rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Integer,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "author must belong to exactly one metadata record",
                    )),
                ));
            }
        };

        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            affiliation: row.get(2)?,
            orcid: row.get(3)?,
            owner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{DatasetMetadata, PublicationType};

    #[test]
    fn test_authors_keep_order_and_owner() {
        let conn = crate::db::open_in_memory().unwrap();
        let mut metadata = DatasetMetadata::new(
            "T".to_string(),
            "D".to_string(),
            PublicationType::None,
        );
        let md_id = metadata.insert(&conn).unwrap();

        for name in ["Doe, Jane", "Roe, Richard"] {
            let mut author = Author::new(name.to_string(), AuthorOwner::Dataset(md_id));
            author.orcid = Some("0000-0002-1825-0097".to_string());
            author.insert(&conn).unwrap();
        }

        let authors = Author::find_by_dataset_metadata(&conn, md_id).unwrap();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].name, "Doe, Jane");
        assert_eq!(authors[1].owner, AuthorOwner::Dataset(md_id));
        assert!(Author::find_by_fm_metadata(&conn, md_id).unwrap().is_empty());
    }
}
