//! Turns an id-or-name reference into one verified record id.
//!
//! A reference made only of ASCII digits is an id; anything else is a display
//! name. Ids are expected to be unique, so more than one match on an id is
//! reported as [`AppError::AmbiguousId`] (corrupt data). Display names are not
//! unique, so more than one match on a name is [`AppError::AmbiguousName`].

use std::future::Future;

use super::tables::{parse_digits, quote_ident, TableDescriptor};
use super::PgStore;
use crate::constants::ERR_BLANK_REFERENCE;
use crate::error::{AppError, Result};

/// Read-only queries the resolver needs
pub trait RecordLookup: Sync {
    /// Number of rows whose id column equals `id`
    fn count_by_id(
        &self,
        table: &TableDescriptor,
        id: i64,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Ids of all rows whose display name equals `name`
    fn ids_by_name(
        &self,
        table: &TableDescriptor,
        name: &str,
    ) -> impl Future<Output = Result<Vec<i64>>> + Send;
}

#[derive(Debug, PartialEq, Eq)]
enum Reference<'a> {
    /// All digits; `None` when too large to be any stored id
    Id(Option<i64>),
    Name(&'a str),
}

fn classify(input: &str) -> Result<Reference<'_>> {
    if input.trim().is_empty() {
        return Err(AppError::InvalidInput(ERR_BLANK_REFERENCE.to_string()));
    }
    if input.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Reference::Id(parse_digits(input)));
    }
    Ok(Reference::Name(input))
}

/// Resolve `input` against `table` to exactly one record id
pub async fn resolve<L: RecordLookup>(
    lookup: &L,
    input: &str,
    table: &TableDescriptor,
) -> Result<i64> {
    match classify(input)? {
        Reference::Id(None) => {
            tracing::debug!("Reference {} in '{}' is out of id range", input, table.name);
            Err(AppError::not_found_id(table.entity, input))
        }
        Reference::Id(Some(id)) => {
            tracing::debug!("Verifying {} with ID = {} in '{}'", table.entity, id, table.name);
            match lookup.count_by_id(table, id).await? {
                0 => Err(AppError::not_found_id(table.entity, id)),
                1 => Ok(id),
                _ => Err(AppError::AmbiguousId {
                    entity: table.entity,
                    id,
                }),
            }
        }
        Reference::Name(name) => {
            tracing::debug!(
                "Verifying {} with NAME = {} in '{}'",
                table.entity,
                name,
                table.name
            );
            let ids = lookup.ids_by_name(table, name).await?;
            match ids.as_slice() {
                [] => Err(AppError::not_found_name(table.entity, name)),
                [id] => Ok(*id),
                _ => Err(AppError::AmbiguousName {
                    entity: table.entity,
                    name: name.to_string(),
                }),
            }
        }
    }
}

impl RecordLookup for PgStore {
    async fn count_by_id(&self, table: &TableDescriptor, id: i64) -> Result<i64> {
        let overlay = self.schema().shared();
        let sql = format!(
            "SELECT count(*) FROM {} WHERE {} = $1",
            overlay.qualified(table.name),
            quote_ident(table.id_column)
        );

        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    async fn ids_by_name(&self, table: &TableDescriptor, name: &str) -> Result<Vec<i64>> {
        let overlay = self.schema().shared();
        let sql = format!(
            "SELECT {id} FROM {table} WHERE {name} = $1 ORDER BY {id}",
            id = quote_ident(table.id_column),
            table = overlay.qualified(table.name),
            name = quote_ident(table.display_name_column),
        );

        let ids = sqlx::query_scalar::<_, i64>(&sql)
            .bind(name)
            .fetch_all(self.pool())
            .await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tables::{MAPS, USERS};

    /// In-memory table of (id, display name) rows
    struct Rows(Vec<(i64, &'static str)>);

    impl RecordLookup for Rows {
        async fn count_by_id(&self, _table: &TableDescriptor, id: i64) -> Result<i64> {
            Ok(self.0.iter().filter(|(row_id, _)| *row_id == id).count() as i64)
        }

        async fn ids_by_name(&self, _table: &TableDescriptor, name: &str) -> Result<Vec<i64>> {
            Ok(self
                .0
                .iter()
                .filter(|(_, row_name)| *row_name == name)
                .map(|(id, _)| *id)
                .collect())
        }
    }

    struct Unavailable;

    impl RecordLookup for Unavailable {
        async fn count_by_id(&self, _table: &TableDescriptor, _id: i64) -> Result<i64> {
            Err(sqlx::Error::PoolTimedOut.into())
        }

        async fn ids_by_name(&self, _table: &TableDescriptor, _name: &str) -> Result<Vec<i64>> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
    }

    #[tokio::test]
    async fn test_resolves_by_id_and_name() {
        let rows = Rows(vec![(5, "alpha")]);
        assert_eq!(resolve(&rows, "5", &MAPS).await.unwrap(), 5);
        assert_eq!(resolve(&rows, "alpha", &MAPS).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let rows = Rows(vec![]);
        assert!(matches!(
            resolve(&rows, "5", &MAPS).await,
            Err(AppError::NotFound { entity: "map", .. })
        ));
        assert!(matches!(
            resolve(&rows, "alpha", &USERS).await,
            Err(AppError::NotFound { entity: "user", .. })
        ));
    }

    #[tokio::test]
    async fn test_blank_input_is_invalid() {
        let rows = Rows(vec![(5, "alpha")]);
        for input in ["", " ", "\t\n"] {
            assert!(matches!(
                resolve(&rows, input, &MAPS).await,
                Err(AppError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_duplicate_names_are_ambiguous() {
        let rows = Rows(vec![(1, "dup"), (2, "dup")]);
        assert!(matches!(
            resolve(&rows, "dup", &MAPS).await,
            Err(AppError::AmbiguousName { .. })
        ));
        assert_eq!(resolve(&rows, "1", &MAPS).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_integrity_errors() {
        let rows = Rows(vec![(3, "a"), (3, "b")]);
        assert!(matches!(
            resolve(&rows, "3", &MAPS).await,
            Err(AppError::AmbiguousId { id: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_numeric_boundaries() {
        let rows = Rows(vec![(7, "-7"), (8, "+8"), (9, " 9"), (10, "1e1")]);

        // leading zeros still address the id
        assert_eq!(resolve(&rows, "007", &MAPS).await.unwrap(), 7);

        // signed, padded or exponent forms are names
        assert_eq!(resolve(&rows, "-7", &MAPS).await.unwrap(), 7);
        assert_eq!(resolve(&rows, "+8", &MAPS).await.unwrap(), 8);
        assert_eq!(resolve(&rows, " 9", &MAPS).await.unwrap(), 9);
        assert_eq!(resolve(&rows, "1e1", &MAPS).await.unwrap(), 10);

        // digits beyond i64 cannot name a row
        assert!(matches!(
            resolve(&rows, "99999999999999999999", &MAPS).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        assert!(matches!(
            resolve(&Unavailable, "5", &MAPS).await,
            Err(AppError::StoreUnavailable(_))
        ));
        assert!(matches!(
            resolve(&Unavailable, "alpha", &MAPS).await,
            Err(AppError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("42").unwrap(), Reference::Id(Some(42)));
        assert_eq!(classify("4 2").unwrap(), Reference::Name("4 2"));
        assert_eq!(classify("4.2").unwrap(), Reference::Name("4.2"));
    }
}
