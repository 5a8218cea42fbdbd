use axum::extract::multipart::{Multipart, MultipartError};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, TransactionTrait};
use tracing::{debug, info};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::{ImportReport, NewMovie},
    validate::{Row, validate_row},
};

pub const CSV_FIELD: &str = "csv_file";
pub const MISSING_FILE: &str = "Please upload a CSV file.";

const INSERT_CHUNK: usize = 1000;
const MIB: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Clone, Debug, Default)]
pub struct ParsedUpload {
    pub movies: Vec<NewMovie>,
    /// One `Row N: ...` entry per rejected row.
    pub errors: Vec<String>,
}

/// Pulls the `csv_file` part out of a multipart body, enforcing the name and size checks
/// before any content is parsed. Reading stops as soon as the size limit is crossed.
pub async fn read_csv_upload(multipart: &mut Multipart, limit: usize) -> AppResult<Vec<u8>> {
    while let Some(mut field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some(CSV_FIELD) || field.file_name().is_none() {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !file_name.ends_with(".csv") {
            return Err(AppError::bad_request("Uploaded file is not a CSV file."));
        }

        let mut buf = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
            if buf.len() + chunk.len() > limit {
                debug!(file_name = %file_name, limit, "upload over size limit");
                return Err(AppError::bad_request(format!(
                    "File size exceeds the limit of {}.",
                    describe_limit(limit)
                )));
            }
            buf.extend_from_slice(&chunk);
        }

        debug!(file_name = %file_name, bytes = buf.len(), "received csv upload");
        return Ok(buf);
    }

    Err(AppError::bad_request(MISSING_FILE))
}

/// Decodes and validates every data row. Row failures are collected, never returned as `Err`;
/// only undecodable text or a broken CSV stream aborts.
pub fn parse_csv(bytes: &[u8]) -> Result<ParsedUpload, ParseError> {
    let text = std::str::from_utf8(bytes)?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut parsed = ParsedUpload::default();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        // Cells past the end of a short record are null, not absent.
        let row: Row<'_> =
            headers.iter().enumerate().map(|(i, header)| (header, record.get(i))).collect();
        match validate_row(&row) {
            Ok(movie) => parsed.movies.push(movie),
            Err(errors) => parsed.errors.push(format!("Row {}: {errors}", index + 1)),
        }
    }

    Ok(parsed)
}

/// Inserts all rows in batches. Returns the number of rows written.
pub async fn insert_movies(db: &DatabaseConnection, movies: &[NewMovie]) -> Result<usize, DbErr> {
    if movies.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;
    for chunk in movies.chunks(INSERT_CHUNK) {
        movie::Entity::insert_many(chunk.iter().cloned().map(movie::ActiveModel::from))
            .exec(&txn)
            .await?;
    }
    txn.commit().await?;

    Ok(movies.len())
}

pub async fn import_csv(db: &DatabaseConnection, bytes: Vec<u8>) -> AppResult<ImportReport> {
    let parsed = tokio::task::spawn_blocking(move || parse_csv(&bytes))
        .await
        .map_err(anyhow::Error::new)?
        .map_err(|err| AppError::bad_request(format!("CSV parsing error: {err}")))?;

    let created = insert_movies(db, &parsed.movies).await?;
    info!(created, rejected = parsed.errors.len(), "imported movies");

    Ok(ImportReport::success(created, parsed.errors))
}

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
}

fn describe_limit(limit: usize) -> String {
    if limit >= MIB && limit % MIB == 0 {
        format!("{} MB", limit / MIB)
    } else {
        format!("{limit} bytes")
    }
}
