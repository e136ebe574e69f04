//! CSV spreadsheet record store
//!
//! One row per finalized record. A new sheet gets the canonical columns in
//! canonical order. Sheets exported or edited by hand often carry Portuguese
//! or reordered headers, so both reading and appending map known header
//! aliases onto the canonical names.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use fs2::FileExt;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{RecordRow, TransactionRecord};
use crate::parsers::fold;
use crate::ports::RecordStore;

/// Maximum attempts at taking the file lock
const MAX_LOCK_RETRIES: u32 = 5;

/// Initial lock retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Header aliases, indexed like [`RecordRow::COLUMNS`]
const HEADER_ALIASES: [&[&str]; 12] = [
    &["id", "identificador"],
    &["timestamp", "criado_em", "data_hora"],
    &["kind", "tipo"],
    &["amount", "valor"],
    &["currency", "moeda"],
    &["category", "categoria", "origem", "categoria_origem"],
    &["description", "descricao"],
    &["payment_method", "forma_pagamento", "pagamento", "metodo"],
    &["competence_date", "data_competencia", "data"],
    &["confidence", "confianca"],
    &["confirmed", "confirmado"],
    &["original_text", "texto_original", "mensagem"],
];

/// Canonical column index for a sheet header
fn canonical_index(header: &str) -> Option<usize> {
    let key = fold(header).replace([' ', '-'], "_");
    HEADER_ALIASES
        .iter()
        .position(|aliases| aliases.contains(&key.as_str()))
}

/// Take an exclusive lock, backing off while another writer holds it
fn lock_exclusive_with_retry(file: &File, path: &Path) -> Result<()> {
    let mut attempt = 0;
    loop {
        match FileExt::try_lock_exclusive(file) {
            Ok(()) => return Ok(()),
            Err(e) if attempt + 1 < MAX_LOCK_RETRIES => {
                let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                debug!(
                    path = %path.display(),
                    attempt = attempt + 1,
                    "record sheet busy, retrying in {}ms: {}",
                    delay.as_millis(),
                    e
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => {
                return Err(Error::persistence(format!(
                    "could not lock {} after {} attempts: {}",
                    path.display(),
                    MAX_LOCK_RETRIES,
                    e
                )))
            }
        }
    }
}

/// Record store backed by a CSV file
pub struct CsvRecordStore {
    path: PathBuf,
}

impl CsvRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first when the file is new.
    ///
    /// An existing sheet keeps its own header: values go under the columns
    /// the header names, and columns with no canonical match stay empty.
    pub fn append_row(&self, row: &RecordRow) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        lock_exclusive_with_retry(&file, &self.path)?;

        let result = Self::write_row(&file, row);
        let unlocked = FileExt::unlock(&file);
        result?;
        unlocked?;
        Ok(())
    }

    fn write_row(file: &File, row: &RecordRow) -> Result<()> {
        let len = file.metadata()?.len();
        if len == 0 {
            let mut writer = csv::Writer::from_writer(file);
            writer.serialize(row)?;
            writer.flush()?;
            return Ok(());
        }

        let mapping = Self::header_mapping(file)?;
        if mapping.iter().all(Option::is_none) {
            return Err(Error::persistence(
                "record sheet has no recognizable headers, refusing to append",
            ));
        }

        let columns = row.columns();
        let values: Vec<&str> = mapping
            .iter()
            .map(|index| index.map_or("", |i| columns[i]))
            .collect();

        let mut file = file;
        if !Self::ends_with_newline(file, len)? {
            file.write_all(b"\n")?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(&values)?;
        writer.flush()?;
        Ok(())
    }

    /// Canonical index of every column in the sheet's header row
    fn header_mapping(file: &File) -> Result<Vec<Option<usize>>> {
        let mut file = file;
        file.seek(SeekFrom::Start(0))?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        Ok(reader.headers()?.iter().map(canonical_index).collect())
    }

    fn ends_with_newline(file: &File, len: u64) -> Result<bool> {
        let mut file = file;
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }

    /// Read all rows. A missing file is an empty sheet.
    pub fn read_rows(&self) -> Result<Vec<RecordRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        FileExt::lock_shared(&file)?;
        let result = Self::parse_rows(&file);
        let unlocked = FileExt::unlock(&file);
        let rows = result?;
        unlocked?;
        Ok(rows)
    }

    fn parse_rows(file: &File) -> Result<Vec<RecordRow>> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

        let mapping: Vec<Option<usize>> = reader.headers()?.iter().map(canonical_index).collect();
        if mapping.iter().all(Option::is_none) {
            warn!("record sheet has no recognizable headers");
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut columns: [String; 12] = Default::default();
            for (position, value) in record.iter().enumerate() {
                if let Some(Some(index)) = mapping.get(position) {
                    columns[*index] = value.trim().to_string();
                }
            }
            rows.push(RecordRow::from_columns(columns));
        }
        Ok(rows)
    }
}

#[async_trait]
impl RecordStore for CsvRecordStore {
    async fn append_record(&self, record: &TransactionRecord) -> Result<()> {
        let row = record.to_row();
        let store = CsvRecordStore::new(self.path.clone());
        tokio::task::spawn_blocking(move || store.append_row(&row))
            .await
            .map_err(|e| Error::persistence(format!("append task failed: {e}")))?
    }

    async fn list_records(&self) -> Result<Vec<RecordRow>> {
        let store = CsvRecordStore::new(self.path.clone());
        tokio::task::spawn_blocking(move || store.read_rows())
            .await
            .map_err(|e| Error::persistence(format!("read task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_header_aliases() {
        assert_eq!(canonical_index("amount"), Some(3));
        assert_eq!(canonical_index("Valor"), Some(3));
        assert_eq!(canonical_index("Data Competência"), Some(8));
        assert_eq!(canonical_index("Descrição"), Some(6));
        assert_eq!(canonical_index("observacoes"), None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path().join("nada.csv"));
        assert!(store.read_rows().unwrap().is_empty());
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lancamentos.csv");
        let store = CsvRecordStore::new(&path);

        let row = RecordRow {
            id: "a".to_string(),
            kind: "expense".to_string(),
            amount: "-10.00".to_string(),
            ..Default::default()
        };
        store.append_row(&row).unwrap();
        store.append_row(&RecordRow { id: "b".to_string(), ..row.clone() }).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("payment_method").count(), 1);
        assert!(content.starts_with("id,timestamp,kind,amount,currency,category"));

        let rows = store.read_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id, "b");
        assert_eq!(rows[1].amount, "-10.00");
    }

    #[test]
    fn test_reads_portuguese_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planilha.csv");
        std::fs::write(
            &path,
            "Tipo,Valor,Categoria,Data Competência,Observações\n\
             despesa,-25.00,Mercado,2026-10-01,feira\n",
        )
        .unwrap();

        let rows = CsvRecordStore::new(&path).read_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "despesa");
        assert_eq!(rows[0].amount, "-25.00");
        assert_eq!(rows[0].category, "Mercado");
        assert_eq!(rows[0].competence_date, "2026-10-01");
        assert!(rows[0].id.is_empty());
    }

    #[test]
    fn test_append_follows_existing_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planilha.csv");
        std::fs::write(
            &path,
            "Tipo,Valor,Categoria,Data Competência,Observações\n\
             expense,-25.00,Mercado,2026-10-01,feira\n",
        )
        .unwrap();

        let store = CsvRecordStore::new(&path);
        store
            .append_row(&RecordRow {
                id: "novo".to_string(),
                kind: "expense".to_string(),
                amount: "-50.00".to_string(),
                category: "Transporte".to_string(),
                competence_date: "2026-10-18".to_string(),
                ..Default::default()
            })
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("expense,-50.00,Transporte,2026-10-18,\n"));

        let rows = store.read_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].kind, "expense");
        assert_eq!(rows[1].amount, "-50.00");
        assert_eq!(rows[1].category, "Transporte");
        assert_eq!(rows[1].competence_date, "2026-10-18");
    }

    #[test]
    fn test_append_after_row_without_trailing_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planilha.csv");
        std::fs::write(&path, "valor,tipo\n-10.00,expense").unwrap();

        let store = CsvRecordStore::new(&path);
        store
            .append_row(&RecordRow {
                kind: "income".to_string(),
                amount: "30.00".to_string(),
                ..Default::default()
            })
            .unwrap();

        let rows = store.read_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, "-10.00");
        assert_eq!(rows[1].amount, "30.00");
        assert_eq!(rows[1].kind, "income");
    }

    #[test]
    fn test_append_refuses_unrecognized_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("outra.csv");
        std::fs::write(&path, "foo,bar\n1,2\n").unwrap();

        let err = CsvRecordStore::new(&path)
            .append_row(&RecordRow::default())
            .unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "foo,bar\n1,2\n");
    }
}
