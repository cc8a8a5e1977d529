//! Columnar output and the bounded-batch vote sink.
//!
//! The per-member ballot files run to hundreds of thousands of rows, so
//! votes are never fully materialized: [`VoteSink`] accepts one record
//! at a time, writes the row-oriented CSV immediately and the columnar
//! file in bounded batches. The batch threshold tunes memory and IO
//! only; output content and order do not depend on it.

use crate::core::error::HemicycleError;
use crate::core::model::{Motion, Vote, VoteEvent};
use crate::core::table::encode_array;
use arrow::array::{ArrayRef, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

/// Flush-threshold buffer. `push` hands back a full batch when the
/// threshold is reached; `drain` returns whatever remains. Callers own
/// the final drain, which must happen on every exit path.
pub struct Batched<T> {
    buf: Vec<T>,
    threshold: usize,
}

impl<T> Batched<T> {
    pub fn new(threshold: usize) -> Self {
        Batched {
            buf: Vec::new(),
            threshold: threshold.max(1),
        }
    }

    pub fn push(&mut self, item: T) -> Option<Vec<T>> {
        self.buf.push(item);
        if self.buf.len() >= self.threshold {
            Some(std::mem::take(&mut self.buf))
        } else {
            None
        }
    }

    pub fn drain(&mut self) -> Vec<T> {
        std::mem::take(&mut self.buf)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

fn utf8_field(name: &str, nullable: bool) -> Field {
    Field::new(name, DataType::Utf8, nullable)
}

fn votes_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        utf8_field("vote_event_id", false),
        utf8_field("voter_id", false),
        utf8_field("option", false),
    ]))
}

fn create_file(path: &Path) -> Result<File, HemicycleError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Combined row-oriented + columnar vote writer.
pub struct VoteSink {
    csv: csv::Writer<File>,
    parquet: ArrowWriter<File>,
    schema: Arc<Schema>,
    batch: Batched<Vote>,
}

impl VoteSink {
    pub fn create(
        csv_path: &Path,
        parquet_path: &Path,
        batch_size: usize,
    ) -> Result<Self, HemicycleError> {
        if let Some(parent) = csv_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let csv = csv::Writer::from_path(csv_path)?;
        let schema = votes_schema();
        let parquet = ArrowWriter::try_new(create_file(parquet_path)?, schema.clone(), None)?;
        Ok(VoteSink {
            csv,
            parquet,
            schema,
            batch: Batched::new(batch_size),
        })
    }

    pub fn push(&mut self, vote: Vote) -> Result<(), HemicycleError> {
        self.csv.serialize(&vote)?;
        if let Some(full) = self.batch.push(vote) {
            self.write_columnar(&full)?;
        }
        Ok(())
    }

    fn write_columnar(&mut self, votes: &[Vote]) -> Result<(), HemicycleError> {
        let mut event_ids = StringBuilder::new();
        let mut voter_ids = StringBuilder::new();
        let mut options = StringBuilder::new();
        for v in votes {
            event_ids.append_value(&v.vote_event_id);
            voter_ids.append_value(&v.voter_id);
            options.append_value(v.option.as_str());
        }
        let columns: Vec<ArrayRef> = vec![
            Arc::new(event_ids.finish()),
            Arc::new(voter_ids.finish()),
            Arc::new(options.finish()),
        ];
        let batch = RecordBatch::try_new(self.schema.clone(), columns)?;
        self.parquet.write(&batch)?;
        Ok(())
    }

    /// Flush the trailing partial batch and close both writers.
    pub fn finish(mut self) -> Result<(), HemicycleError> {
        let rest = self.batch.drain();
        if !rest.is_empty() {
            self.write_columnar(&rest)?;
        }
        self.csv.flush()?;
        self.parquet.close()?;
        Ok(())
    }
}

/// Columnar vote-events table. Nested `sources` is JSON text at this
/// storage boundary; `extras` flattens into its three scalar columns.
pub fn write_vote_events_parquet(
    path: &Path,
    events: &[VoteEvent],
) -> Result<(), HemicycleError> {
    let schema = Arc::new(Schema::new(vec![
        utf8_field("id", false),
        utf8_field("identifier", false),
        utf8_field("motion_id", false),
        utf8_field("organization_id", false),
        utf8_field("sitting_number", true),
        utf8_field("voting_number", true),
        utf8_field("agenda_item_number", true),
        utf8_field("start_date", true),
        utf8_field("result", true),
        utf8_field("sources", false),
    ]));
    let mut cols: Vec<StringBuilder> = (0..10).map(|_| StringBuilder::new()).collect();
    for e in events {
        cols[0].append_value(&e.id);
        cols[1].append_value(&e.identifier);
        cols[2].append_value(&e.motion_id);
        cols[3].append_value(&e.organization_id);
        cols[4].append_option(e.extras.sitting_number.as_deref());
        cols[5].append_option(e.extras.voting_number.as_deref());
        cols[6].append_option(e.extras.agenda_item_number.as_deref());
        cols[7].append_option(e.start_date.as_deref());
        cols[8].append_option(e.result.map(|r| r.as_str()));
        cols[9].append_value(encode_array(&e.sources)?);
    }
    write_single_batch(path, schema, cols)
}

/// Columnar motions table, same boundary encoding as vote-events.
pub fn write_motions_parquet(path: &Path, motions: &[Motion]) -> Result<(), HemicycleError> {
    let schema = Arc::new(Schema::new(vec![
        utf8_field("id", false),
        utf8_field("identifier", false),
        utf8_field("organization_id", false),
        utf8_field("sitting_number", true),
        utf8_field("voting_number", true),
        utf8_field("agenda_item_number", true),
        utf8_field("date", true),
        utf8_field("text", true),
        utf8_field("result", true),
        utf8_field("sources", false),
    ]));
    let mut cols: Vec<StringBuilder> = (0..10).map(|_| StringBuilder::new()).collect();
    for m in motions {
        cols[0].append_value(&m.id);
        cols[1].append_value(&m.identifier);
        cols[2].append_value(&m.organization_id);
        cols[3].append_option(m.extras.sitting_number.as_deref());
        cols[4].append_option(m.extras.voting_number.as_deref());
        cols[5].append_option(m.extras.agenda_item_number.as_deref());
        cols[6].append_option(m.date.as_deref());
        cols[7].append_option(m.text.as_deref());
        cols[8].append_option(m.result.map(|r| r.as_str()));
        cols[9].append_value(encode_array(&m.sources)?);
    }
    write_single_batch(path, schema, cols)
}

fn write_single_batch(
    path: &Path,
    schema: Arc<Schema>,
    builders: Vec<StringBuilder>,
) -> Result<(), HemicycleError> {
    let columns: Vec<ArrayRef> = builders
        .into_iter()
        .map(|mut b| Arc::new(b.finish()) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let mut writer = ArrowWriter::try_new(create_file(path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
