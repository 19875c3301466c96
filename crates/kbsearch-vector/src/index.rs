//! LanceDB-backed document table: upsert, removal, filtered nearest-neighbour
//! search and statistics.
use anyhow::{anyhow, Result};
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{connect, Connection, DistanceType, Table};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use kbsearch_core::error::Error;
use kbsearch_core::types::{Candidate, ContentRef, ContentType, SourceKind};

use crate::document::{document_id, IndexDocument};
use crate::schema::{documents_schema, RESULT_COLUMNS};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IndexStats {
    pub path: String,
    pub table: String,
    pub dim: usize,
    pub total_documents: usize,
    pub sessions: usize,
    pub segments: usize,
}

pub struct LanceVectorIndex {
    db: Connection,
    uri: String,
    table_name: String,
    dim: usize,
}

fn type_filter(content_type: ContentType) -> String { format!("content_type = '{}'", content_type.as_str()) }

fn quote(id: &str) -> String { format!("'{}'", id.replace('\'', "''")) }

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("{} column missing", name))
}

fn int_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
    batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<Int64Array>()).ok_or_else(|| anyhow!("{} column missing", name))
}

fn opt_str(col: &StringArray, i: usize) -> Option<String> { (!col.is_null(i)).then(|| col.value(i).to_string()) }

impl LanceVectorIndex {
    /// Connect to `uri` and make sure the documents table exists.
    pub async fn open(uri: &str, table_name: &str, dim: usize) -> Result<Self> {
        let db = connect(uri).execute().await?;
        let names = db.table_names().execute().await?;
        if !names.iter().any(|n| n == table_name) {
            let schema = documents_schema(dim);
            let iter = RecordBatchIterator::new(vec![].into_iter(), schema);
            db.create_table(table_name, Box::new(iter)).execute().await?;
            info!(uri, table = table_name, "created documents table");
        }
        Ok(Self { db, uri: uri.to_string(), table_name: table_name.to_string(), dim })
    }

    pub fn dim(&self) -> usize { self.dim }

    async fn table(&self) -> Result<Table> { Ok(self.db.open_table(&self.table_name).execute().await?) }

    /// Insert or replace rows keyed by document id.
    pub async fn upsert(&self, docs: &[IndexDocument], vectors: &[Vec<f32>]) -> Result<usize> {
        if docs.is_empty() { return Ok(0); }
        if docs.len() != vectors.len() {
            return Err(anyhow!("{} documents but {} vectors", docs.len(), vectors.len()));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(anyhow!("vector has {} dims, index expects {}", bad.len(), self.dim));
        }
        let batch = self.to_record_batch(docs, vectors)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let table = self.table().await?;
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let res = mi.execute(reader).await?;
        let written = (res.num_inserted_rows + res.num_updated_rows) as usize;
        debug!(written, "upserted documents");
        Ok(written)
    }

    /// Delete rows by document id. Unknown ids are ignored.
    pub async fn remove(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() { return Ok(()); }
        let list = ids.iter().map(|id| quote(id)).collect::<Vec<_>>().join(", ");
        self.table().await?.delete(&format!("id IN ({})", list)).await?;
        info!(count = ids.len(), "removed documents");
        Ok(())
    }

    /// Delete one session or segment row; `Error::NotFound` when the index
    /// has no such row.
    pub async fn remove_record(&self, content_type: ContentType, id: i64) -> Result<()> {
        let doc_id = document_id(content_type, id);
        if self.table().await?.count_rows(Some(format!("id = {}", quote(&doc_id)))).await? == 0 {
            return Err(Error::NotFound(format!("{} is not in the index", doc_id)).into());
        }
        self.remove(&[doc_id]).await
    }

    /// Document id → content hash for every stored row.
    pub async fn content_hashes(&self) -> Result<HashMap<String, String>> {
        let table = self.table().await?;
        let mut stream = table.query().select(Select::columns(&["id", "content_hash"])).execute().await?;
        let mut out = HashMap::new();
        while let Some(batch) = stream.try_next().await? {
            let ids = string_col(&batch, "id")?;
            let hashes = string_col(&batch, "content_hash")?;
            for i in 0..batch.num_rows() { out.insert(ids.value(i).to_string(), hashes.value(i).to_string()); }
        }
        Ok(out)
    }

    pub async fn count(&self, content_type: Option<ContentType>) -> Result<usize> {
        Ok(self.table().await?.count_rows(content_type.map(type_filter)).await?)
    }

    /// Nearest neighbours of `vector` by cosine distance; score is
    /// `1 - distance` clamped to `[0, 1]`.
    pub async fn search(&self, vector: Vec<f32>, limit: usize, content_type: Option<ContentType>) -> Result<Vec<Candidate>> {
        if limit == 0 || self.count(None).await? == 0 { return Ok(Vec::new()); }
        let table = self.table().await?;
        let mut query = table.vector_search(vector)?.distance_type(DistanceType::Cosine).select(Select::columns(RESULT_COLUMNS)).limit(limit);
        if let Some(ct) = content_type { query = query.only_if(type_filter(ct)); }
        let mut stream = query.execute().await?;
        let mut out = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            out.extend(batch_to_candidates(&batch)?);
        }
        out.truncate(limit);
        Ok(out)
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            path: self.uri.clone(),
            table: self.table_name.clone(),
            dim: self.dim,
            total_documents: self.count(None).await?,
            sessions: self.count(Some(ContentType::Session)).await?,
            segments: self.count(Some(ContentType::Segment)).await?,
        })
    }

    fn to_record_batch(&self, docs: &[IndexDocument], vectors: &[Vec<f32>]) -> Result<RecordBatch> {
        let vectors: Vec<Option<Vec<Option<f32>>>> = vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect())).collect();
        let batch = RecordBatch::try_new(
            documents_schema(self.dim),
            vec![
                Arc::new(StringArray::from(docs.iter().map(|d| d.id.clone()).collect::<Vec<_>>())),
                Arc::new(StringArray::from(docs.iter().map(|d| d.content_type.as_str()).collect::<Vec<_>>())),
                Arc::new(Int64Array::from(docs.iter().map(|d| d.session_id).collect::<Vec<_>>())),
                Arc::new(Int64Array::from(docs.iter().map(|d| d.segment_id).collect::<Vec<_>>())),
                Arc::new(StringArray::from(docs.iter().map(|d| d.title.clone()).collect::<Vec<_>>())),
                Arc::new(StringArray::from(docs.iter().map(|d| d.session_title.clone()).collect::<Vec<_>>())),
                Arc::new(StringArray::from(docs.iter().map(|d| d.segment_type.clone()).collect::<Vec<_>>())),
                Arc::new(StringArray::from(docs.iter().map(|d| d.tags.clone()).collect::<Vec<_>>())),
                Arc::new(StringArray::from(docs.iter().map(|d| d.tag_categories.clone()).collect::<Vec<_>>())),
                Arc::new(StringArray::from(docs.iter().map(|d| d.date.clone()).collect::<Vec<_>>())),
                Arc::new(StringArray::from(docs.iter().map(|d| d.content.clone()).collect::<Vec<_>>())),
                Arc::new(StringArray::from(docs.iter().map(|d| d.content_hash.clone()).collect::<Vec<_>>())),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), self.dim as i32)),
            ],
        )?;
        Ok(batch)
    }
}

fn batch_to_candidates(batch: &RecordBatch) -> Result<Vec<Candidate>> {
    let content_types = string_col(batch, "content_type")?;
    let session_ids = int_col(batch, "session_id")?;
    let segment_ids = int_col(batch, "segment_id")?;
    let titles = string_col(batch, "title")?;
    let session_titles = string_col(batch, "session_title")?;
    let segment_types = string_col(batch, "segment_type")?;
    let tags = string_col(batch, "tags")?;
    let tag_categories = string_col(batch, "tag_categories")?;
    let dates = string_col(batch, "date")?;
    let contents = string_col(batch, "content")?;
    let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let score = distances.map_or(0.0, |d| (1.0 - d.value(i)).clamp(0.0, 1.0));
        let session_id = session_ids.value(i);
        let session_title = session_titles.value(i);
        let candidate = match ContentType::parse(content_types.value(i)) {
            Some(ContentType::Session) => Candidate::new(SourceKind::Semantic, ContentRef::session(session_id), titles.value(i), contents.value(i), score)
                .with_meta("session_id", session_id)
                .with_meta("date", opt_str(dates, i)),
            Some(ContentType::Segment) if !segment_ids.is_null(i) => {
                let segment_id = segment_ids.value(i);
                Candidate::new(
                    SourceKind::Semantic,
                    ContentRef::segment(segment_id, session_id, session_title),
                    titles.value(i),
                    contents.value(i),
                    score,
                )
                .with_meta("segment_id", segment_id)
                .with_meta("session_id", session_id)
                .with_meta("session_title", session_title)
                .with_meta("segment_type", opt_str(segment_types, i))
            }
            _ => return Err(anyhow!("malformed row {:?} in documents table", string_col(batch, "id")?.value(i))),
        };
        out.push(candidate.with_meta("tags", tags.value(i)).with_meta("tag_categories", tag_categories.value(i)));
    }
    Ok(out)
}
