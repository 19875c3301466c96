use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Columns of the `documents` table.
pub fn documents_schema(dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("content_type", DataType::Utf8, false),
        Field::new("session_id", DataType::Int64, false),
        Field::new("segment_id", DataType::Int64, true),
        Field::new("title", DataType::Utf8, false),
        Field::new("session_title", DataType::Utf8, false),
        Field::new("segment_type", DataType::Utf8, true),
        Field::new("tags", DataType::Utf8, false),
        Field::new("tag_categories", DataType::Utf8, false),
        Field::new("date", DataType::Utf8, true),
        Field::new("content", DataType::Utf8, false),
        Field::new("content_hash", DataType::Utf8, false),
        Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32), true),
    ]))
}

/// Everything except `vector`; what a search needs to rebuild a candidate.
pub const RESULT_COLUMNS: &[&str] =
    &["id", "content_type", "session_id", "segment_id", "title", "session_title", "segment_type", "tags", "tag_categories", "date", "content"];
