//! Boardview models
//!
//! Normalized records for the entities the dashboard shows (assistants,
//! threads, memories, documents, models) plus the input records accepted
//! by the API. Every entity has a `decode` function that builds the record
//! from a possibly malformed upstream payload without panicking.

pub mod assistant;
pub mod decode;
pub mod document;
pub mod memory;
pub mod model_info;
pub mod thread;

pub use assistant::{Assistant, AssistantCreate, AssistantUpdate, decode_assistants};
pub use decode::{DecodeIssue, DecodeResult, Metadata, integer_of, parse_timestamp, text_of};
pub use document::{Document, DocumentCreate, DocumentTarget, FileUpload, decode_documents};
pub use memory::{
    AnnotatedMemory, DEFAULT_SEARCH_LIMIT, Memory, MemoryCreate, MemorySearch, decode_memories,
};
pub use model_info::ModelInfo;
pub use thread::{Message, Thread, ThreadCreate, decode_threads, normalize_role};
