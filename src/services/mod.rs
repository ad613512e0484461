//! Business logic services.
//!
//! Services orchestrate the storage layer and provide the high-level
//! record, index maintenance, and search operations.

mod id_generator;
mod index_maintainer;
pub mod keywords;
mod knowledge_base;
mod path_manager;
mod recall;
mod synonyms;

pub use id_generator::next_record_id;
pub use index_maintainer::InvertedIndexMaintainer;
pub use keywords::{extract_keywords, tokenize};
pub use knowledge_base::DebugKnowledgeBase;
pub use path_manager::{
    DEBUG_DIR_NAME, GLOBAL_DIR_HASH_LEN, INDEX_FILE_NAME, PathManager, RECORD_ID_HASH_LEN,
    SIDECAR_DIR_NAME, global_config_dir, project_hash,
};
pub use recall::RetrievalEngine;
pub use synonyms::SynonymExpander;
