//! ML utility wrappers: embeddings, entity extraction, TF-IDF ranking and an
//! in-memory knowledge graph. Nothing here is trained; see `train` in main.

pub mod embedding;
pub mod knowledge_graph;
pub mod ner;
pub mod ranking;
pub mod text;

use regex::Regex;

pub(crate) fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        // Patterns are literals; every one is compiled by the module tests.
        Err(err) => panic!("invalid regex pattern `{pattern}`: {err}"),
    }
}
