//! # Meilisearch
//!
//! Document store and search engine holding the word index.
//!
//! The service proxies user queries instead of exposing Meilisearch
//! directly, so the index settings below are the whole search contract:
//! typo-tolerant matching over the word and its definitions, alphabetical
//! sort for paginated listings.
//!
//! Lookups the core needs beyond search: a document count, a fetch at a
//! positional offset (for the deterministic daily pick), and a fetch by id.
//! Document order between calls is whatever the engine returns; a stable
//! count during one selection is best effort.

use std::sync::Arc;

use async_trait::async_trait;
use meilisearch_sdk::{
    client::Client,
    documents::DocumentsQuery,
    errors::{Error as MeiliError, ErrorCode, MeilisearchError},
    settings::{MinWordSizeForTypos, Settings, TypoToleranceSettings},
};

use crate::{
    error::AppError,
    models::{SearchPage, Word},
};

pub const WORD_INDEX: &str = "words";
pub const WORD_FIELD: &str = "word";

/// Read-side boundary over the word documents.
#[async_trait]
pub trait WordRepository: Send + Sync {
    async fn count(&self) -> Result<i64, AppError>;

    async fn fetch_at_offset(&self, offset: i64) -> Result<Option<Word>, AppError>;

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Word>, AppError>;

    async fn search(&self, term: &str, page: i64, limit: i64) -> Result<SearchPage, AppError>;
}

#[derive(Clone)]
pub struct MeiliRepository {
    client: Arc<Client>,
}

impl MeiliRepository {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WordRepository for MeiliRepository {
    async fn count(&self) -> Result<i64, AppError> {
        let stats = self
            .client
            .index(WORD_INDEX)
            .get_stats()
            .await
            .map_err(AppError::repository)?;

        Ok(stats.number_of_documents as i64)
    }

    async fn fetch_at_offset(&self, offset: i64) -> Result<Option<Word>, AppError> {
        let index = self.client.index(WORD_INDEX);
        let documents = DocumentsQuery::new(&index)
            .with_offset(offset as usize)
            .with_limit(1)
            .execute::<Word>()
            .await
            .map_err(AppError::repository)?;

        Ok(documents.results.into_iter().next())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Word>, AppError> {
        match self.client.index(WORD_INDEX).get_document::<Word>(id).await {
            Ok(word) => Ok(Some(word)),
            Err(MeiliError::Meilisearch(MeilisearchError {
                error_code: ErrorCode::DocumentNotFound,
                ..
            })) => Ok(None),
            Err(e) => Err(AppError::repository(e)),
        }
    }

    async fn search(&self, term: &str, page: i64, limit: i64) -> Result<SearchPage, AppError> {
        let index = self.client.index(WORD_INDEX);
        let results = index
            .search()
            .with_query(term)
            .with_offset(((page - 1) * limit) as usize)
            .with_limit(limit as usize)
            .with_sort(&["word:asc"])
            .execute::<Word>()
            .await
            .map_err(AppError::repository)?;

        let total_count = results.estimated_total_hits.unwrap_or(results.hits.len()) as i64;
        let words = results.hits.into_iter().map(|hit| hit.result).collect();

        Ok(SearchPage { words, total_count })
    }
}

pub async fn init_meilisearch(meili_url: &str, meili_admin_key: &str) -> Arc<Client> {
    let meili_client = Arc::new(Client::new(meili_url, Some(meili_admin_key)).unwrap());

    meili_client
        .index(WORD_INDEX)
        .set_settings(&init_settings())
        .await
        .unwrap();

    meili_client
}

fn init_settings() -> Settings {
    Settings::new()
        .with_ranking_rules([
            "words",
            "typo",
            "proximity",
            "exactness",
            "attribute",
            "sort",
        ])
        .with_distinct_attribute(Some(WORD_FIELD))
        .with_searchable_attributes([WORD_FIELD, "definitions.meaning"])
        .with_sortable_attributes([WORD_FIELD])
        .with_typo_tolerance(TypoToleranceSettings {
            enabled: Some(true),
            disable_on_attributes: None,
            disable_on_words: None,
            min_word_size_for_typos: Some(MinWordSizeForTypos {
                one_typo: Some(5),
                two_typos: Some(9),
            }),
        })
}
