//! Vector Knowledge Base
//!
//! Brute-force nearest-neighbor retrieval over a JSON-persisted document
//! index. Embeddings come from an [`Embedder`] (Ollama in production, a
//! deterministic mock in tests). Score is squared L2 distance: lower is
//! more similar. An uninitialized index yields no hits rather than an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use agent_core::{
    error::Result,
    kb::{KbHit, KnowledgeProvider},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Produces an embedding vector for a text
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// A document to index
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct IndexedDocument {
    #[serde(flatten)]
    doc: Document,
    embedding: Vec<f32>,
}

/// JSON-persisted vector knowledge base
pub struct VectorKb {
    embedder: Arc<dyn Embedder>,
    index_path: PathBuf,
    lock: Mutex<()>,
}

impl VectorKb {
    pub fn new(embedder: Arc<dyn Embedder>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            embedder,
            index_path: index_path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Missing or corrupt index reads as uninitialized (empty)
    fn load(path: &Path) -> Vec<IndexedDocument> {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn save(path: &Path, index: &[IndexedDocument]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(index)?)?;
        Ok(())
    }

    /// Embed and append documents to the index
    pub async fn add_documents(&self, docs: &[Document]) -> Result<()> {
        let mut embedded = Vec::with_capacity(docs.len());
        for doc in docs {
            let embedding = self.embedder.embed(&doc.text).await?;
            embedded.push(IndexedDocument {
                doc: doc.clone(),
                embedding,
            });
        }

        let _guard = self.lock.lock().unwrap();
        let mut index = Self::load(&self.index_path);
        index.extend(embedded);
        Self::save(&self.index_path, &index)?;
        tracing::info!(total = index.len(), "KB index updated");
        Ok(())
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        let _guard = self.lock.lock().unwrap();
        Self::load(&self.index_path).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Squared L2 distance between two vectors; mismatched dimensions rank last
fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[async_trait]
impl KnowledgeProvider for VectorKb {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<KbHit>> {
        let index = {
            let _guard = self.lock.lock().unwrap();
            Self::load(&self.index_path)
        };
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(text).await?;

        let mut hits: Vec<KbHit> = index
            .iter()
            .map(|entry| KbHit {
                title: entry.doc.title.clone(),
                text: entry.doc.text.clone(),
                score: l2_distance(&query_vec, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maps a few fixed texts to fixed vectors
    struct MockEmbedder;

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(match text {
                t if t.contains("exam") => vec![1.0, 0.0],
                t if t.contains("lunch") => vec![0.0, 1.0],
                _ => vec![0.5, 0.5],
            })
        }
    }

    fn docs() -> Vec<Document> {
        vec![
            Document {
                id: "1".into(),
                title: "Exams".into(),
                text: "The exam schedule is posted in May.".into(),
            },
            Document {
                id: "2".into(),
                title: "Lunch".into(),
                text: "The lunch break is at noon.".into(),
            },
        ]
    }

    fn kb_in(dir: &tempfile::TempDir) -> VectorKb {
        VectorKb::new(Arc::new(MockEmbedder), dir.path().join("kb").join("index.json"))
    }

    #[tokio::test]
    async fn test_uninitialized_index_yields_no_hits() {
        let dir = tempfile::tempdir().unwrap();
        let kb = kb_in(&dir);
        assert!(kb.query("anything", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_ranks_by_distance_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let kb = kb_in(&dir);
        kb.add_documents(&docs()).await.unwrap();

        let hits = kb.query("when is the exam?", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Exams");
        assert!(hits[0].score <= hits[1].score);
    }

    #[tokio::test]
    async fn test_top_k_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let kb = kb_in(&dir);
        kb.add_documents(&docs()).await.unwrap();

        let hits = kb.query("lunch?", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Lunch");
    }

    #[tokio::test]
    async fn test_index_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let kb = VectorKb::new(Arc::new(MockEmbedder), &path);
        kb.add_documents(&docs()).await.unwrap();

        let reopened = VectorKb::new(Arc::new(MockEmbedder), &path);
        assert_eq!(reopened.len(), 2);
        assert!(!reopened.query("exam", 1).await.unwrap().is_empty());
    }

    #[test]
    fn test_l2_distance() {
        assert_eq!(l2_distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(l2_distance(&[1.0], &[1.0, 2.0]), f32::INFINITY);
    }
}
