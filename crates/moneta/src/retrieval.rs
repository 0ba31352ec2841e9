use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Read/write surface of the retrieval store.
///
/// `query` returns documents ranked by relevance, best first. The store is
/// injected as a constructed dependency; concurrent conversation loops share
/// the read path without further coordination.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add(
        &self,
        documents: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        ids: Vec<String>,
    ) -> Result<()>;

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<String>>;
}

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    document: String,
    embedding: Vec<f32>,
}

/// In-memory vector store ranking by cosine similarity.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn add(
        &self,
        documents: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        ids: Vec<String>,
    ) -> Result<()> {
        if documents.len() != embeddings.len() || documents.len() != ids.len() {
            return Err(anyhow!(
                "mismatched lengths: {} documents, {} embeddings, {} ids",
                documents.len(),
                embeddings.len(),
                ids.len()
            ));
        }

        let mut entries = self.entries.write().await;
        for ((document, embedding), id) in documents.into_iter().zip(embeddings).zip(ids) {
            // Re-ingesting under an existing id replaces the old entry.
            entries.retain(|entry| entry.id != id);
            entries.push(Entry {
                id,
                document,
                embedding,
            });
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        let mut scored: Vec<(f32, &Entry)> = entries
            .iter()
            .map(|entry| (cosine_similarity(embedding, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, entry)| entry.document.clone())
            .collect())
    }
}
