use crate::models::part::Part;
use crate::providers::base::Embedder;
use crate::retrieval::VectorStore;

/// Base system instruction, before any retrieved knowledge is appended.
pub const BASE_INSTRUCTION: &str = "You are a financial expert. Use the available tools to fetch \
market data. Present suggestions and forward-looking views on price movements, and point out \
what may be worth considering as an investment.";

const TOP_K: usize = 3;

/// A binary attachment supplied with the caller's message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// The assembled outbound request: initial input parts plus the system
/// instruction, possibly augmented with retrieved knowledge.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub parts: Vec<Part>,
    pub system_instruction: String,
}

/// Builds the initial model input from the caller's message and attachment,
/// augmenting the instruction with knowledge-base matches when available.
pub struct ContextAssembler<'a> {
    embedder: &'a dyn Embedder,
    store: &'a dyn VectorStore,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a dyn VectorStore) -> Self {
        Self { embedder, store }
    }

    /// Assemble input parts and instruction for one request.
    ///
    /// Retrieval is best-effort: embedding or query failures log a warning
    /// and leave the base instruction unmodified. An empty message produces
    /// no text part and triggers no retrieval at all.
    pub async fn assemble(
        &self,
        message: &str,
        attachment: Option<&Attachment>,
    ) -> AssembledContext {
        let mut parts = Vec::new();
        let mut system_instruction = BASE_INSTRUCTION.to_string();

        if !message.is_empty() {
            parts.push(Part::text(message));

            match self.retrieve_context(message).await {
                Ok(matches) if !matches.is_empty() => {
                    let context = matches.join("\n");
                    tracing::debug!("retrieved knowledge context: {} matches", matches.len());
                    system_instruction.push_str(&format!(
                        "\n\nAdditional information from the knowledge base that may be helpful:\n{}\nUse it if it is relevant to the question.",
                        context
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("retrieval augmentation failed: {}", e);
                }
            }
        }

        if let Some(attachment) = attachment {
            if attachment.mime_type.contains("image") {
                parts.push(Part::blob(&attachment.data, attachment.mime_type.clone()));
            }
        }

        AssembledContext {
            parts,
            system_instruction,
        }
    }

    async fn retrieve_context(&self, message: &str) -> anyhow::Result<Vec<String>> {
        let embedding = self.embedder.embed(message).await?;
        self.store.query(&embedding, TOP_K).await
    }
}
