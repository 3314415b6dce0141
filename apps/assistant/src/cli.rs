//! Terminal front ends: the interactive chat loop and the training stub.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};

use crate::agents::HrAssistant;
use crate::conversation::ConversationState;
use crate::ml::ranking::RankingModel;

/// Interactive conversation over `input`/`output`. `quit` (or end of input)
/// exits; `reset` starts over but keeps company info. A failed turn is
/// reported and the loop carries on.
pub async fn run_chat<R, W>(assistant: &HrAssistant, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write(
        &mut output,
        "Intelligent HR Assistant - CLI Version\nType 'quit' to exit, 'reset' to start over\n\n",
    )
    .await?;

    let mut state = ConversationState::new();
    let mut lines = input.lines();
    loop {
        write(&mut output, "You: ").await?;
        let Some(line) = lines.next_line().await? else {
            write(&mut output, "\nGoodbye!\n").await?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.to_lowercase().as_str() {
            "quit" => {
                write(&mut output, "Goodbye!\n").await?;
                break;
            }
            "reset" => {
                state.reset();
                write(&mut output, "Conversation reset.\n").await?;
            }
            _ => match assistant.invoke(&mut state, line).await {
                Ok(reply) => {
                    write(&mut output, &format!("Assistant: {}\n\n", reply.message)).await?;
                }
                Err(e) => {
                    error!("Turn failed: {e}");
                    write(&mut output, &format!("Error: {e}\n\n")).await?;
                }
            },
        }
    }
    Ok(())
}

async fn write<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

/// Which models `train` should touch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrainSelection {
    pub ner: bool,
    pub embedding: bool,
    pub ranking: bool,
}

impl TrainSelection {
    pub fn all() -> Self {
        Self {
            ner: true,
            embedding: true,
            ranking: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.ner || self.embedding || self.ranking)
    }
}

/// Training stub. NER and embeddings are hosted models, so only the ranking
/// vocabulary is actually fitted (over the corpus `.txt` files). Returns the
/// fitted vocabulary size when ranking ran.
pub fn train(selection: TrainSelection, corpus: Option<&Path>) -> Result<Option<usize>> {
    if selection.is_empty() {
        info!("Nothing to train. Use --all, --ner, --embedding or --ranking.");
        return Ok(None);
    }

    if selection.ner {
        info!("Training NER model...");
        info!("NER model training complete");
    }
    if selection.embedding {
        info!("Training embedding model...");
        info!("Embedding model training complete");
    }
    if !selection.ranking {
        return Ok(None);
    }

    info!("Training ranking model...");
    let documents = match corpus {
        Some(dir) => read_corpus(dir)?,
        None => {
            warn!("No --corpus given; ranking model fitted on nothing");
            Vec::new()
        }
    };
    let mut model = RankingModel::default();
    model.fit(&documents);
    info!(
        "Ranking model training complete: {} document(s), {} term(s)",
        documents.len(),
        model.vocabulary_size()
    );
    Ok(Some(model.vocabulary_size()))
}

/// Contents of the `.txt` files directly inside `dir`, in file-name order.
fn read_corpus(dir: &Path) -> Result<Vec<String>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot read corpus directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read {}", path.display()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::conversation::prompts::{CHATBOT_SYSTEM, EXTRACTION_SYSTEM};
    use crate::llm_client::testing::ScriptedModel;

    async fn chat(llm: ScriptedModel, input: &str) -> String {
        let assistant = HrAssistant::new(Arc::new(llm));
        let mut output = Vec::new();
        run_chat(&assistant, input.as_bytes(), &mut output)
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_chat_replies_until_quit() {
        let llm = ScriptedModel::new()
            .reply_when(EXTRACTION_SYSTEM, "{}")
            .reply_when(CHATBOT_SYSTEM, "Which role are you hiring for?");
        let transcript = chat(llm, "hello\n\nQUIT\nnever read\n").await;

        assert_eq!(transcript.matches("Assistant: Which role").count(), 1);
        assert!(transcript.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_chat_reset_and_end_of_input() {
        let llm = ScriptedModel::new()
            .reply_when(EXTRACTION_SYSTEM, "{}")
            .reply_when(CHATBOT_SYSTEM, "Noted.");
        let transcript = chat(llm, "hi\nreset\n").await;

        assert!(transcript.contains("Conversation reset."));
        assert!(transcript.ends_with("\nGoodbye!\n"));
    }

    #[tokio::test]
    async fn test_chat_keeps_going_after_a_failed_turn() {
        let llm = ScriptedModel::new()
            .reply_when(EXTRACTION_SYSTEM, "{}")
            .fail_when(CHATBOT_SYSTEM, "overloaded");
        let transcript = chat(llm, "hi\nhello again\nquit\n").await;

        assert_eq!(transcript.matches("Error: ").count(), 2);
        assert!(transcript.ends_with("Goodbye!\n"));
    }

    #[test]
    fn test_train_without_selection_does_nothing() {
        assert_eq!(train(TrainSelection::default(), None).unwrap(), None);
    }

    #[test]
    fn test_train_ranking_fits_corpus_text_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "rust engineer").unwrap();
        std::fs::write(dir.path().join("b.txt"), "go engineer").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored words here").unwrap();

        let size = train(TrainSelection::all(), Some(dir.path())).unwrap();
        assert_eq!(size, Some(3));
    }

    #[test]
    fn test_train_missing_corpus_is_an_error() {
        let selection = TrainSelection {
            ranking: true,
            ..Default::default()
        };
        assert!(train(selection, Some(Path::new("/nonexistent/corpus"))).is_err());
    }
}
