use std::sync::Arc;
use tracing::warn;

use crate::llm::{LanguageModel, Message};

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Answer the user's question naturally and concisely.";

pub const GENERAL_APOLOGY: &str =
    "I'm sorry, I couldn't process your request at the moment. Please try again.";

/// Answers anything that is not about the weather.
#[derive(Debug, Clone)]
pub struct GeneralConversation {
    llm: Arc<dyn LanguageModel>,
}

impl GeneralConversation {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn handle_general_query(&self, message: &str) -> String {
        let messages = [Message::system(SYSTEM_PROMPT), Message::user(message)];

        match self.llm.complete(&messages).await {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "general conversation call failed");
                GENERAL_APOLOGY.to_string()
            }
        }
    }
}
