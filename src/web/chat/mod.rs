pub mod conversation_state;
pub mod prompt;

use tracing::{error, info};

use crate::ollama_client::{GenerateError, TextGenerator};
use conversation_state::{ConversationState, Message};

pub const WELCOME_TEXT: &str = "🎉 歡迎使用 AI 旅遊顧問！我是您的專屬旅遊規劃助手 🤖

💡 **我可以幫助您：**
• 🗺️ 規劃旅遊路線和行程安排
• 💰 提供預算管理和節省建議
• 🏛️ 推薦熱門景點和隱藏美食
• ⏰ 優化行程時間安排
• 🏨 酒店和交通建議
• 🌍 目的地文化和注意事項
• 📱 實用的旅遊小貼士

🚀 **快速開始：**
您可以這樣問我：
• \"我想去日本東京旅遊5天，預算3萬台幣，請幫我規劃\"
• \"推薦台北週末兩日遊的景點和美食\"
• \"如何規劃歐洲背包旅行？\"
• \"去泰國旅遊需要注意什麼？\"

💬 請告訴我您的旅遊需求，我會為您量身定制專業建議！";

const INIT_FAILED_TEXT: &str = "❌ 抱歉，模型載入失敗，請稍後再試。";

/// One chat session: the conversation plus the generator it talks to.
/// Owned by the HTTP state and handed to each handler explicitly.
pub struct ChatSession {
    conversation: ConversationState,
    generator: Box<dyn TextGenerator>,
}

impl ChatSession {
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self {
            conversation: ConversationState::new(),
            generator,
        }
    }

    /// Handle one user message end to end: build the prompt from the
    /// current history, record the user turn, call the model, record the
    /// reply. Generation failures become the reply instead of an error,
    /// so the session and the process always survive a bad request.
    pub async fn handle_message(&mut self, input: &str) -> String {
        let prompt_text = prompt::build_prompt(input, self.conversation.messages());
        self.conversation.push(Message::user(input));

        let reply = match self.generator.generate(&prompt_text).await {
            Ok(raw) => prompt::extract_reply(&raw),
            Err(GenerateError::Init(detail)) => {
                error!("Model initialization failed: {detail}");
                INIT_FAILED_TEXT.to_string()
            }
            Err(e) => {
                error!("Failed to generate reply: {e}");
                format!("❌ 抱歉，生成回應時發生錯誤: {e}")
            }
        };

        self.conversation.push(Message::assistant(&reply));
        reply
    }

    pub fn reset(&mut self) {
        self.conversation.clear();
        info!("Conversation cleared");
    }

    pub fn history_len(&self) -> usize {
        self.conversation.len()
    }
}
