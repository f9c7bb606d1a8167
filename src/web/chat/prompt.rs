use regex::Regex;

use super::conversation_state::Message;

/// Persona and response-format directives prepended to every prompt.
pub const SYSTEM_PROMPT: &str = "你是一位專業的AI旅遊顧問，專門為用戶提供旅遊規劃建議。

請用繁體中文回答，提供實用、具體的建議。回答要結構化，使用表情符號和項目符號讓內容更易讀。

**重要：** 當用戶詢問旅遊規劃時，請提供完整、詳細的回答，包括：
- 完整的行程安排（時間、地點、活動）
- 具體的交通建議和費用
- 實用的旅遊小貼士
- 預算分配建議
- 季節性注意事項

不要因為字數限制而截斷回答，確保提供完整的旅遊建議。

如果用戶的問題超出旅遊範圍，請禮貌地引導回旅遊相關話題。";

/// Trailing cue marking where the model's answer begins.
pub const ANSWER_CUE: &str = "AI旅遊顧問:";

/// Marker opening a user turn. Generated text after this marker is the
/// model hallucinating the next question and gets stripped.
const USER_CUE_PATTERN: &str = r"(?s)用戶:.*";

const EMPTY_REPLY: &str = "抱歉，我沒有生成有效的回應，請重新提問。";

/// Number of recent turns rendered into the prompt.
const HISTORY_WINDOW: usize = 5;

/// Build the full prompt for one user message. Pure function of its
/// inputs; the conversation is never mutated.
pub fn build_prompt(user_input: &str, history: &[Message]) -> String {
    if history.is_empty() {
        return format!("{SYSTEM_PROMPT}\n\n用戶: {user_input}\n\n{ANSWER_CUE}");
    }

    let window = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
    let history_text = window
        .iter()
        .map(|msg| format!("{}: {}", msg.role.speaker(), msg.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{SYSTEM_PROMPT}\n\n對話歷史:\n{history_text}\n\n用戶: {user_input}\n\n{ANSWER_CUE}")
}

/// Extract the assistant's answer from raw model output: take the text
/// after the last answer cue, drop any hallucinated next user turn.
pub fn extract_reply(raw: &str) -> String {
    let tail = match raw.rfind(ANSWER_CUE) {
        Some(pos) => &raw[pos + ANSWER_CUE.len()..],
        None => raw,
    };

    let re = Regex::new(USER_CUE_PATTERN).expect("user-turn pattern is valid");
    let reply = re.replace(tail, "").trim().to_string();

    if reply.is_empty() {
        EMPTY_REPLY.to_string()
    } else {
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_always_contains_the_preamble_verbatim() {
        let prompt = build_prompt("推薦台北景點", &[]);
        assert!(prompt.contains(SYSTEM_PROMPT));
        assert!(prompt.ends_with(ANSWER_CUE));
    }

    #[test]
    fn empty_history_produces_no_history_section() {
        let prompt = build_prompt("你好", &[]);
        assert!(!prompt.contains("對話歷史:"));
        assert!(prompt.contains("用戶: 你好"));
    }

    #[test]
    fn long_history_is_windowed_to_the_most_recent_five() {
        let history: Vec<Message> = (0..8).map(|i| Message::user(format!("msg {i}"))).collect();
        let prompt = build_prompt("next", &history);

        assert!(prompt.contains("對話歷史:"));
        for i in 3..8 {
            assert!(prompt.contains(&format!("用戶: msg {i}")));
        }
        for i in 0..3 {
            assert!(!prompt.contains(&format!("用戶: msg {i}")));
        }
    }

    #[test]
    fn history_turns_carry_their_speaker_labels() {
        let history = vec![Message::user("去京都好嗎？"), Message::assistant("京都很適合。")];
        let prompt = build_prompt("幾月去最好？", &history);

        assert!(prompt.contains("用戶: 去京都好嗎？"));
        assert!(prompt.contains("AI旅遊顧問: 京都很適合。"));
    }

    #[test]
    fn extract_reply_takes_text_after_the_last_answer_cue() {
        let raw = "ignored preamble\nAI旅遊顧問: first\n用戶: q\nAI旅遊顧問: second answer";
        assert_eq!(extract_reply(raw), "second answer");
    }

    #[test]
    fn extract_reply_strips_a_hallucinated_user_turn() {
        let raw = "...AI旅遊顧問: A good trip to Tokyo.\n用戶: and then?";
        assert_eq!(extract_reply(raw), "A good trip to Tokyo.");
    }

    #[test]
    fn extract_reply_passes_through_text_without_markers() {
        assert_eq!(extract_reply("  東京五日遊建議如下。  "), "東京五日遊建議如下。");
    }

    #[test]
    fn extract_reply_substitutes_the_apology_when_nothing_remains() {
        assert_eq!(extract_reply("AI旅遊顧問: \n用戶: hmm"), EMPTY_REPLY);
    }
}
