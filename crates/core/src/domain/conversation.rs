use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// The most recent `size` messages, oldest first.
pub fn recent_window(history: &[Message], size: usize) -> &[Message] {
    let start = history.len().saturating_sub(size);
    &history[start..]
}

#[cfg(test)]
mod tests {
    use super::{recent_window, Message, Role};

    #[test]
    fn window_keeps_most_recent_messages_in_order() {
        let history: Vec<Message> =
            (0..10).map(|index| Message::user(format!("message {index}"))).collect();

        let window = recent_window(&history, 4);

        let contents: Vec<&str> = window.iter().map(|message| message.content.as_str()).collect();
        assert_eq!(contents, vec!["message 6", "message 7", "message 8", "message 9"]);
    }

    #[test]
    fn window_larger_than_history_returns_everything() {
        let history = vec![Message::user("sveiki"), Message::assistant("Labdien!")];
        assert_eq!(recent_window(&history, 5).len(), 2);
        assert!(recent_window(&[], 3).is_empty());
    }

    #[test]
    fn roles_use_lowercase_wire_names() {
        let message: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"Labdien!"}"#).expect("parse");
        assert_eq!(message.role, Role::Assistant);

        let message: Message = serde_json::from_str(r#"{"role":"user"}"#).expect("parse");
        assert_eq!(message.content, "");
    }
}
