use shopbot_core::domain::conversation::{recent_window, Message, Role};
use shopbot_core::domain::product::Product;

use crate::templates::{fill, ReplyTemplates, PRODUCTS_PLACEHOLDER};

/// Renders the single text prompt sent to the hosted model: system instruction with the
/// catalog block, the windowed history, then the current message.
#[derive(Clone, Debug)]
pub struct PromptBuilder {
    templates: ReplyTemplates,
    history_window: usize,
}

impl PromptBuilder {
    pub fn new(templates: ReplyTemplates, history_window: usize) -> Self {
        Self { templates, history_window }
    }

    pub fn build(&self, message: &str, history: &[Message], catalog: &[Product]) -> String {
        let catalog_block = self.catalog_block(catalog);
        let mut prompt = if self.templates.system_prompt.contains(PRODUCTS_PLACEHOLDER) {
            fill(&self.templates.system_prompt, &[("products", &catalog_block)])
        } else {
            format!("{}\n{catalog_block}", self.templates.system_prompt)
        };

        let window = recent_window(history, self.history_window);
        if !window.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.templates.history_heading);
            prompt.push('\n');
            for entry in window {
                prompt.push_str(self.label(entry.role));
                prompt.push_str(": ");
                prompt.push_str(&entry.content);
                prompt.push('\n');
            }
        }

        prompt.push('\n');
        prompt.push_str(&self.templates.user_label);
        prompt.push_str(": ");
        prompt.push_str(message);
        prompt.push('\n');
        prompt.push_str(&self.templates.assistant_label);
        prompt.push(':');
        prompt
    }

    fn catalog_block(&self, catalog: &[Product]) -> String {
        if catalog.is_empty() {
            return self.templates.catalog_empty.clone();
        }
        format!("{}\n{}", self.templates.catalog_heading, self.templates.product_lines(catalog))
    }

    fn label(&self, role: Role) -> &str {
        match role {
            Role::User => &self.templates.user_label,
            Role::Assistant => &self.templates.assistant_label,
        }
    }
}
