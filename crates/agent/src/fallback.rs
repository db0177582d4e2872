use shopbot_core::domain::product::Product;

use crate::guardrails::{contains_any, TopicGate};
use crate::templates::ReplyTemplates;

const LAST_RESORT_REPLY: &str = "Es varu palīdzēt ar informāciju par veikala produktiem.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyCategory {
    Products,
    Pricing,
    Help,
    Gratitude,
    InScope,
    OutOfScope,
}

impl ReplyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Pricing => "pricing",
            Self::Help => "help",
            Self::Gratitude => "gratitude",
            Self::InScope => "in_scope",
            Self::OutOfScope => "out_of_scope",
        }
    }
}

/// Deterministic keyword-classified replies used whenever the hosted model is not
/// consulted or does not produce usable text. Always returns non-empty text.
#[derive(Clone, Debug)]
pub struct SimulatedResponder {
    templates: ReplyTemplates,
    topic_gate: TopicGate,
    listing_limit: usize,
}

impl SimulatedResponder {
    pub fn new(templates: ReplyTemplates, topic_gate: TopicGate, listing_limit: usize) -> Self {
        Self { templates, topic_gate, listing_limit: listing_limit.max(1) }
    }

    /// Pricing is checked before the broader product listing so that
    /// "cik maksā ..." is answered with prices.
    pub fn classify(&self, message: &str) -> ReplyCategory {
        let normalized = message.to_lowercase();
        let keywords = &self.templates.keywords;

        if contains_any(&normalized, &keywords.pricing) {
            ReplyCategory::Pricing
        } else if contains_any(&normalized, &keywords.products) {
            ReplyCategory::Products
        } else if contains_any(&normalized, &keywords.help) {
            ReplyCategory::Help
        } else if contains_any(&normalized, &keywords.gratitude) {
            ReplyCategory::Gratitude
        } else if self.topic_gate.is_in_scope(message) {
            ReplyCategory::InScope
        } else {
            ReplyCategory::OutOfScope
        }
    }

    pub fn respond(&self, message: &str, catalog: &[Product]) -> String {
        let reply = match self.classify(message) {
            ReplyCategory::Products => self.product_listing(catalog),
            ReplyCategory::Pricing => self.pricing(message, catalog),
            ReplyCategory::Help => self.templates.help.clone(),
            ReplyCategory::Gratitude => self.templates.gratitude.clone(),
            ReplyCategory::InScope => self.templates.in_scope_default.clone(),
            ReplyCategory::OutOfScope => self.templates.out_of_scope.clone(),
        };

        if reply.trim().is_empty() {
            LAST_RESORT_REPLY.to_string()
        } else {
            reply
        }
    }

    fn product_listing(&self, catalog: &[Product]) -> String {
        if catalog.is_empty() {
            return self.templates.no_products.clone();
        }

        let lines = self.templates.product_lines(catalog.iter().take(self.listing_limit));
        format!(
            "{}\n{}\n\n{}",
            self.templates.products_intro, lines, self.templates.products_outro
        )
    }

    fn pricing(&self, message: &str, catalog: &[Product]) -> String {
        if catalog.is_empty() {
            return self.templates.no_products.clone();
        }

        let normalized = message.to_lowercase();
        let mentioned: Vec<&Product> = catalog
            .iter()
            .filter(|product| normalized.contains(&product.name.to_lowercase()))
            .collect();

        if mentioned.is_empty() {
            let lines = self.templates.product_lines(catalog.iter().take(self.listing_limit));
            return format!("{}\n{}", self.templates.pricing_intro, lines);
        }

        mentioned
            .into_iter()
            .map(|product| self.templates.render_product(&self.templates.product_price, product))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use shopbot_core::domain::product::Product;

    use super::{ReplyCategory, SimulatedResponder};
    use crate::guardrails::TopicGate;
    use crate::templates::ReplyTemplates;

    fn responder() -> SimulatedResponder {
        SimulatedResponder::new(
            ReplyTemplates::default(),
            TopicGate::new(true, ["veikal", "produkt", "sveiki"]),
            3,
        )
    }

    fn catalog() -> Vec<Product> {
        vec![
            Product { name: "Laptop".to_string(), price: Decimal::new(99999, 2) },
            Product { name: "Mouse".to_string(), price: Decimal::new(1999, 2) },
        ]
    }

    #[test]
    fn product_question_lists_names_and_prices() {
        let reply = responder().respond("Kādi produkti jums ir?", &catalog());

        assert!(reply.contains("Laptop"));
        assert!(reply.contains("999.99"));
        assert!(reply.contains("Mouse"));
        assert!(reply.contains("19.99"));
        assert!(reply.starts_with("Mūsu veikalā pieejamas šādas preces:"));
    }

    #[test]
    fn listing_respects_limit_and_catalog_order() {
        let mut products = catalog();
        products.push(Product { name: "Monitor".to_string(), price: Decimal::new(14900, 2) });
        products.push(Product { name: "Keyboard".to_string(), price: Decimal::new(4950, 2) });

        let reply = responder().respond("Kādas preces ir pieejamas?", &products);

        let laptop = reply.find("Laptop").expect("first product listed");
        let monitor = reply.find("Monitor").expect("third product listed");
        assert!(laptop < monitor);
        assert!(!reply.contains("Keyboard"));
    }

    #[test]
    fn product_question_with_empty_catalog_says_nothing_available() {
        let templates = ReplyTemplates::default();
        assert_eq!(responder().respond("Kādi produkti jums ir?", &[]), templates.no_products);
    }

    #[test]
    fn pricing_question_about_known_product_quotes_its_price() {
        let reply = responder().respond("Cik maksā mouse?", &catalog());
        assert_eq!(reply, "Mouse maksā €19.99.");
    }

    #[test]
    fn pricing_question_without_product_lists_prices() {
        let reply = responder().respond("Kādas ir jūsu cenas?", &catalog());
        assert!(reply.starts_with("Mūsu preču cenas:"));
        assert!(reply.contains("- Laptop (€999.99)"));
    }

    #[test]
    fn classification_covers_every_category() {
        let responder = responder();
        assert_eq!(responder.classify("Kādi produkti?"), ReplyCategory::Products);
        assert_eq!(responder.classify("Kāda ir cena?"), ReplyCategory::Pricing);
        assert_eq!(responder.classify("Vai varat palīdzēt?"), ReplyCategory::Help);
        assert_eq!(responder.classify("Paldies!"), ReplyCategory::Gratitude);
        assert_eq!(responder.classify("Sveiki"), ReplyCategory::InScope);
        assert_eq!(responder.classify("Kāds šodien ir laiks?"), ReplyCategory::OutOfScope);
        assert_eq!(responder.classify(""), ReplyCategory::OutOfScope);
    }

    #[test]
    fn every_category_yields_non_empty_text() {
        let responder = responder();
        for message in ["Kādi produkti?", "cena", "palīdzība", "paldies", "sveiki", "", "???"] {
            assert!(!responder.respond(message, &[]).trim().is_empty(), "empty reply for {message:?}");
            assert!(!responder.respond(message, &catalog()).trim().is_empty());
        }
    }

    #[test]
    fn blank_custom_template_falls_back_to_last_resort_text() {
        let templates = ReplyTemplates { out_of_scope: String::new(), ..ReplyTemplates::default() };
        let responder = SimulatedResponder::new(templates, TopicGate::new(true, ["veikal"]), 3);

        assert!(!responder.respond("laikapstākļi", &[]).is_empty());
    }
}
