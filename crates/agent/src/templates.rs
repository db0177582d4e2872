//! Reply templates and classifier vocabulary.
//!
//! Everything here carries locale and tone, so it is loaded as a resource and can be
//! swapped without touching resolution logic. Placeholders use `{name}` syntax:
//! `{products}`, `{name}` and `{price}`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shopbot_core::domain::product::Product;
use thiserror::Error;

pub(crate) const PRODUCTS_PLACEHOLDER: &str = "{products}";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("could not read templates file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse templates file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("template `{0}` must not be empty")]
    Empty(&'static str),
    #[error("template `{template}` must contain the `{placeholder}` placeholder")]
    MissingPlaceholder { template: &'static str, placeholder: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyTemplates {
    pub system_prompt: String,
    pub catalog_heading: String,
    pub catalog_empty: String,
    pub product_line: String,
    pub history_heading: String,
    pub user_label: String,
    pub assistant_label: String,
    pub topic_refusal: String,
    pub model_loading: String,
    pub products_intro: String,
    pub products_outro: String,
    pub no_products: String,
    pub pricing_intro: String,
    pub product_price: String,
    pub help: String,
    pub gratitude: String,
    pub in_scope_default: String,
    pub out_of_scope: String,
    pub keywords: CategoryKeywords,
}

/// Substrings that route a message to a simulated reply category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryKeywords {
    pub products: Vec<String>,
    pub pricing: Vec<String>,
    pub help: Vec<String>,
    pub gratitude: Vec<String>,
}

impl Default for ReplyTemplates {
    fn default() -> Self {
        Self {
            system_prompt: "Tu esi e-veikala čatbots-asistents. Atbildi tikai uz jautājumiem par veikalu un precēm.\n\
                            {products}\n\
                            Ja jautājums nav par veikalu, atsaki pieklājīgi.\n\
                            Atbildi latviešu valodā, īsi un skaidri."
                .to_string(),
            catalog_heading: "Pieejamās preces:".to_string(),
            catalog_empty: "Šobrīd nav pieejamu produktu.".to_string(),
            product_line: "- {name} (€{price})".to_string(),
            history_heading: "Sarunas vēsture:".to_string(),
            user_label: "Lietotājs".to_string(),
            assistant_label: "Asistents".to_string(),
            topic_refusal: "Atvainojiet, es varu atbildēt tikai uz jautājumiem par mūsu veikalu un precēm."
                .to_string(),
            model_loading: "Modelis pašlaik ielādējas, tāpēc atbildu īsāk.".to_string(),
            products_intro: "Mūsu veikalā pieejamas šādas preces:".to_string(),
            products_outro: "Vai vēlaties uzzināt vairāk par kādu konkrētu produktu?".to_string(),
            no_products: "Šobrīd nav pieejamu produktu. Lūdzu, vēlāk mēģiniet vēlreiz.".to_string(),
            pricing_intro: "Mūsu preču cenas:".to_string(),
            product_price: "{name} maksā €{price}.".to_string(),
            help: "Es varu pastāstīt par mūsu precēm un to cenām. Par pasūtījumiem un piegādi, lūdzu, sazinieties ar veikala atbalstu."
                .to_string(),
            gratitude: "Lūdzu! Ja rodas vēl kādi jautājumi par mūsu precēm, droši jautājiet."
                .to_string(),
            in_scope_default: "Es varu palīdzēt ar informāciju par veikala produktiem. Vai vēlaties uzzināt, kādi produkti ir pieejami?"
                .to_string(),
            out_of_scope: "Es varu atbildēt tikai uz jautājumiem par mūsu veikalu. Vai vēlaties uzzināt, kādi produkti ir pieejami?"
                .to_string(),
            keywords: CategoryKeywords::default(),
        }
    }
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        fn owned(words: &[&str]) -> Vec<String> {
            words.iter().map(|word| word.to_string()).collect()
        }

        Self {
            products: owned(&["produkt", "prece", "preces", "preci", "kādi", "sortiment", "piedāvā"]),
            pricing: owned(&["cena", "cenu", "cenas", "cenām", "maksā", "izmaks", "€"]),
            help: owned(&["palīdz", "palīgā", "atbalst", "kontakt", "problēm", "piegād", "pasūt"]),
            gratitude: owned(&["paldies", "uz redzēšanos", "visu labu", "jauku dienu"]),
        }
    }
}

impl ReplyTemplates {
    /// Loads templates from a TOML file; omitted keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| TemplateError::ReadFile { path: path.to_path_buf(), source })?;
        let templates = toml::from_str::<Self>(&raw)
            .map_err(|source| TemplateError::ParseFile { path: path.to_path_buf(), source })?;
        templates.validate()?;
        Ok(templates)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, TemplateError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        let required = [
            ("system_prompt", &self.system_prompt),
            ("topic_refusal", &self.topic_refusal),
            ("model_loading", &self.model_loading),
            ("no_products", &self.no_products),
            ("product_line", &self.product_line),
            ("product_price", &self.product_price),
            ("help", &self.help),
            ("gratitude", &self.gratitude),
            ("in_scope_default", &self.in_scope_default),
            ("out_of_scope", &self.out_of_scope),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(TemplateError::Empty(name));
            }
        }
        if !self.system_prompt.contains(PRODUCTS_PLACEHOLDER) {
            return Err(TemplateError::MissingPlaceholder {
                template: "system_prompt",
                placeholder: PRODUCTS_PLACEHOLDER,
            });
        }
        Ok(())
    }

    pub fn render_product(&self, template: &str, product: &Product) -> String {
        fill(template, &[("name", &product.name), ("price", &product.display_price())])
    }

    /// One `product_line` per product, in catalog order.
    pub fn product_lines<'a>(&self, products: impl IntoIterator<Item = &'a Product>) -> String {
        products
            .into_iter()
            .map(|product| self.render_product(&self.product_line, product))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Substitutes `{key}` placeholders in one pass, so values are never rescanned.
/// Unknown placeholders are left as written.
pub(crate) fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let matched = values.iter().find(|(key, _)| {
            tail.strip_prefix(*key).is_some_and(|after| after.starts_with('}'))
        });
        match matched {
            Some((key, value)) => {
                rendered.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                rendered.push('{');
                rest = tail;
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use rust_decimal::Decimal;
    use shopbot_core::domain::product::Product;
    use tempfile::TempDir;

    use super::{fill, ReplyTemplates, TemplateError};

    #[test]
    fn product_lines_render_euro_prices_with_two_decimals() {
        let templates = ReplyTemplates::default();
        let products = vec![
            Product { name: "Laptop".to_string(), price: Decimal::new(99999, 2) },
            Product { name: "Mouse".to_string(), price: Decimal::new(20, 0) },
        ];

        assert_eq!(templates.product_lines(&products), "- Laptop (€999.99)\n- Mouse (€20.00)");
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("templates.toml");
        fs::write(
            &path,
            r#"
topic_refusal = "Sorry, I only talk about the shop."

[keywords]
gratitude = ["thanks"]
"#,
        )
        .expect("write templates");

        let templates = ReplyTemplates::load(&path).expect("templates should load");

        assert_eq!(templates.topic_refusal, "Sorry, I only talk about the shop.");
        assert_eq!(templates.keywords.gratitude, vec!["thanks".to_string()]);
        assert_eq!(templates.help, ReplyTemplates::default().help);
        assert!(!templates.keywords.products.is_empty());
    }

    #[test]
    fn empty_required_template_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("templates.toml");
        fs::write(&path, "out_of_scope = \"  \"\n").expect("write templates");

        let error = ReplyTemplates::load(&path).expect_err("blank template should fail");
        assert!(matches!(error, TemplateError::Empty("out_of_scope")));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = ReplyTemplates::load_or_default(Some(Path::new("/nonexistent/templates.toml")))
            .expect_err("missing file should fail");
        assert!(error.to_string().contains("/nonexistent/templates.toml"));
    }

    #[test]
    fn system_prompt_without_catalog_placeholder_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("templates.toml");
        fs::write(&path, "system_prompt = \"You are the shop assistant. Answer briefly.\"\n")
            .expect("write templates");

        let error = ReplyTemplates::load(&path).expect_err("prompt without catalog should fail");
        assert!(matches!(
            error,
            TemplateError::MissingPlaceholder { template: "system_prompt", placeholder: "{products}" }
        ));
    }

    #[test]
    fn blank_system_prompt_is_rejected() {
        let templates = ReplyTemplates { system_prompt: " ".to_string(), ..ReplyTemplates::default() };
        assert!(matches!(templates.validate(), Err(TemplateError::Empty("system_prompt"))));
    }

    #[test]
    fn placeholders_inside_product_names_are_not_expanded() {
        let templates = ReplyTemplates::default();
        let gift = Product { name: "Gift {price} card".to_string(), price: Decimal::new(500, 2) };

        assert_eq!(templates.render_product(&templates.product_line, &gift), "- Gift {price} card (€5.00)");
        assert_eq!(
            templates.render_product(&templates.product_price, &gift),
            "Gift {price} card maksā €5.00."
        );
    }

    #[test]
    fn fill_keeps_unknown_and_unbalanced_braces() {
        assert_eq!(fill("{a} {b} {a", &[("a", "x")]), "x {b} {a");
        assert_eq!(fill("no placeholders", &[("a", "x")]), "no placeholders");
        assert_eq!(fill("{}{a}}", &[("a", "€")]), "{}€}");
    }
}
