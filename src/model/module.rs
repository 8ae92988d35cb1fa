use serde::{Deserialize, Serialize};

/// A lesson from the `modules` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    /// Unique across the collection. Seeding uses it to tell whether a lesson already exists.
    pub title: String,
    pub description: String,
    /// Markdown.
    pub content: String,
    pub order: i64,
}

/// A lesson as written to the store by the seeder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModule {
    pub title: &'static str,
    pub description: &'static str,
    pub content: &'static str,
    pub order: i64,
}

impl Module {
    /// The markdown content with the indentation of the source text removed.
    pub fn body(&self) -> String {
        self.content
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_dedents() {
        let module = Module {
            id: "m".into(),
            title: "t".into(),
            description: "d".into(),
            content: "\n      ## Heading\n      Some text.\n    ".into(),
            order: 1,
        };
        assert_eq!(module.body(), "## Heading\nSome text.");
    }
}
