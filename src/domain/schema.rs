use serde::{Deserialize, Serialize};

/// One column of the companies table as reported by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
}

/// Ordered column listing introspected from the store. Fetched once per
/// request and treated as immutable for the lifetime of that request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    columns: Vec<ColumnDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Render the schema as one `- Name (TYPE)` line per column, the form
    /// embedded into the generation prompt.
    pub fn to_prompt_lines(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("- {} ({})", c.name, c.declared_type))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SchemaDescriptor {
        SchemaDescriptor::new(vec![
            ColumnDescriptor {
                name: "CompanyName".to_string(),
                declared_type: "TEXT".to_string(),
            },
            ColumnDescriptor {
                name: "CompanyNumber".to_string(),
                declared_type: "TEXT".to_string(),
            },
        ])
    }

    #[test]
    fn test_prompt_lines_preserve_order() {
        let schema = sample();
        assert_eq!(
            schema.to_prompt_lines(),
            "- CompanyName (TEXT)\n- CompanyNumber (TEXT)"
        );
    }

    #[test]
    fn test_contains() {
        let schema = sample();
        assert!(schema.contains("CompanyNumber"));
        assert!(!schema.contains("companynumber"));
    }
}
