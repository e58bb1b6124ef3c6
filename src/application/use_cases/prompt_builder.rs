//! Instruction text for the SQL generator.
//!
//! The domain knowledge baked in here (column roles, value vocabularies,
//! address-search and date idioms, the ordering/limit mandate) is what makes
//! the generated queries usable; the generator itself knows nothing about the
//! register. The output is a pure function of the schema and these constants.

use crate::domain::schema::SchemaDescriptor;
use std::fmt::Write;

/// Columns every generated statement must return, question or not.
const REQUIRED_COLUMNS: [&str; 9] = [
    "CompanyName",
    "CompanyNumber",
    "CompanyStatus",
    "CompanyCategory",
    "RegAddressPostCode",
    "RegAddressCounty",
    "RegAddressPostTown",
    "AccountsAccountCategory",
    "AccountsNextDueDate",
];

/// Added only when the question concerns industries, activities or occupations.
const SIC_COLUMNS: [&str; 4] = [
    "SICCodeSicText_1",
    "SICCodeSicText_2",
    "SICCodeSicText_3",
    "SICCodeSicText_4",
];

/// Address fields searched for location questions, most to least specific.
const ADDRESS_COLUMNS: [&str; 4] = [
    "RegAddressCounty",
    "RegAddressPostTown",
    "RegAddressAddressLine1",
    "RegAddressAddressLine2",
];

pub const DEFAULT_RESULT_LIMIT: u32 = 20;

pub struct PromptBuilder {
    table: String,
}

impl PromptBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// Build the system instruction block for one generation call.
    /// Deterministic: the same schema always yields byte-identical text.
    pub fn build_instructions(&self, schema: &SchemaDescriptor) -> String {
        let mut prompt = String::new();

        writeln!(
            prompt,
            "You are an expert SQL writer. Your task is to convert a user's natural language question into a valid SQLite query."
        )
        .unwrap();
        writeln!(
            prompt,
            "You must only respond with the SQL query and nothing else. Do not add any explanation or markdown formatting.\n"
        )
        .unwrap();

        writeln!(
            prompt,
            "Important: Always include these key columns in your SELECT statements:"
        )
        .unwrap();
        for column in REQUIRED_COLUMNS {
            writeln!(prompt, "- {}", column).unwrap();
        }

        writeln!(
            prompt,
            "\nIf SIC codes, business activities, industries or jobs are queried, also return the following columns:"
        )
        .unwrap();
        for column in SIC_COLUMNS {
            writeln!(prompt, "- {}", column).unwrap();
        }

        writeln!(
            prompt,
            "\nThe database table is named '{}' and has the following columns:",
            self.table
        )
        .unwrap();
        writeln!(prompt, "{}", schema.to_prompt_lines()).unwrap();

        writeln!(
            prompt,
            "\nHere are some examples of valid values in the database:"
        )
        .unwrap();
        writeln!(
            prompt,
            "- CompanyStatus can be 'Active', 'Liquidation', 'Voluntary', 'Dissolved', 'Admin', etc."
        )
        .unwrap();
        writeln!(
            prompt,
            "- AccountsAccountCategory can be 'MICRO ENTITY', 'SMALL', 'DORMANT', etc."
        )
        .unwrap();
        writeln!(
            prompt,
            "- CompanyCategory common values: 'Private Limited Company', 'Private Limited by Shares', 'Private Unlimited Company', 'Public Limited Company', 'Limited Liability Partnership', 'Charitable Company', 'Investment Company'"
        )
        .unwrap();

        writeln!(prompt, "- For location-based queries, search in these fields:").unwrap();
        for column in ADDRESS_COLUMNS {
            writeln!(prompt, "    - {}", column).unwrap();
        }
        writeln!(prompt, "- Example for Suffolk:").unwrap();
        writeln!(
            prompt,
            "  WHERE UPPER(RegAddressCounty) LIKE '%SUFFOLK%'\n     OR UPPER(RegAddressPostTown) LIKE '%SUFFOLK%'\n     OR UPPER(RegAddressAddressLine1) LIKE '%SUFFOLK%'\n     OR UPPER(RegAddressAddressLine2) LIKE '%SUFFOLK%'"
        )
        .unwrap();
        writeln!(
            prompt,
            "- For queries involving strings, use UPPER() and LIKE '%...%' for case-insensitive matching."
        )
        .unwrap();

        writeln!(
            prompt,
            "\nFor date-based queries:\n- Use SQLite date functions for date comparisons.\n- AccountsNextDueDate is stored as text in 'YYYY-MM-DD' format.\n- Always exclude missing values with: AccountsNextDueDate IS NOT NULL AND AccountsNextDueDate != ''\n- To find records within a date range, use:\n  date(trim(AccountsNextDueDate)) BETWEEN date('now') AND date('now', '+1 month')"
        )
        .unwrap();
        writeln!(
            prompt,
            "- Example:\n  SELECT * FROM {}\n  WHERE AccountsNextDueDate IS NOT NULL\n    AND AccountsNextDueDate != ''\n    AND date(trim(AccountsNextDueDate)) BETWEEN date('now') AND date('now', '+1 month')",
            self.table
        )
        .unwrap();

        writeln!(
            prompt,
            "\nWhen searching for company types:\n1. For private limited companies, use: UPPER(CompanyCategory) LIKE '%PRIVATE%'\n2. For public limited companies, use: UPPER(CompanyCategory) LIKE '%PUBLIC%' OR UPPER(CompanyCategory) = 'PLC' OR UPPER(CompanyCategory) = 'PUBLIC LIMITED COMPANY'\n3. For specific categories, match the full category name exactly (e.g., 'Public Limited Company')\n4. Always include the exact filter in the WHERE clause that matches the requested company type"
        )
        .unwrap();

        writeln!(
            prompt,
            "\nOnly use SIC codes if the query specifically asks about business activities or industries."
        )
        .unwrap();

        writeln!(
            prompt,
            "\nAlways include ORDER BY and LIMIT clauses to ensure the query returns a manageable number of results.\nDefault to LIMIT {} if no specific limit is mentioned in the query.",
            DEFAULT_RESULT_LIMIT
        )
        .unwrap();

        writeln!(
            prompt,
            "\nBased on this schema, convert the following user question into a SQLite query."
        )
        .unwrap();

        prompt
    }
}
