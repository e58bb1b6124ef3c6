pub mod use_cases;

pub use use_cases::search_companies::SearchCompanies;
