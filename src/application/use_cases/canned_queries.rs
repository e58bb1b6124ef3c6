//! Fixed administrative queries, kept in one immutable table so the set of
//! statements the service can run outside the generated path is auditable at
//! a glance. Every entry still passes through the statement policy before
//! execution.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedQuery {
    ListTables,
    ActiveCompanies,
    LiquidationCompanies,
    MicroEntityCompanies,
    CompanyCategories,
    AccountsCategories,
    Counties,
    CompaniesInSuffolk,
    AccountsDueNextMonth,
    PlumbingHeatAcCompanies,
}

impl CannedQuery {
    pub const ALL: [CannedQuery; 10] = [
        CannedQuery::ListTables,
        CannedQuery::ActiveCompanies,
        CannedQuery::LiquidationCompanies,
        CannedQuery::MicroEntityCompanies,
        CannedQuery::CompanyCategories,
        CannedQuery::AccountsCategories,
        CannedQuery::Counties,
        CannedQuery::CompaniesInSuffolk,
        CannedQuery::AccountsDueNextMonth,
        CannedQuery::PlumbingHeatAcCompanies,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CannedQuery::ListTables => "LIST_TABLES",
            CannedQuery::ActiveCompanies => "ACTIVE_COMPANIES",
            CannedQuery::LiquidationCompanies => "LIQUID_COMPANIES",
            CannedQuery::MicroEntityCompanies => "MICRO_ENTITY",
            CannedQuery::CompanyCategories => "COMPANY_CAT",
            CannedQuery::AccountsCategories => "ACCOUNTS_CAT",
            CannedQuery::Counties => "COUNTIES",
            CannedQuery::CompaniesInSuffolk => "COMPANIES_IN_SUFFOLK",
            CannedQuery::AccountsDueNextMonth => "ACCOUNTS_DUE_NEXT_MONTH",
            CannedQuery::PlumbingHeatAcCompanies => "PLUMBING_HEAT_AC_COMPANIES",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|q| q.name().eq_ignore_ascii_case(name))
    }

    pub fn sql(&self) -> &'static str {
        match self {
            CannedQuery::ListTables => {
                "SELECT name FROM sqlite_master WHERE type='table'"
            }
            CannedQuery::ActiveCompanies => {
                "SELECT CompanyName, CompanyNumber, CompanyStatus FROM companies WHERE CompanyStatus = 'Active' ORDER BY CompanyName LIMIT 20"
            }
            CannedQuery::LiquidationCompanies => {
                "SELECT CompanyName, CompanyNumber, CompanyStatus FROM companies WHERE CompanyStatus = 'Liquidation' LIMIT 20"
            }
            CannedQuery::MicroEntityCompanies => {
                "SELECT CompanyName, CompanyNumber, AccountsAccountCategory FROM companies WHERE AccountsAccountCategory = 'MICRO ENTITY' LIMIT 20"
            }
            CannedQuery::CompanyCategories => {
                "SELECT DISTINCT CompanyCategory FROM companies"
            }
            CannedQuery::AccountsCategories => {
                "SELECT DISTINCT AccountsAccountCategory FROM companies"
            }
            CannedQuery::Counties => {
                "SELECT DISTINCT RegAddressCounty FROM companies"
            }
            CannedQuery::CompaniesInSuffolk => {
                "SELECT CompanyName, CompanyNumber, RegAddressCounty FROM companies WHERE UPPER(RegAddressCounty) LIKE '%SUFFOLK%' LIMIT 20"
            }
            CannedQuery::AccountsDueNextMonth => {
                "SELECT CompanyName, CompanyNumber, AccountsNextDueDate FROM companies WHERE date(AccountsNextDueDate) BETWEEN date('now') AND date('now', '+1 month') ORDER BY AccountsNextDueDate LIMIT 20"
            }
            CannedQuery::PlumbingHeatAcCompanies => {
                "SELECT CompanyName, CompanyNumber, SICCodeSicText_1 FROM companies WHERE SICCodeSicText_1 LIKE '%43220%' OR SICCodeSicText_2 LIKE '%43220%' OR SICCodeSicText_3 LIKE '%43220%' OR SICCodeSicText_4 LIKE '%43220%' LIMIT 20"
            }
        }
    }
}

impl fmt::Display for CannedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
