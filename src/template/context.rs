use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::Organization;
use crate::data::RecipientRecord;

pub const TOKEN_DATE: &str = "Date";
pub const TOKEN_DOCUMENT_LINK: &str = "DocumentLink";

/// Token → value mapping a template is rendered against.
///
/// Built in layers; a later insert under the same name replaces the earlier
/// value, so organization constants and the generated link take precedence
/// over sheet cells of the same name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every cell of the recipient's row, keyed by column header.
    pub fn from_record(record: &RecipientRecord) -> Self {
        Self {
            values: record.fields.clone(),
        }
    }

    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.values.insert(token.into(), value.into());
    }

    pub fn with(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(token, value);
        self
    }

    /// Layer the organization constants and the formatted date on top.
    pub fn with_organization(mut self, org: &Organization, date: &str) -> Self {
        self.insert("TeamName", org.team_name.as_str());
        self.insert("InstitutionName", org.institution_name.as_str());
        for (i, line) in org.institution_address.iter().enumerate() {
            self.insert(format!("InstitutionAddress{}", i + 1), line.as_str());
        }
        self.insert("InstitutionAddress", org.institution_address.join(", "));
        self.insert("SenderName", org.sender_name.as_str());
        self.insert("SenderRole", org.sender_role.as_str());
        self.insert("SenderEmail", org.sender_email.as_str());
        self.insert("ContactNumber", org.contact_number.as_str());
        self.insert(TOKEN_DATE, date);
        self
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::RecipientStatus;

    fn record() -> RecipientRecord {
        let fields: BTreeMap<String, String> = [
            ("CompanyName", "Acme"),
            ("Email", "a@x.com"),
            ("DocumentLink", "http://old"),
            ("Date", "sheet date"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        RecipientRecord {
            row: 2,
            company_name: "Acme".to_string(),
            email: "a@x.com".to_string(),
            address: String::new(),
            document_link: "http://old".to_string(),
            status: RecipientStatus::Pending,
            last_sent: None,
            fields,
        }
    }

    #[test]
    fn test_layers_override_sheet_cells() {
        let org = Organization::default();
        let ctx = TemplateContext::from_record(&record())
            .with_organization(&org, "March 01, 2025")
            .with(TOKEN_DOCUMENT_LINK, "http://new");
        assert_eq!(ctx.get("CompanyName"), Some("Acme"));
        assert_eq!(ctx.get("Email"), Some("a@x.com"));
        assert_eq!(ctx.get("Date"), Some("March 01, 2025"));
        assert_eq!(ctx.get("DocumentLink"), Some("http://new"));
        assert_eq!(ctx.get("TeamName"), Some(org.team_name.as_str()));
    }

    #[test]
    fn test_institution_address_lines() {
        let org = Organization {
            institution_address: vec!["A St".to_string(), "B City".to_string()],
            ..Organization::default()
        };
        let ctx = TemplateContext::new().with_organization(&org, "d");
        assert_eq!(ctx.get("InstitutionAddress1"), Some("A St"));
        assert_eq!(ctx.get("InstitutionAddress2"), Some("B City"));
        assert_eq!(ctx.get("InstitutionAddress"), Some("A St, B City"));
    }
}
