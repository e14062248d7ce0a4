use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::CsvOptions;
use crate::render::BodyFormat;
use crate::smtp::SmtpProfile;
use crate::{LetterMergeError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "lettermerge.toml";

/// Everything a run needs, loaded from `lettermerge.toml`.
///
/// Every section is optional; missing keys take the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub run: RunSettings,
    pub organization: Organization,
    pub storage: StorageSettings,
    pub smtp: SmtpProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Recipient spreadsheet (CSV).
    pub sheet: PathBuf,
    /// Column separator; detected from the header line when unset.
    pub separator: Option<char>,
    /// Text encoding label; UTF-8 with a Windows-1252 fallback when unset.
    pub encoding: Option<String>,
    /// Email body template with `{{token}}` placeholders.
    pub template: PathBuf,
    pub body_format: BodyFormat,
    /// CSS file inlined into HTML bodies, relative to the template directory.
    pub stylesheet: Option<PathBuf>,
    pub subject: String,
    /// Leave rows whose status is already `Sent` alone.
    pub skip_sent: bool,
    /// Receives the failure notice when a run aborts. Defaults to the SMTP sender.
    pub operator_email: Option<String>,
    /// Write the run report as JSON here.
    pub report: Option<PathBuf>,
}

impl RunSettings {
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            separator: self.separator,
            encoding: self.encoding.clone(),
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            sheet: PathBuf::from("recipients.csv"),
            separator: None,
            encoding: None,
            template: PathBuf::from("templates/index.html"),
            body_format: BodyFormat::Html,
            stylesheet: None,
            subject: "Proposal from {{CompanyName}}".to_string(),
            skip_sent: false,
            operator_email: None,
            report: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub role: String,
}

/// Organization details printed in every letter and available to the email
/// template as tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub team_name: String,
    pub institution_name: String,
    pub institution_address: Vec<String>,
    pub sender_name: String,
    pub sender_role: String,
    pub sender_email: String,
    pub contact_number: String,
    /// Printed under the recipient's address.
    pub recipient_locality: String,
    pub roster: Vec<TeamMember>,
}

impl Default for Organization {
    fn default() -> Self {
        Self {
            team_name: "Software Engineering Team".to_string(),
            institution_name: "Example University".to_string(),
            institution_address: vec![
                "1 University Avenue".to_string(),
                "Springfield, 1000".to_string(),
            ],
            sender_name: "Project Manager".to_string(),
            sender_role: "Project Manager".to_string(),
            sender_email: "team@example.edu".to_string(),
            contact_number: "000 000 0000".to_string(),
            recipient_locality: String::new(),
            roster: Vec::new(),
        }
    }
}

impl Organization {
    /// Display name used on outgoing mail, e.g. `Jane Doe – Project Manager`.
    pub fn sender_display_name(&self) -> String {
        if self.sender_role.is_empty() {
            self.sender_name.clone()
        } else {
            format!("{} – {}", self.sender_name, self.sender_role)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the artifact folder.
    pub root: PathBuf,
    /// Name of the shared folder generated letters are stored in.
    pub folder: String,
    /// Public URL under which `root` is served.
    pub public_base_url: String,
    /// Directory with `<family>-Regular.ttf`, `-Bold`, `-Italic`, `-BoldItalic`.
    pub font_dir: PathBuf,
    pub font_family: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("shared"),
            folder: "Generated LOIs".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            font_dir: PathBuf::from("fonts"),
            font_family: "LiberationSerif".to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| LetterMergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &content)
    }

    /// Like [`Settings::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    fn from_toml(path: &Path, content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|source| LetterMergeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Address the abort notice goes to.
    pub fn operator_address(&self) -> &str {
        self.run
            .operator_email
            .as_deref()
            .unwrap_or(&self.smtp.from)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::smtp::Encryption;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = Settings::from_toml(Path::new("<test>"), "").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.storage.folder, "Generated LOIs");
        assert_eq!(settings.run.subject, "Proposal from {{CompanyName}}");
        assert!(!settings.run.skip_sent);
    }

    #[test]
    fn test_full_file() {
        let toml = r#"
[run]
sheet = "data/companies.csv"
separator = ";"
template = "mail/body.md"
body_format = "markdown"
subject = "Letter for {{CompanyName}}"
skip_sent = true
operator_email = "ops@example.com"

[organization]
team_name = "Blue Team"
institution_name = "Northfield College"
institution_address = ["12 College Rd", "Northfield"]
sender_name = "Jane Doe"
sender_role = "Lead"
sender_email = "jane@example.edu"
contact_number = "555 0100"
roster = [{ name = "Doe, Jane", role = "Lead" }]

[storage]
root = "/srv/share"
public_base_url = "https://files.example.edu/"

[smtp]
name = "campus"
host = "smtp.example.edu"
port = 465
encryption = "tls"
from = "jane@example.edu"
"#;
        let s = Settings::from_toml(Path::new("<test>"), toml).unwrap();
        assert_eq!(s.run.sheet, PathBuf::from("data/companies.csv"));
        assert_eq!(s.run.csv_options().separator, Some(';'));
        assert_eq!(s.run.body_format, BodyFormat::Markdown);
        assert!(s.run.skip_sent);
        assert_eq!(s.organization.roster.len(), 1);
        assert_eq!(s.organization.roster[0].name, "Doe, Jane");
        assert_eq!(s.organization.sender_display_name(), "Jane Doe – Lead");
        assert_eq!(s.storage.folder, "Generated LOIs");
        assert_eq!(s.smtp.encryption, Encryption::Tls);
        assert_eq!(s.operator_address(), "ops@example.com");
    }

    #[test]
    fn test_operator_defaults_to_sender() {
        let s = Settings::from_toml(
            Path::new("<test>"),
            "[smtp]\nname = \"p\"\nhost = \"h\"\nport = 25\nencryption = \"none\"\nfrom = \"me@h.com\"\n",
        )
        .unwrap();
        assert_eq!(s.operator_address(), "me@h.com");
    }

    #[test]
    fn test_invalid_toml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"[run\nsheet = ").unwrap();
        assert!(matches!(
            Settings::load(f.path()),
            Err(LetterMergeError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let s = Settings::load_or_default(Path::new("/nonexistent/lettermerge.toml")).unwrap();
        assert_eq!(s, Settings::default());
    }
}
