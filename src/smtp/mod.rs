use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};

use crate::{render::RenderedEmail, LetterMergeError, Result};

/// Encryption mode for an SMTP connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encryption {
    None,
    StartTls,
    Tls,
}

/// SMTP connection settings. Credentials live in the OS keychain under `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpProfile {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub encryption: Encryption,
    /// RFC 5322 from address used for all sent messages.
    pub from: String,
}

impl Default for SmtpProfile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            host: "localhost".to_string(),
            port: 587,
            encryption: Encryption::StartTls,
            from: "noreply@localhost".to_string(),
        }
    }
}

/// SMTP account credentials retrieved from the OS keychain.
#[derive(Debug, Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

/// Delivers one message. Implementations do not retry.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &RenderedEmail) -> Result<()>;
}

const KEYRING_SERVICE: &str = "lettermerge";

/// Store SMTP credentials in the OS keychain for `profile_name`.
///
/// Both `username` and `password` are stored in a single keyring entry,
/// separated by a newline.
pub fn store_credential(profile_name: &str, username: &str, password: &str) -> Result<()> {
    let entry = keyring_entry(profile_name)?;
    let value = format!("{username}\n{password}");
    entry
        .set_password(&value)
        .map_err(|e| LetterMergeError::Keyring {
            reason: e.to_string(),
        })
}

/// Retrieve SMTP credentials from the OS keychain for `profile_name`.
pub fn retrieve_credential(profile_name: &str) -> Result<SmtpCredentials> {
    let entry = keyring_entry(profile_name)?;
    let value = entry.get_password().map_err(|e| LetterMergeError::Keyring {
        reason: e.to_string(),
    })?;
    parse_credential(profile_name, &value)
}

/// Remove SMTP credentials from the OS keychain for `profile_name`.
pub fn delete_credential(profile_name: &str) -> Result<()> {
    let entry = keyring_entry(profile_name)?;
    entry
        .delete_credential()
        .map_err(|e| LetterMergeError::Keyring {
            reason: e.to_string(),
        })
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, profile_name).map_err(|e| LetterMergeError::Keyring {
        reason: e.to_string(),
    })
}

fn parse_credential(profile_name: &str, value: &str) -> Result<SmtpCredentials> {
    let (username, password) = value
        .split_once('\n')
        .ok_or_else(|| LetterMergeError::Keyring {
            reason: format!("malformed credential entry for profile '{profile_name}'"),
        })?;
    Ok(SmtpCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// [`Mailer`] over a lettre async SMTP transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Address,
}

impl SmtpMailer {
    pub fn new(profile: &SmtpProfile, credentials: &SmtpCredentials) -> Result<Self> {
        let from = profile
            .from
            .parse::<Address>()
            .map_err(|e| LetterMergeError::SmtpConnect {
                reason: format!("invalid from address '{}': {e}", profile.from),
            })?;
        Ok(Self {
            transport: build_transport(profile, credentials)?,
            from,
        })
    }

    /// Open an SMTP connection and verify the server is reachable (no message sent).
    pub async fn test_connection(&self) -> Result<()> {
        let reachable = self
            .transport
            .test_connection()
            .await
            .map_err(|e| LetterMergeError::SmtpConnect {
                reason: e.to_string(),
            })?;
        if reachable {
            Ok(())
        } else {
            Err(LetterMergeError::SmtpConnect {
                reason: "server did not accept the connection".to_string(),
            })
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &RenderedEmail) -> Result<()> {
        let message = build_message(email, &self.from)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| LetterMergeError::SmtpSend {
                recipient: email.to.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

/// Build a lettre async SMTP transport from the given profile and credentials.
fn build_transport(
    profile: &SmtpProfile,
    credentials: &SmtpCredentials,
) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let creds = Credentials::new(credentials.username.clone(), credentials.password.clone());
    let transport = match profile.encryption {
        Encryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&profile.host)
            .map_err(|e| LetterMergeError::SmtpConnect {
                reason: e.to_string(),
            })?
            .port(profile.port)
            .credentials(creds)
            .build(),
        Encryption::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&profile.host)
            .map_err(|e| LetterMergeError::SmtpConnect {
                reason: e.to_string(),
            })?
            .port(profile.port)
            .credentials(creds)
            .build(),
        Encryption::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&profile.host)
            .port(profile.port)
            .credentials(creds)
            .build(),
    };
    Ok(transport)
}

/// Build a lettre [`Message`] from a [`RenderedEmail`].
///
/// Produces `multipart/alternative` when `html_body` is present, plain text otherwise.
fn build_message(email: &RenderedEmail, from: &Address) -> Result<Message> {
    let send_err = |reason: String| LetterMergeError::SmtpSend {
        recipient: email.to.clone(),
        reason,
    };

    let from_mbox = Mailbox::new(email.sender_name.clone(), from.clone());
    let to_mbox = email
        .to
        .parse::<Mailbox>()
        .map_err(|e| send_err(format!("invalid to address '{}': {e}", email.to)))?;

    let builder = Message::builder()
        .from(from_mbox)
        .to(to_mbox)
        .subject(&email.subject);

    let message = match &email.html_body {
        Some(html) => builder.multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(email.text_body.clone()))
                .singlepart(SinglePart::html(html.clone())),
        ),
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.text_body.clone()),
    };

    message.map_err(|e| send_err(format!("failed to build message: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_email(to: &str) -> RenderedEmail {
        RenderedEmail {
            to: to.to_string(),
            subject: "Proposal from Acme".to_string(),
            html_body: Some("<p>Hello</p>".to_string()),
            text_body: "Hello".to_string(),
            sender_name: Some("Jane Doe - Lead".to_string()),
        }
    }

    fn from() -> Address {
        "sender@example.com".parse().unwrap()
    }

    #[test]
    fn test_profile_defaults_fill_missing_keys() {
        let profile: SmtpProfile =
            toml::from_str("host = \"smtp.example.com\"\nencryption = \"tls\"").unwrap();
        assert_eq!(profile.host, "smtp.example.com");
        assert_eq!(profile.encryption, Encryption::Tls);
        assert_eq!(profile.port, 587);
        assert_eq!(profile.name, "default");
    }

    #[test]
    fn test_encryption_names() {
        let profile: SmtpProfile = toml::from_str("encryption = \"start_tls\"").unwrap();
        assert_eq!(profile.encryption, Encryption::StartTls);
        let profile: SmtpProfile = toml::from_str("encryption = \"none\"").unwrap();
        assert_eq!(profile.encryption, Encryption::None);
    }

    #[test]
    fn test_parse_credential() {
        let creds = parse_credential("p", "user@example.com\nsecret\nwith newline").unwrap();
        assert_eq!(creds.username, "user@example.com");
        assert_eq!(creds.password, "secret\nwith newline");
        assert!(matches!(
            parse_credential("p", "no-separator"),
            Err(LetterMergeError::Keyring { .. })
        ));
    }

    #[test]
    fn test_build_message_headers() {
        let email = sample_email("recipient@example.com");
        let msg = build_message(&email, &from()).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("recipient@example.com"), "missing To address");
        assert!(raw.contains("Subject: Proposal from Acme"), "missing Subject");
        assert!(raw.contains("sender@example.com"), "missing From address");
        assert!(raw.contains("Jane Doe - Lead"), "missing sender display name");
    }

    #[test]
    fn test_build_message_multipart_html() {
        let email = sample_email("r@example.com");
        let msg = build_message(&email, &from()).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(
            raw.contains("multipart/alternative"),
            "expected multipart/alternative"
        );
        assert!(raw.contains("<p>Hello</p>"), "missing html body");
    }

    #[test]
    fn test_build_message_plain_text_only() {
        let email = RenderedEmail::plain("ops@example.com", "Auto Email System Failure", "boom");
        let msg = build_message(&email, &from()).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(!raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("boom"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let email = sample_email("not an address");
        let err = build_message(&email, &from()).unwrap_err();
        assert!(
            matches!(err, LetterMergeError::SmtpSend { ref recipient, .. } if recipient == "not an address"),
            "got: {err}"
        );
    }
}
