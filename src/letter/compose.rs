use crate::config::Organization;
use crate::data::RecipientRecord;

use super::{Letter, LetterBuilder, PARAGRAPH_SPACING};

pub const MAX_FILE_STEM_CHARS: usize = 120;
pub const FILE_STEM_FALLBACK: &str = "client";

const COMPANY_PLACEHOLDER: &str = "[Company Name]";
const ADDRESS_PLACEHOLDER: &str = "[Company Address]";

/// File-name-safe form of a display name: path-illegal characters removed,
/// at most [`MAX_FILE_STEM_CHARS`] characters, [`FILE_STEM_FALLBACK`] when blank.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .take(MAX_FILE_STEM_CHARS)
        .collect();
    if cleaned.trim().is_empty() {
        FILE_STEM_FALLBACK.to_string()
    } else {
        cleaned
    }
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

/// Lay out the letter of intent for one recipient.
pub fn compose_letter(recipient: &RecipientRecord, org: &Organization, date: &str) -> Letter {
    let company = or_placeholder(&recipient.company_name, COMPANY_PLACEHOLDER);
    let address = or_placeholder(&recipient.address, ADDRESS_PLACEHOLDER);
    let team = org.team_name.as_str();

    let mut doc = LetterBuilder::new(format!("LOI - {}", sanitize_file_stem(&recipient.company_name)));

    for member in &org.roster {
        doc.paragraph(member.name.as_str(), true)
            .paragraph(member.role.as_str(), false);
    }
    if !org.roster.is_empty() {
        doc.spaced("", false, PARAGRAPH_SPACING);
    }

    doc.paragraph(team, false);
    for line in &org.institution_address {
        doc.paragraph(line.as_str(), false);
    }
    doc.spaced(date, false, PARAGRAPH_SPACING);

    doc.paragraph(company, false);
    if org.recipient_locality.is_empty() {
        doc.spaced(address, false, PARAGRAPH_SPACING);
    } else {
        doc.paragraph(address, false)
            .spaced(org.recipient_locality.as_str(), false, PARAGRAPH_SPACING);
    }

    doc.spaced(
        "Re: Letter of Intent for Software Development Collaboration",
        true,
        6.0,
    )
    .spaced(format!("Dear {company},"), false, PARAGRAPH_SPACING);

    doc.spaced(
        format!(
            "On behalf of the {team}, it is with great enthusiasm that I convey our intent to \
             collaborate with {company} in crafting a software solution designed to serve your \
             unique goals. As a dedicated team of students from {institution}, we bring not only \
             technical skills but also fresh perspectives, adaptability, and a drive to deliver \
             meaningful outcomes.",
            institution = org.institution_name,
        ),
        false,
        PARAGRAPH_SPACING,
    );

    doc.paragraph("Proposed Areas of Collaboration:", true)
        .bullet(
            "Software Development: Our team is committed to building a solution that is \
             thoughtfully designed, robust in performance, and intuitive for end-users. Beyond \
             functionality, we aim to create a system that will streamline processes, optimize \
             efficiency, and adapt to future needs.",
        )
        .bullet(
            "Collaborative Engagement: We value open communication as the foundation of a \
             successful project. To that end, we propose maintaining regular exchanges through \
             meetings, progress reviews, and feedback sessions, ensuring transparency and \
             alignment every step of the way.",
        )
        .spaced("", false, PARAGRAPH_SPACING);

    doc.paragraph("Request for Partnership Confirmation", true).spaced(
        "We respectfully seek your approval to formalize this collaboration. With your \
         confirmation, we will prepare a comprehensive project outline detailing the objectives, \
         deliverables, timelines, and shared responsibilities to guide our partnership.",
        false,
        PARAGRAPH_SPACING,
    );

    doc.paragraph("Closing Note", true)
        .spaced(
            format!(
                "At the {team}, our mission is to go beyond delivering a product; we aspire to \
                 create solutions that make an impact. We believe this partnership holds the \
                 potential to bring real value to your organization while allowing us to apply \
                 our expertise in a meaningful and professional setting."
            ),
            false,
            PARAGRAPH_SPACING,
        )
        .spaced(
            format!(
                "Should you have any questions or wish to discuss this further, please feel free \
                 to contact me at {} or via email at {}. We would be delighted to meet at your \
                 convenience.",
                org.contact_number, org.sender_email
            ),
            false,
            PARAGRAPH_SPACING,
        )
        .spaced(
            "Thank you very much for considering this opportunity. We look forward to working \
             with you and contributing to your success.",
            false,
            12.0,
        );

    doc.spaced("Yours sincerely,", false, PARAGRAPH_SPACING)
        .paragraph(org.sender_name.as_str(), true)
        .paragraph(org.sender_role.as_str(), false)
        .paragraph(team, false);

    doc.finish()
}
