use std::path::{Path, PathBuf};

use lettermerge_lib::{
    config::Settings,
    data::{load_recipients, CsvOptions, CsvSheet, RecipientStatus},
    render::EmailTemplate,
    template::TemplateContext,
};

fn manifest_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn example_settings() -> Settings {
    Settings::load(&manifest_dir().join("lettermerge.example.toml")).unwrap()
}

#[test]
fn test_example_config_parses() {
    let settings = example_settings();
    assert_eq!(settings.run.sheet, Path::new("fixtures/recipients.csv"));
    assert_eq!(settings.organization.roster.len(), 3);
    assert_eq!(settings.organization.roster[1].role, "Backend Developer");
    assert_eq!(
        settings.organization.sender_display_name(),
        "Alex Morgan – Project Manager"
    );
    assert_eq!(settings.operator_address(), "team@example.edu");
}

#[test]
fn test_fixture_sheet_loads() {
    let sheet = CsvSheet::open(
        &manifest_dir().join("fixtures").join("recipients.csv"),
        &CsvOptions::default(),
    )
    .unwrap();
    let loaded = load_recipients(&sheet).unwrap();

    let companies: Vec<&str> = loaded
        .records
        .iter()
        .map(|r| r.company_name.as_str())
        .collect();
    assert_eq!(companies, ["Acme Widgets", "Gamma Analytics"]);
    assert_eq!(loaded.skipped_rows, vec![3]);
    assert_eq!(loaded.records[0].address, "12 Foundry Lane, Rivertown");
    assert_eq!(loaded.records[0].status, RecipientStatus::Pending);
    assert_eq!(loaded.records[1].status, RecipientStatus::Sent);
    assert_eq!(loaded.records[1].row, 4);
}

#[test]
fn test_bundled_template_renders_every_token() {
    let settings = example_settings();
    let run = &settings.run;
    let template = EmailTemplate::load(
        &manifest_dir().join(&run.template),
        run.body_format,
        run.stylesheet.as_deref(),
    )
    .unwrap();

    let sheet = CsvSheet::open(
        &manifest_dir().join("fixtures").join("recipients.csv"),
        &CsvOptions::default(),
    )
    .unwrap();
    let record = load_recipients(&sheet).unwrap().records.remove(0);
    let context = TemplateContext::from_record(&record)
        .with_organization(&settings.organization, "March 01, 2025")
        .with("DocumentLink", "http://localhost:8080/x.pdf");

    let email = template.render(&record.email, &run.subject, &context).unwrap();
    assert_eq!(email.subject, "Proposal from Acme Widgets");
    let html = email.html_body.unwrap();
    assert!(!html.contains("{{"), "unrendered token in: {html}");
    assert!(html.contains("http://localhost:8080/x.pdf"));
    assert!(html.contains("font-family"), "stylesheet not inlined: {html}");
    assert!(email.text_body.contains("Dear Acme Widgets,"));
}
