// ABOUTME: Integration tests for the show listing.
// ABOUTME: Inactive prints verbatim; group labels come from literal comparison.

mod support;

use jroll::engine::render_show;
use support::{FakeFleet, config};

const BASE: &str = "jroll.2024-01-01.00:00:00";

fn fleet() -> FakeFleet {
    let fleet = FakeFleet::new();
    fleet.add_jail(
        "n1",
        "w1",
        "10.0.0.11",
        "w1.example.net",
        "/usr/jails/w1",
        "tank/jails/w1",
        true,
        &[BASE],
    );
    fleet.add_jail(
        "n2",
        "w2",
        "10.0.0.12",
        "w2.example.net",
        "/usr/jails/w2",
        "tank/jails/w2",
        false,
        &[BASE],
    );
    fleet
}

#[tokio::test]
async fn groups_are_labeled_against_the_configured_value() {
    let cfg = config(
        r#"
projects:
  web:
    super: w0@super1
    inactive: green
    groups:
      blue:
        - w1@n1
      green:
        - w2@n2
"#,
    );
    let fleet = fleet();

    let listing = render_show(&fleet, &cfg, &[]).await.unwrap();
    assert!(listing.contains("web: inactive = green\n"));
    assert!(listing.contains("  group blue (active)\n"));
    assert!(listing.contains("  group green (inactive)\n"));
    assert!(listing.contains("w1@n1"));
    assert!(listing.contains("running"));
    assert!(listing.contains("w2@n2"));
    assert!(listing.contains("stopped"));
}

#[tokio::test]
async fn url_valued_inactive_prints_verbatim_without_resolving() {
    let cfg = config(
        r#"
projects:
  web:
    super: w0@super1
    inactive: https://deploy.example.net/web-tail
    groups:
      blue:
        - w1@n1
      green:
        - w2@n2
"#,
    );
    let fleet = fleet();

    // The fake fleet has no HTTP at all; rendering must not need it.
    let listing = render_show(&fleet, &cfg, &[]).await.unwrap();
    assert!(listing.contains("web: inactive = https://deploy.example.net/web-tail\n"));
    assert!(listing.contains("  group blue (active)\n"));
    assert!(listing.contains("  group green (active)\n"));
}

#[tokio::test]
async fn no_arguments_lists_every_project() {
    let cfg = config(
        r#"
projects:
  api:
    super: a0@super1
    inactive: blue
    groups:
      blue:
        - w1@n1
  web:
    super: w0@super1
    inactive: green
    groups:
      green:
        - w2@n2
"#,
    );
    let fleet = fleet();

    let listing = render_show(&fleet, &cfg, &[]).await.unwrap();
    let api_at = listing.find("api: inactive = blue").unwrap();
    let web_at = listing.find("web: inactive = green").unwrap();
    assert!(api_at < web_at);
}

#[tokio::test]
async fn named_projects_restrict_the_listing() {
    let cfg = config(
        r#"
projects:
  api:
    super: a0@super1
    inactive: blue
    groups:
      blue:
        - w1@n1
  web:
    super: w0@super1
    inactive: green
    groups:
      green:
        - w2@n2
"#,
    );
    let fleet = fleet();

    let listing = render_show(&fleet, &cfg, &["web".to_string()]).await.unwrap();
    assert!(listing.contains("web: inactive = green"));
    assert!(!listing.contains("api:"));
}

#[tokio::test]
async fn unknown_project_is_an_error() {
    let cfg = config(
        r#"
projects:
  web:
    super: w0@super1
    inactive: green
    groups:
      green:
        - w2@n2
"#,
    );
    let fleet = fleet();

    let err = render_show(&fleet, &cfg, &["nope".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, jroll::error::Error::UnknownProject(_)));
}
