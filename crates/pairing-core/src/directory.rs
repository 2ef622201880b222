use crate::error::{PairingError, Result};
use crate::types::{Participant, Role};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Identity directory used to fill in reporting lines and titles.
///
/// Both lookups return `Ok(None)` when the directory has no answer and `Err`
/// when the directory could not be asked at all.
pub trait Directory {
    fn manager_of(&self, id: &str) -> Result<Option<String>>;
    fn title_of(&self, id: &str) -> Result<Option<String>>;
}

// ---------------------------------------------------------------------------
// GraphDirectory
// ---------------------------------------------------------------------------

pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// Microsoft Graph `users` endpoints, one blocking request per lookup.
pub struct GraphDirectory {
    client: Client,
    base_url: String,
    token: String,
}

impl GraphDirectory {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn get(&self, actor: &str, path: &str) -> Result<Option<serde_json::Value>> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| PairingError::Directory {
                actor: actor.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PairingError::Directory {
                actor: actor.to_string(),
                message: format!("GET {path} returned {status}"),
            });
        }
        let body = resp.json().map_err(|e| PairingError::Directory {
            actor: actor.to_string(),
            message: format!("invalid response body: {e}"),
        })?;
        Ok(Some(body))
    }
}

fn string_field(value: Option<serde_json::Value>, field: &str) -> Option<String> {
    value?
        .get(field)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Directory for GraphDirectory {
    fn manager_of(&self, id: &str) -> Result<Option<String>> {
        let body = self.get(id, &format!("users/{id}/manager"))?;
        Ok(string_field(body, "userPrincipalName"))
    }

    fn title_of(&self, id: &str) -> Result<Option<String>> {
        let body = self.get(id, &format!("users/{id}"))?;
        Ok(string_field(body, "jobTitle"))
    }
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub enriched: usize,
    pub missing_skip_manager: Vec<String>,
    pub missing_title: Vec<String>,
}

/// Fill in manager, skip manager and title for every mentor and mentee.
///
/// Lookups run one participant at a time. Values already present on a record
/// are kept. A participant without a manager aborts the whole enrichment;
/// a missing skip manager or title is logged and left empty. Records with an
/// unrecognized role are never matched, so they are not looked up.
pub fn enrich(people: &mut [Participant], directory: &dyn Directory) -> Result<EnrichmentReport> {
    let mut report = EnrichmentReport::default();
    tracing::info!(participants = people.len(), "enriching participants");

    for p in people.iter_mut() {
        if Role::parse(&p.role).is_none() {
            continue;
        }

        let manager = match p.attributes.manager.clone() {
            Some(m) => m,
            None => directory
                .manager_of(&p.email)?
                .ok_or_else(|| PairingError::MissingManager {
                    actor: p.email.clone(),
                })?,
        };

        if p.attributes.skip_manager.is_none() {
            p.attributes.skip_manager = optional(directory.manager_of(&manager), &p.email, "skip manager");
            if p.attributes.skip_manager.is_none() {
                report.missing_skip_manager.push(p.email.clone());
            }
        }

        if p.attributes.title.is_none() {
            p.attributes.title = optional(directory.title_of(&p.email), &p.email, "title");
            if p.attributes.title.is_none() {
                report.missing_title.push(p.email.clone());
            }
        }

        p.attributes.manager = Some(manager);
        report.enriched += 1;
    }

    tracing::info!(
        enriched = report.enriched,
        missing_skip_manager = report.missing_skip_manager.len(),
        missing_title = report.missing_title.len(),
        "done enriching participants"
    );
    Ok(report)
}

fn optional(lookup: Result<Option<String>>, email: &str, what: &str) -> Option<String> {
    match lookup {
        Ok(Some(v)) => Some(v),
        Ok(None) => {
            tracing::info!(email, "could not find {what}");
            None
        }
        Err(e) => {
            tracing::warn!(email, error = %e, "{what} lookup failed");
            None
        }
    }
}

/// Without a directory every mentor and mentee must already name a manager.
pub fn require_managers(people: &[Participant]) -> Result<()> {
    for p in people {
        if Role::parse(&p.role).is_none() {
            continue;
        }
        if p.attributes.manager.as_deref().map_or(true, str::is_empty) {
            return Err(PairingError::MissingManager {
                actor: p.email.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attributes;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeDirectory {
        managers: HashMap<String, String>,
        titles: HashMap<String, String>,
        lookups: RefCell<Vec<String>>,
    }

    impl FakeDirectory {
        fn manager(mut self, who: &str, boss: &str) -> Self {
            self.managers.insert(who.into(), boss.into());
            self
        }

        fn title(mut self, who: &str, title: &str) -> Self {
            self.titles.insert(who.into(), title.into());
            self
        }
    }

    impl Directory for FakeDirectory {
        fn manager_of(&self, id: &str) -> Result<Option<String>> {
            self.lookups.borrow_mut().push(format!("manager:{id}"));
            Ok(self.managers.get(id).cloned())
        }

        fn title_of(&self, id: &str) -> Result<Option<String>> {
            self.lookups.borrow_mut().push(format!("title:{id}"));
            Ok(self.titles.get(id).cloned())
        }
    }

    fn person(email: &str, role: &str) -> Participant {
        Participant {
            email: email.into(),
            role: role.into(),
            mentor_capacity: None,
            attributes: Attributes::default(),
        }
    }

    #[test]
    fn fills_manager_skip_manager_and_title() {
        let dir = FakeDirectory::default()
            .manager("ana", "boss")
            .manager("boss", "bigboss")
            .title("ana", "Senior Engineer");
        let mut people = vec![person("ana", "Mentor")];
        let report = enrich(&mut people, &dir).unwrap();
        let a = &people[0].attributes;
        assert_eq!(a.manager.as_deref(), Some("boss"));
        assert_eq!(a.skip_manager.as_deref(), Some("bigboss"));
        assert_eq!(a.title.as_deref(), Some("Senior Engineer"));
        assert_eq!(report.enriched, 1);
        assert!(report.missing_title.is_empty());
    }

    #[test]
    fn missing_manager_is_fatal_and_names_the_actor() {
        let dir = FakeDirectory::default().manager("ana", "boss");
        let mut people = vec![person("ana", "Mentor"), person("bo", "Mentee")];
        let err = enrich(&mut people, &dir).unwrap_err();
        match err {
            PairingError::MissingManager { actor } => assert_eq!(actor, "bo"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_optional_attributes_are_tolerated() {
        let dir = FakeDirectory::default().manager("bo", "boss");
        let mut people = vec![person("bo", "Mentee")];
        let report = enrich(&mut people, &dir).unwrap();
        assert_eq!(people[0].attributes.skip_manager, None);
        assert_eq!(people[0].attributes.title, None);
        assert_eq!(report.missing_skip_manager, ["bo"]);
        assert_eq!(report.missing_title, ["bo"]);
    }

    #[test]
    fn existing_values_are_not_looked_up() {
        let dir = FakeDirectory::default();
        let mut p = person("ana", "Mentor");
        p.attributes.manager = Some("boss".into());
        p.attributes.skip_manager = Some("bigboss".into());
        p.attributes.title = Some("Staff Engineer".into());
        let mut people = vec![p];
        enrich(&mut people, &dir).unwrap();
        assert!(dir.lookups.borrow().is_empty());
    }

    #[test]
    fn unknown_roles_are_skipped() {
        let dir = FakeDirectory::default();
        let mut people = vec![person("x", "Observer")];
        let report = enrich(&mut people, &dir).unwrap();
        assert_eq!(report.enriched, 0);
        assert!(dir.lookups.borrow().is_empty());
    }

    #[test]
    fn require_managers_checks_recognized_roles_only() {
        let mut ana = person("ana", "Mentor");
        ana.attributes.manager = Some("boss".into());
        assert!(require_managers(&[ana.clone(), person("x", "Observer")]).is_ok());
        let err = require_managers(&[ana, person("bo", "Mentee")]).unwrap_err();
        assert!(err.to_string().contains("bo"));
    }

    // -----------------------------------------------------------------------
    // Graph client
    // -----------------------------------------------------------------------

    #[test]
    fn graph_reads_manager_and_title() {
        let mut server = mockito::Server::new();
        let manager = server
            .mock("GET", "/users/ana@example.com/manager")
            .match_header("authorization", "Bearer t0ken")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"userPrincipalName": "boss@example.com"}"#)
            .create();
        let title = server
            .mock("GET", "/users/ana@example.com")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jobTitle": "Principal Engineer"}"#)
            .create();

        let graph = GraphDirectory::new(server.url(), "t0ken", Duration::from_secs(5)).unwrap();
        assert_eq!(
            graph.manager_of("ana@example.com").unwrap().as_deref(),
            Some("boss@example.com")
        );
        assert_eq!(
            graph.title_of("ana@example.com").unwrap().as_deref(),
            Some("Principal Engineer")
        );
        manager.assert();
        title.assert();
    }

    #[test]
    fn graph_not_found_reads_as_absent() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/users/ceo@example.com/manager")
            .with_status(404)
            .with_body(r#"{"error": {"code": "Request_ResourceNotFound"}}"#)
            .create();
        let graph = GraphDirectory::new(server.url(), "t", Duration::from_secs(5)).unwrap();
        assert_eq!(graph.manager_of("ceo@example.com").unwrap(), None);
    }

    #[test]
    fn graph_expired_token_is_an_error() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/users/ana@example.com/manager")
            .with_status(401)
            .create();
        let graph = GraphDirectory::new(server.url(), "old", Duration::from_secs(5)).unwrap();
        let err = graph.manager_of("ana@example.com").unwrap_err();
        assert!(matches!(err, PairingError::Directory { .. }));
        assert!(err.to_string().contains("ana@example.com"));
    }
}
