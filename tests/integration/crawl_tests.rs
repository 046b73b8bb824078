//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for job boards and run the full
//! listing → detail → persistence cycle end-to-end.

use jobharvest::config::{
    Config, CrawlerConfig, FetcherKind, OutputConfig, SourceEntry, UserAgentConfig,
};
use jobharvest::crawler::{run_sources, RunOutcome};
use jobharvest::normalize::SkillLevel;
use jobharvest::sites::SourceId;
use jobharvest::storage::{OperatingMode, RunStatus, SqliteStorage, Storage};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the given sources
fn create_test_config(sources: Vec<SourceEntry>, db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            request_budget: 50,
            pacing_min_ms: 0, // No pause for testing
            pacing_max_ms: 0,
            staleness_days: 30,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        summarizer: None,
        sources,
    }
}

fn source(id: SourceId, seed: String) -> SourceEntry {
    SourceEntry {
        id: id.as_str().to_string(),
        seeds: vec![seed],
        fetcher: Some(FetcherKind::Http),
        enabled: true,
    }
}

fn protocol_listing(slugs: &[&str]) -> String {
    let items: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<a data-test="list-item-offer" href="/offer/{slug}?s=list&searchId=9">
                     <h2 id="offer-title">Engineer {slug}</h2>
                   </a>"#
            )
        })
        .collect();
    format!(r#"<html><body><div data-test="offersList">{items}</div></body></html>"#)
}

fn protocol_detail(company: &str) -> String {
    format!(
        r#"<html><body>
          <h2 data-test="text-offerEmployer">{company}</h2>
          <div data-test="text-workplaceAddress">Kraków</div>
          <div data-test="section-workModes"><div class="r4179ok bldcnq5 ihmj1ec">remote work</div></div>
          <div data-test="section-positionLevels"><div class="r4179ok bldcnq5 ihmj1ec">senior</div></div>
          <p data-test="text-contractSalary">100 – 140 zł netto / godz.</p>
          <div id="TECHNOLOGY_AND_POSITION"><p>Backend services</p></div>
          <div data-test="section-technologies">
            <div class="c1fj2x2p">
              <h3>Technologies expected</h3>
              <div data-test="chip-technology"><span class="l1sjc53z">Rust</span></div>
            </div>
            <div class="c1fj2x2p">
              <h3>Optional technologies</h3>
              <div data-test="chip-technology"><span class="l1sjc53z">Kafka</span></div>
            </div>
          </div>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

async fn detail_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().starts_with("/offer/"))
        .count()
}

struct Harness {
    _dir: TempDir,
    config: Config,
    storage: Arc<Mutex<SqliteStorage>>,
}

impl Harness {
    fn new(sources: Vec<SourceEntry>) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("jobs.db");
        let storage = SqliteStorage::new(&db_path).unwrap();
        let config = create_test_config(sources, db_path.to_str().unwrap());

        Self {
            _dir: dir,
            config,
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    async fn run(&self, budget: Option<u32>) -> Vec<(SourceId, RunOutcome)> {
        run_sources(
            &self.config,
            "test-hash",
            Arc::clone(&self.storage),
            &[],
            budget,
            Arc::new(AtomicBool::new(false)),
        )
        .await
        .unwrap()
        .into_iter()
        .map(|(id, outcome)| (id, outcome.unwrap()))
        .collect()
    }
}

#[tokio::test]
async fn test_full_harvest_single_source() {
    let server = MockServer::start().await;
    mount_html(&server, "/jobs", protocol_listing(&["a", "b"])).await;
    mount_html(&server, "/offer/a", protocol_detail("Acme")).await;
    mount_html(&server, "/offer/b", protocol_detail("Beta")).await;

    let harness = Harness::new(vec![source(
        SourceId::TheProtocol,
        format!("{}/jobs", server.uri()),
    )]);
    let outcomes = harness.run(None).await;

    assert_eq!(outcomes.len(), 1);
    let (id, outcome) = &outcomes[0];
    assert_eq!(*id, SourceId::TheProtocol);
    assert_eq!(outcome.created, 2);
    assert_eq!(outcome.detail_fetches, 2);

    let storage = harness.storage.lock().unwrap();
    let url = format!("{}/offer/a", server.uri());
    let posting = storage
        .find_posting_by_url(&url)
        .unwrap()
        .expect("posting stored under the stripped URL");

    assert_eq!(posting.title, "Engineer a");
    assert_eq!(posting.company, "Acme");
    assert_eq!(posting.location, "Kraków");
    assert_eq!(posting.operating_mode, OperatingMode::Remote);
    assert_eq!(posting.experience_level, "Senior");
    assert_eq!(posting.salary, "16 800 - 23 520 PLN");
    assert_eq!(posting.skills.get("Rust"), Some(&SkillLevel::Senior));
    assert_eq!(posting.skills.get("Kafka"), Some(&SkillLevel::NiceToHave));
    assert_eq!(posting.source, "theprotocol");
    assert_eq!(posting.summary, "");

    let run = storage.get_latest_run("theprotocol").unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.created_count, 2);
    assert_eq!(run.config_hash, "test-hash");
}

#[tokio::test]
async fn test_second_run_fetches_no_details() {
    let server = MockServer::start().await;
    mount_html(&server, "/jobs", protocol_listing(&["a"])).await;
    mount_html(&server, "/offer/a", protocol_detail("Acme")).await;

    let harness = Harness::new(vec![source(
        SourceId::TheProtocol,
        format!("{}/jobs", server.uri()),
    )]);

    let first = harness.run(None).await;
    assert_eq!(first[0].1.created, 1);

    let second = harness.run(None).await;
    assert_eq!(second[0].1.created, 0);
    assert_eq!(second[0].1.skipped_known, 1);

    assert_eq!(detail_requests(&server).await, 1);
    assert_eq!(harness.storage.lock().unwrap().count_postings().unwrap(), 1);
}

#[tokio::test]
async fn test_budget_limits_detail_fetches() {
    let server = MockServer::start().await;
    mount_html(&server, "/jobs", protocol_listing(&["a", "b", "c", "d"])).await;
    for slug in ["a", "b", "c", "d"] {
        mount_html(&server, &format!("/offer/{}", slug), protocol_detail(slug)).await;
    }

    let harness = Harness::new(vec![source(
        SourceId::TheProtocol,
        format!("{}/jobs", server.uri()),
    )]);
    let outcomes = harness.run(Some(2)).await;

    assert_eq!(outcomes[0].1.detail_fetches, 2);
    assert_eq!(outcomes[0].1.skipped_budget, 2);
    assert_eq!(detail_requests(&server).await, 2);
    assert_eq!(harness.storage.lock().unwrap().count_ledger_entries().unwrap(), 2);
}

#[tokio::test]
async fn test_failed_detail_does_not_stop_run() {
    let server = MockServer::start().await;
    mount_html(&server, "/jobs", protocol_listing(&["broken", "ok"])).await;
    Mock::given(method("GET"))
        .and(path("/offer/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_html(&server, "/offer/ok", protocol_detail("Acme")).await;

    let harness = Harness::new(vec![source(
        SourceId::TheProtocol,
        format!("{}/jobs", server.uri()),
    )]);
    let outcomes = harness.run(None).await;

    assert_eq!(outcomes[0].1.failed, 1);
    assert_eq!(outcomes[0].1.created, 1);

    // The failed URL is in the ledger and is not retried on the next run
    let second = harness.run(None).await;
    assert_eq!(second[0].1.detail_fetches, 0);
}

#[tokio::test]
async fn test_broken_source_does_not_affect_others() {
    let server = MockServer::start().await;
    mount_html(&server, "/jobs", protocol_listing(&["a"])).await;
    mount_html(&server, "/offer/a", protocol_detail("Acme")).await;
    // NoFluffJobs listing without its container, as a client-rendered page
    mount_html(
        &server,
        "/nofluff",
        "<html><body><div id=\"root\"></div></body></html>".to_string(),
    )
    .await;

    let harness = Harness::new(vec![
        source(SourceId::NoFluffJobs, format!("{}/nofluff", server.uri())),
        source(SourceId::TheProtocol, format!("{}/jobs", server.uri())),
    ]);
    let outcomes = harness.run(None).await;

    let nofluff = &outcomes
        .iter()
        .find(|(id, _)| *id == SourceId::NoFluffJobs)
        .unwrap()
        .1;
    assert!(nofluff.is_aborted());
    assert_eq!(nofluff.created, 0);

    let protocol = &outcomes
        .iter()
        .find(|(id, _)| *id == SourceId::TheProtocol)
        .unwrap()
        .1;
    assert_eq!(protocol.created, 1);

    let storage = harness.storage.lock().unwrap();
    assert_eq!(
        storage.get_latest_run("nofluffjobs").unwrap().unwrap().status,
        RunStatus::Aborted
    );
}

#[tokio::test]
async fn test_all_seeds_failing_aborts_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let harness = Harness::new(vec![source(
        SourceId::TheProtocol,
        format!("{}/jobs", server.uri()),
    )]);
    let outcomes = harness.run(None).await;

    assert!(outcomes[0].1.is_aborted());
    assert_eq!(outcomes[0].1.listings_fetched, 0);
    assert_eq!(harness.storage.lock().unwrap().count_postings().unwrap(), 0);
}

#[tokio::test]
async fn test_unfinished_runs_marked_interrupted() {
    let server = MockServer::start().await;
    mount_html(&server, "/jobs", protocol_listing(&[])).await;

    let harness = Harness::new(vec![source(
        SourceId::TheProtocol,
        format!("{}/jobs", server.uri()),
    )]);
    let stale_run = harness
        .storage
        .lock()
        .unwrap()
        .create_run("theprotocol", "old-hash")
        .unwrap();

    let outcomes = harness.run(None).await;
    assert_eq!(outcomes[0].1.created, 0);
    assert!(!outcomes[0].1.is_aborted());

    let storage = harness.storage.lock().unwrap();
    assert_eq!(
        storage.get_run(stale_run).unwrap().status,
        RunStatus::Interrupted
    );
}
