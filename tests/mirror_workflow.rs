//! End-to-end tests for the mirror workflow.
//!
//! Documentation pages and artifacts are served by a mock server whose host
//! stands in for the download host. Syncing goes through a scripted double.

mod support;

use tempfile::TempDir;
use toolchain_mirror::{
    Database, DatabaseOptions, DownloadError, HttpClient, Layout, MirrorContext, MirrorError,
    NewToolchainRecord, PageScraper, Platform, PlatformTarget, ProvenanceStore, RecordFilter,
    RemoteDestination, RunOutcome, ScrapeRules, ToolchainRecord, mirror,
};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::socket_guard::start_mock_server_or_skip;
use support::sync_double::ScriptedSync;

const REMOTE: &str = "remote:Toolchains";

struct Harness {
    server: MockServer,
    _temp_dir: TempDir,
    layout: Layout,
    store: ProvenanceStore,
    client: HttpClient,
    scraper: PageScraper,
    remote: RemoteDestination,
}

impl Harness {
    async fn start() -> Option<Self> {
        let server = start_mock_server_or_skip().await?;
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let layout = Layout::new(temp_dir.path());
        layout.ensure().expect("layout should be created");

        let db = Database::new(&layout.database_path(), &DatabaseOptions::default())
            .await
            .expect("database should open");
        let client = HttpClient::new().expect("client should build");
        let rules = ScrapeRules {
            download_host: "127.0.0.1".to_string(),
            ..ScrapeRules::default()
        };

        Some(Self {
            server,
            _temp_dir: temp_dir,
            layout,
            store: ProvenanceStore::new(db),
            scraper: PageScraper::new(client.clone(), rules),
            client,
            remote: RemoteDestination::new(REMOTE),
        })
    }

    fn targets(&self, platforms: &[Platform]) -> Vec<PlatformTarget> {
        platforms
            .iter()
            .map(|&platform| PlatformTarget {
                platform,
                page_url: Url::parse(&format!("{}/{platform}-setup.html", self.server.uri()))
                    .expect("page url"),
            })
            .collect()
    }

    async fn run(
        &self,
        sync: &ScriptedSync,
        platforms: &[Platform],
    ) -> Result<RunOutcome, MirrorError> {
        let ctx = MirrorContext {
            layout: &self.layout,
            store: &self.store,
            scraper: &self.scraper,
            client: &self.client,
            sync,
            remote: &self.remote,
        };
        mirror::run(&ctx, &self.targets(platforms)).await
    }

    /// Serves a setup page whose toolchain section links `files` on the
    /// mock host. A decoy section links another file that must be ignored.
    async fn mount_page(&self, platform: Platform, files: &[&str]) {
        let uri = self.server.uri();
        let items: String = files
            .iter()
            .map(|file| {
                format!(
                    "<li><a class=\"reference external\" href=\"{uri}/dl/{file}\">{file}</a></li>\n"
                )
            })
            .collect();
        let html = format!(
            "<html><body>\n\
             <section id=\"toolchain-setup\"><h2>Get the toolchain</h2><ul>\n{items}</ul></section>\n\
             <section id=\"next-steps\"><a href=\"{uri}/dl/decoy.zip\">decoy</a></section>\n\
             </body></html>"
        );

        Mock::given(method("GET"))
            .and(path(format!("/{platform}-setup.html")))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&self.server)
            .await;
    }

    async fn expect_page_not_fetched(&self, platform: Platform) {
        Mock::given(method("GET"))
            .and(path(format!("/{platform}-setup.html")))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    async fn mount_artifact(&self, file: &str, body: &[u8], expected_fetches: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/dl/{file}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .expect(expected_fetches)
            .mount(&self.server)
            .await;
    }

    async fn rows(&self) -> Vec<ToolchainRecord> {
        self.store
            .list(RecordFilter::default())
            .await
            .expect("list should succeed")
    }
}

#[tokio::test]
async fn test_two_new_links_are_downloaded_recorded_and_uploaded() {
    let Some(h) = Harness::start().await else {
        return;
    };
    h.mount_page(Platform::Linux, &["a.zip", "b.zip"]).await;
    h.mount_artifact("a.zip", b"archive a", 1).await;
    h.mount_artifact("b.zip", b"archive b", 1).await;
    h.mount_artifact("decoy.zip", b"decoy", 0).await;
    let sync = ScriptedSync::succeeding();

    let outcome = h.run(&sync, &[Platform::Linux]).await.expect("run should succeed");

    assert_eq!(outcome.exit_code(), 0);
    let RunOutcome::Completed(stats) = outcome else {
        panic!("expected completed run, got {outcome:?}");
    };
    assert_eq!(stats.downloaded, 2);
    assert_eq!(stats.uploaded, 2);

    let rows = h.rows().await;
    assert_eq!(
        rows.iter().map(|r| r.filename.as_str()).collect::<Vec<_>>(),
        ["a.zip", "b.zip"]
    );
    assert!(rows.iter().all(|r| r.uploaded));
    assert!(rows.iter().all(|r| r.platform() == Some(Platform::Linux)));
    assert_eq!(rows[0].url, format!("{}/dl/a.zip", h.server.uri()));

    let a_path = h.layout.artifact_path(Platform::Linux, "a.zip");
    assert_eq!(rows[0].path, a_path.to_string_lossy());
    assert_eq!(std::fs::read(&a_path).expect("a.zip on disk"), b"archive a");

    let calls = sync.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], (a_path, format!("{REMOTE}/linux")));
}

#[tokio::test]
async fn test_platform_without_links_aborts_before_later_platforms() {
    let Some(h) = Harness::start().await else {
        return;
    };
    h.mount_page(Platform::Linux, &["a.zip"]).await;
    h.mount_artifact("a.zip", b"archive a", 1).await;
    h.mount_page(Platform::Macos, &[]).await;
    h.expect_page_not_fetched(Platform::Windows).await;
    let sync = ScriptedSync::succeeding();

    let outcome = h
        .run(&sync, &Platform::ALL)
        .await
        .expect("run should not error");

    assert_eq!(outcome.exit_code(), 1);
    let RunOutcome::Aborted { platform, stats } = outcome else {
        panic!("expected aborted run, got {outcome:?}");
    };
    assert_eq!(platform, Platform::Macos);
    assert_eq!(stats.downloaded, 1);

    // Work done for earlier platforms stays.
    let rows = h.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].platform(), Some(Platform::Linux));
    assert!(!h.layout.platform_dir(Platform::Macos).exists());
    assert!(!h.layout.platform_dir(Platform::Windows).exists());
}

#[tokio::test]
async fn test_links_to_other_hosts_count_as_no_links() {
    let Some(h) = Harness::start().await else {
        return;
    };
    let html = "<section id=\"toolchain-setup\">\
                <a href=\"https://mirror.example.org/dl/a.zip\">a.zip</a>\
                </section>";
    Mock::given(method("GET"))
        .and(path("/linux-setup.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&h.server)
        .await;
    let sync = ScriptedSync::succeeding();

    let outcome = h.run(&sync, &[Platform::Linux]).await.expect("run should not error");

    assert!(matches!(
        outcome,
        RunOutcome::Aborted {
            platform: Platform::Linux,
            ..
        }
    ));
    assert!(sync.calls().is_empty());
}

#[tokio::test]
async fn test_recorded_file_is_not_downloaded_again() {
    let Some(h) = Harness::start().await else {
        return;
    };
    h.mount_page(Platform::Linux, &["a.zip"]).await;
    h.mount_artifact("a.zip", b"archive a", 0).await;
    let path = h.layout.artifact_path(Platform::Linux, "a.zip");
    h.store
        .insert(&NewToolchainRecord {
            url: "https://dl.espressif.com/dl/a.zip",
            path: &path.to_string_lossy(),
            filename: "a.zip",
            platform: Platform::Linux,
        })
        .await
        .expect("seed row");
    let sync = ScriptedSync::succeeding();

    let outcome = h.run(&sync, &[Platform::Linux]).await.expect("run should succeed");

    let RunOutcome::Completed(stats) = outcome else {
        panic!("expected completed run, got {outcome:?}");
    };
    assert_eq!(stats.skipped_recorded, 1);
    assert_eq!(stats.downloaded, 0);
    assert!(!path.exists(), "a deleted file must not be fetched again");
    assert!(sync.calls().is_empty());
    assert_eq!(h.rows().await.len(), 1);
}

#[tokio::test]
async fn test_file_on_disk_without_record_is_skipped() {
    let Some(h) = Harness::start().await else {
        return;
    };
    h.mount_page(Platform::Linux, &["a.zip"]).await;
    h.mount_artifact("a.zip", b"archive a", 0).await;
    let path = h
        .layout
        .ensure_platform_dir(Platform::Linux)
        .expect("platform dir")
        .join("a.zip");
    std::fs::write(&path, b"placed by hand").expect("seed file");
    let sync = ScriptedSync::succeeding();

    let outcome = h.run(&sync, &[Platform::Linux]).await.expect("run should succeed");

    let RunOutcome::Completed(stats) = outcome else {
        panic!("expected completed run, got {outcome:?}");
    };
    assert_eq!(stats.skipped_on_disk, 1);
    assert!(h.rows().await.is_empty());
    assert!(sync.calls().is_empty());
    assert_eq!(std::fs::read(&path).expect("file kept"), b"placed by hand");
}

#[tokio::test]
async fn test_failed_sync_leaves_row_pending_and_is_not_retried() {
    let Some(h) = Harness::start().await else {
        return;
    };
    h.mount_page(Platform::Linux, &["a.zip"]).await;
    h.mount_artifact("a.zip", b"archive a", 1).await;

    let failing = ScriptedSync::failing();
    let outcome = h.run(&failing, &[Platform::Linux]).await.expect("first run");
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(failing.calls().len(), 1);

    let rows = h.rows().await;
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].uploaded);

    let succeeding = ScriptedSync::succeeding();
    let outcome = h.run(&succeeding, &[Platform::Linux]).await.expect("second run");
    let RunOutcome::Completed(stats) = outcome else {
        panic!("expected completed run, got {outcome:?}");
    };
    assert_eq!(stats.skipped_on_disk, 1);
    assert!(succeeding.calls().is_empty());
    assert!(!h.rows().await[0].uploaded);
}

#[tokio::test]
async fn test_artifact_http_error_stops_the_run_without_a_row() {
    let Some(h) = Harness::start().await else {
        return;
    };
    h.mount_page(Platform::Linux, &["missing.zip", "b.zip"]).await;
    Mock::given(method("GET"))
        .and(path("/dl/missing.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&h.server)
        .await;
    h.mount_artifact("b.zip", b"archive b", 0).await;
    let sync = ScriptedSync::succeeding();

    let err = h
        .run(&sync, &[Platform::Linux])
        .await
        .expect_err("404 should end the run");

    assert!(
        matches!(
            err,
            MirrorError::Download(DownloadError::HttpStatus { status: 404, .. })
        ),
        "got {err:?}"
    );
    assert!(h.rows().await.is_empty());
    assert!(!h.layout.artifact_path(Platform::Linux, "missing.zip").exists());
}

#[tokio::test]
async fn test_page_server_error_is_a_scrape_error() {
    let Some(h) = Harness::start().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/linux-setup.html"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&h.server)
        .await;
    let sync = ScriptedSync::succeeding();

    let err = h
        .run(&sync, &[Platform::Linux])
        .await
        .expect_err("503 should end the run");

    let MirrorError::Scrape(scrape) = err else {
        panic!("expected scrape error, got {err:?}");
    };
    assert!(scrape.page.ends_with("/linux-setup.html"));
    assert!(matches!(
        scrape.source,
        DownloadError::HttpStatus { status: 503, .. }
    ));
}
