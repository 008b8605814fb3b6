//! End-to-end single-node run against a local mock listing page.

use arachne::demo::demo_workflow;
use arachne::runtime::{run_single_node, SingleNodeOptions};
use arachne_protocol::BusConfig;
use httpmock::prelude::*;
use std::fs;
use std::time::Duration;

const STORY_COUNT: usize = 25;

fn listing_page() -> String {
    let mut rows = String::new();
    for i in 0..STORY_COUNT {
        rows.push_str(&format!(
            "<tr><td><a class='storylink' href='https://example.com/story/{i}'>Story number {i}</a></td></tr>\n"
        ));
    }
    format!("<html><body><table>\n{rows}</table></body></html>")
}

fn fast_bus() -> BusConfig {
    BusConfig {
        poll_interval: Duration::from_millis(10),
        idle_grace: Duration::from_millis(500),
        channel_capacity: 64,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_singlenode_exports_all_stories() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200)
            .header("content-type", "text/html")
            .body(listing_page());
    });

    let output_dir = tempfile::tempdir().unwrap();
    let options = SingleNodeOptions {
        workers: 2,
        output_dir: output_dir.path().to_path_buf(),
        bus: fast_bus(),
    };

    let summary = run_single_node(demo_workflow(&server.url("/")), options)
        .await
        .unwrap();
    mock.assert();

    // CSV: header plus one row per story, both cells non-empty.
    let csv = fs::read_to_string(&summary.items_csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "title,link");
    assert!(
        lines.len() >= 21,
        "expected at least 20 item rows, got {}",
        lines.len() - 1
    );
    for line in &lines[1..] {
        let mut cells = line.splitn(2, ',');
        let title = cells.next().unwrap_or_default();
        let link = cells.next().unwrap_or_default();
        assert!(!title.is_empty(), "empty title in row {line:?}");
        assert!(link.starts_with("https://example.com/story/"), "bad link in {line:?}");
    }

    // JSONL sink wrote the same number of objects.
    let jsonl_path = output_dir
        .path()
        .join(format!("{}.jsonl", summary.job_uuid));
    let jsonl = fs::read_to_string(jsonl_path).unwrap();
    assert_eq!(jsonl.lines().count(), lines.len() - 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_workflow_fails_before_any_work() {
    let output_dir = tempfile::tempdir().unwrap();
    let mut workflow = demo_workflow("http://127.0.0.1:1/");
    for template in &mut workflow.task_templates {
        template.initial = false;
    }

    let options = SingleNodeOptions {
        workers: 1,
        output_dir: output_dir.path().to_path_buf(),
        bus: fast_bus(),
    };
    assert!(run_single_node(workflow, options).await.is_err());
    assert_eq!(fs::read_dir(output_dir.path()).unwrap().count(), 0);
}
