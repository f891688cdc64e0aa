// SPDX-License-Identifier: MPL-2.0

use std::fs;
use std::process::Command;

use serde_json::json;

fn feedtuner() -> Command {
    Command::new(env!("CARGO_BIN_EXE_feedtuner"))
}

#[test]
fn prints_help() {
    let output = feedtuner().arg("--help").output().expect("run feedtuner --help");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(stdout.contains("tune"));
    assert!(stdout.contains("resolve"));
}

#[test]
fn tunes_saved_pages() {
    let dir = tempfile::tempdir().unwrap();
    let post = json!({
        "$type": "app.bsky.feed.defs#postView",
        "uri": "at://did:plc:alice/app.bsky.feed.post/1",
        "cid": "bafyalice1",
        "author": { "did": "did:plc:alice", "handle": "alice.test" },
        "record": {
            "$type": "app.bsky.feed.post",
            "text": "hello from a saved page",
            "createdAt": "2024-05-01T12:00:00.000Z"
        },
        "indexedAt": "2024-05-01T12:00:00.000Z"
    });
    let page = json!({ "feed": [{ "post": post }], "cursor": "next" });
    let first = dir.path().join("page1.json");
    let second = dir.path().join("page2.json");
    fs::write(&first, page.to_string()).unwrap();
    fs::write(&second, page.to_string()).unwrap();

    let output = feedtuner()
        .arg("tune")
        .arg(&first)
        .arg(&second)
        .arg("--settings")
        .arg(dir.path().join("missing-settings.json"))
        .output()
        .expect("run feedtuner tune");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    // The second page repeats the first and is fully deduplicated
    assert_eq!(stdout.matches("@alice.test: hello from a saved page").count(), 1);
}

#[test]
fn rejects_unknown_feed() {
    let output = feedtuner()
        .args(["tune", "page.json", "--feed", "timeline"])
        .output()
        .expect("run feedtuner tune");
    assert!(!output.status.success());
}
