// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use srcdsup_core::{Credentials, Endpoint};
use std::time::{Duration, SystemTime};

fn remote(name: &str) -> RemoteDestination {
    RemoteDestination {
        name: name.to_string(),
        endpoint: Endpoint::Ssh {
            host: "localhost".to_string(),
            port: 22,
            timeout: Duration::from_secs(1),
        },
        credentials: Credentials::Password {
            username: "u".to_string(),
            password: "p".to_string(),
        },
        root: "/r".to_string(),
    }
}

fn file(path: &str, size: u64) -> MatchedFile {
    MatchedFile {
        path: PathBuf::from(path),
        size,
        modified: SystemTime::UNIX_EPOCH,
        sidecar: None,
    }
}

#[tokio::test]
async fn fake_delivers_and_records() {
    let handler = FakeUploadHandler::new(BackendKind::Ssh);
    let rule = UploadRule::new("stv", "/demos", "*.dem");

    let results = handler
        .deliver(&rule, &remote("archive"), &[file("/demos/a.dem", 10)])
        .await
        .unwrap();

    assert_eq!(results, vec![FileResult::delivered("/demos/a.dem")]);
    assert_eq!(
        handler.calls(),
        vec![UploadCall {
            rule: "stv".to_string(),
            remote: "archive".to_string(),
            files: vec![PathBuf::from("/demos/a.dem")],
        }]
    );
}

#[tokio::test]
async fn fake_scripted_failures() {
    let handler = FakeUploadHandler::new(BackendKind::Http);
    handler.fail_remote("down");
    handler.fail_file(Path::new("/demos/bad.dem"));
    handler.defer_at_or_below(50);
    let rule = UploadRule::new("stv", "/demos", "*.dem");
    let files = [
        file("/demos/bad.dem", 100),
        file("/demos/good.dem", 100),
        file("/demos/tiny.dem", 50),
    ];

    assert!(handler.deliver(&rule, &remote("down"), &files).await.is_err());

    let results = handler.deliver(&rule, &remote("up"), &files).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(!results[0].outcome.is_delivered());
    assert!(results[1].outcome.is_delivered());
    assert_eq!(handler.calls().len(), 2);
}
