//! Runs the PuppetDB operations against a mock server.

use std::fs;
use std::path::{Path, PathBuf};

use httpmock::prelude::*;
use serde_json::json;

use puppetdb_cli::api::{Error, LiveClient, TlsFiles};
use puppetdb_cli::fs::LocalFs;
use puppetdb_cli::pdb::PuppetDb;
use puppetdb_cli::token::TokenFile;

const TOKEN: &str = "0VZZ8ar4ZwOYi9GDzS3FVWy9wQ8tAW9uD2nn1iT8";

struct Fixture {
    dir: tempfile::TempDir,
    pdb: PuppetDb<LiveClient, LocalFs, TokenFile>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let token = dir.path().join("token");
        fs::write(&token, format!("{}\n", TOKEN)).unwrap();
        let pdb = PuppetDb::new(
            LiveClient,
            LocalFs,
            TokenFile::new(Some(token)),
            TlsFiles::default(),
            true,
            false,
        );
        Fixture { dir, pdb }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

#[test]
fn status_sends_token_header() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/status/v1/services")
            .header("X-Authentication", TOKEN);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"puppetdb-status": {"state": "running"}}));
    });

    let fixture = Fixture::new();
    let status = fixture.pdb.status(&server.base_url()).unwrap();

    mock.assert();
    assert_eq!(status["puppetdb-status"]["state"], "running");
}

#[test]
fn status_all_reports_unreachable_servers() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/status/v1/services");
        then.status(200).json_body(json!({"state": "running"}));
    });

    let fixture = Fixture::new();
    let urls = vec![server.base_url(), "http://127.0.0.1:1".to_string()];
    let report = fixture.pdb.status_all(&urls).unwrap().into_json();

    mock.assert();
    assert_eq!(report[server.base_url()], json!({"state": "running"}));
    assert!(report["http://127.0.0.1:1"]["error"].is_string());
}

#[test]
fn query_sends_canonical_ast() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pdb/query/v4")
            .query_param("query", r#"["=","certname","foo.com"]"#)
            .header("X-Authentication", TOKEN);
        then.status(200).json_body(json!([{"certname": "foo.com"}]));
    });

    let fixture = Fixture::new();
    let res = fixture
        .pdb
        .query(&server.base_url(), r#"[ "=", "certname", "foo.com" ]"#)
        .unwrap();

    mock.assert();
    assert_eq!(res, json!([{"certname": "foo.com"}]));
}

#[test]
fn query_error_is_normalized() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pdb/query/v4");
        then.status(400).json_body(json!({
            "msg": "PQL parse error",
            "details": {"line": 1, "column": 7}
        }));
    });

    let fixture = Fixture::new();
    let err = fixture.pdb.query(&server.base_url(), "nodes {").unwrap_err();

    let Error::Remote(remote) = err else { panic!("expected remote error") };
    assert_eq!(remote.status(), 400);
    assert!(remote.to_string().starts_with("[GET /pdb/query/v4][400] getQuery default  &{"));
    assert!(remote.detailed().starts_with("[GET /pdb/query/v4][400] getQuery default  PQL parse error\n{"));
}

#[test]
fn export_writes_archive() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pdb/admin/v1/archive")
            .query_param("anonymization_profile", "moderate")
            .header("X-Authentication", TOKEN);
        then.status(200).body("archive content");
    });

    let fixture = Fixture::new();
    let path = fixture.path("export.tar.gz");
    fixture.pdb.export(&server.base_url(), &path, "moderate").unwrap();

    mock.assert();
    assert_eq!(fs::read_to_string(&path).unwrap(), "archive content");
}

#[test]
fn failed_export_leaves_no_file() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/pdb/admin/v1/archive");
        then.status(500).json_body(json!({"msg": "export failed"}));
    });

    let fixture = Fixture::new();
    let path = fixture.path("export.tar.gz");
    let err = fixture.pdb.export(&server.base_url(), &path, "none").unwrap_err();

    mock.assert();
    assert!(matches!(err, Error::Remote(_)));
    assert!(!path.exists());
}

#[test]
fn import_uploads_archive() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/pdb/admin/v1/archive")
            .header("X-Authentication", TOKEN);
        then.status(200).json_body(json!({"ok": true}));
    });

    let fixture = Fixture::new();
    let path = fixture.path("import.tar.gz");
    fs::write(&path, "archive content").unwrap();

    let res = fixture.pdb.import(&server.base_url(), &path).unwrap();

    mock.assert();
    assert!(res.ok);
    assert!(path.exists());
}

#[test]
fn import_of_missing_file_never_connects() {
    let fixture = Fixture::new();
    let err = fixture
        .pdb
        .import("http://127.0.0.1:1", Path::new("import.tar.gz"))
        .unwrap_err();

    assert!(err.is_filesystem_error());
    assert_eq!(err.to_string(), "open import.tar.gz: file does not exist");
}
