//! End-to-end migration runs against a mocked platform.
//!
//! These tests drive the full orchestration sequence (register → token →
//! export/import → revoke) and verify the per-item failure isolation and
//! key-remapping behaviour.

use std::io::Write;
use std::path::Path;

use apim_migrate::run::{RunMode, RunSummary, run};
use apim_migrate::{Config, MigrateError};
use wiremock::matchers::{any, basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a run configuration pointing at the mock server, with throttling
/// disabled so tests do not sleep.
fn test_config(hostname: &str, archive_dir: &Path, keymanagers: &[&str]) -> Config {
    let keymanagers = keymanagers
        .iter()
        .map(|km| format!("{km:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    let raw = format!(
        r#"
        username = "admin"
        password = "admin"
        scopes = "apim:app_import_export apim:admin"
        keymanagers = [{keymanagers}]

        [apim]
        hostname = "{hostname}"

        [dynamic_client_registration]
        callback_url = "http://localhost"
        client_name = "migration_client"
        owner = "admin"
        grant_types = "password refresh_token"
        saas_app = true

        [export]
        withKeys = true

        [import]
        preserveOwner = true
        skipSubscriptions = false
        skipApplicationKeys = false
        update = true

        [http]
        throttle_ms = 0
        archive_dir = "{}"
        "#,
        archive_dir.display()
    );
    Config::from_toml(&raw).unwrap()
}

/// Mount the credential lifecycle endpoints: registration, token, revoke.
async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/client-registration/v0.17/register"))
        .and(basic_auth("admin", "admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "clientId": "cid",
            "clientSecret": "csec",
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(basic_auth("cid", "csec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok",
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/revoke"))
        .and(basic_auth("cid", "csec"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

/// Write an application archive containing the `{name}/{name}.json` entry.
fn write_archive(dir: &Path, file_name: &str, name: &str, metadata: &str) {
    let file = std::fs::File::create(dir.join(file_name)).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file(format!("{name}/{name}.json"), options)
        .unwrap();
    zip.write_all(metadata.as_bytes()).unwrap();
    zip.finish().unwrap();
}

#[tokio::test]
async fn no_op_run_makes_no_network_calls() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), &[]);

    let summary = run(&config, RunMode::default()).await.unwrap();
    assert_eq!(summary, RunSummary::default());
}

#[tokio::test]
async fn registration_failure_aborts_before_token_issuance() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/client-registration/v0.17/register"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    // Nothing past registration may be called.
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/revoke"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), &[]);
    let mode = RunMode {
        export: true,
        import: false,
    };

    let err = run(&config, mode).await.unwrap_err();
    assert!(matches!(err, MigrateError::Registration { .. }));
}

#[tokio::test]
async fn export_isolates_per_application_failures() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/am/admin/v1/applications"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [
                { "name": "alpha", "owner": "admin" },
                { "name": "beta", "owner": "admin" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The first application's export fails; the second must still be attempted.
    Mock::given(method("GET"))
        .and(path("/api/am/admin/v1/export/applications"))
        .and(query_param("appName", "alpha"))
        .and(query_param("appOwner", "admin"))
        .and(query_param("withKeys", "true"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/am/admin/v1/export/applications"))
        .and(query_param("appName", "beta"))
        .and(query_param("appOwner", "admin"))
        .and(query_param("withKeys", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zip-payload".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path(), &[]);
    let mode = RunMode {
        export: true,
        import: false,
    };

    let summary = run(&config, mode).await.unwrap();
    assert_eq!(summary.exported, 1);
    assert_eq!(summary.export_failed, 1);

    // The archive landed under its canonical name and decodes back.
    let archived = dir.path().join("admin_beta.zip");
    assert_eq!(std::fs::read(&archived).unwrap(), b"zip-payload");
    assert_eq!(
        apim_migrate::archive::parse_archive_file_name("admin_beta.zip").unwrap(),
        ("admin".to_string(), "beta".to_string())
    );
}

#[tokio::test]
async fn import_maps_only_bindings_present_in_metadata() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let dir = tempfile::tempdir().unwrap();
    write_archive(
        dir.path(),
        "bar_foo.zip",
        "foo",
        r#"{"keyManagerWiseOAuthApp":{"PRODUCTION":{"km1":{"clientId":"abc","clientSecret":"eHl6"}}}}"#,
    );

    Mock::given(method("POST"))
        .and(path("/api/am/admin/v1/import/applications"))
        .and(query_param("appOwner", "bar"))
        .and(query_param("preserveOwner", "true"))
        .and(query_param("skipSubscriptions", "false"))
        .and(query_param("skipApplicationKeys", "false"))
        .and(query_param("update", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "applicationId": "123",
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Exactly one mapping call: km1/PRODUCTION with the decoded secret.
    // km2 and SANDBOX have no binding and must be skipped silently.
    Mock::given(method("POST"))
        .and(path("/api/am/store/v1/applications/123/map-keys"))
        .and(body_json(serde_json::json!({
            "consumerKey": "abc",
            "consumerSecret": "xyz",
            "keyManager": "km1",
            "keyType": "PRODUCTION",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), dir.path(), &["km1", "km2"]);
    let mode = RunMode {
        export: false,
        import: true,
    };

    let summary = run(&config, mode).await.unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.import_failed, 0);
    assert_eq!(summary.keys_mapped, 1);
    assert_eq!(summary.mappings_failed, 0);
}

#[tokio::test]
async fn import_isolates_per_archive_failures() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path(), "a_one.zip", "one", "{}");
    write_archive(dir.path(), "b_two.zip", "two", "{}");
    // Undecodable file name: counted as a failure, then skipped.
    std::fs::write(dir.path().join("garbage.zip"), b"not an archive").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/am/admin/v1/import/applications"))
        .and(query_param("appOwner", "a"))
        .respond_with(ResponseTemplate::new(500).set_body_string("conflict"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/am/admin/v1/import/applications"))
        .and(query_param("appOwner", "b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "applicationId": "456",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), dir.path(), &["km1"]);
    let mode = RunMode {
        export: false,
        import: true,
    };

    let summary = run(&config, mode).await.unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.import_failed, 2);
    assert_eq!(summary.keys_mapped, 0);
}

#[tokio::test]
async fn mapping_failure_does_not_stop_remaining_bindings() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let dir = tempfile::tempdir().unwrap();
    write_archive(
        dir.path(),
        "bar_foo.zip",
        "foo",
        r#"{"keyManagerWiseOAuthApp":{
            "PRODUCTION":{"km1":{"clientId":"p1","clientSecret":"eHl6"}},
            "SANDBOX":{"km1":{"clientId":"s1","clientSecret":"eHl6"}}
        }}"#,
    );

    Mock::given(method("POST"))
        .and(path("/api/am/admin/v1/import/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "applicationId": "789",
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The PRODUCTION mapping is rejected; the SANDBOX one must still run.
    Mock::given(method("POST"))
        .and(path("/api/am/store/v1/applications/789/map-keys"))
        .and(body_json(serde_json::json!({
            "consumerKey": "p1",
            "consumerSecret": "xyz",
            "keyManager": "km1",
            "keyType": "PRODUCTION",
        })))
        .respond_with(ResponseTemplate::new(500).set_body_string("key conflict"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/am/store/v1/applications/789/map-keys"))
        .and(body_json(serde_json::json!({
            "consumerKey": "s1",
            "consumerSecret": "xyz",
            "keyManager": "km1",
            "keyType": "SANDBOX",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), dir.path(), &["km1"]);
    let mode = RunMode {
        export: false,
        import: true,
    };

    let summary = run(&config, mode).await.unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.keys_mapped, 1);
    assert_eq!(summary.mappings_failed, 1);
}
