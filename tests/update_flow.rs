//! End-to-end update flow against a mock update server
//!
//! Drives the public API only: build a client from configuration, check for
//! an update, then download and verify the image it points at.

mod common;

use common::*;
use sha2::{Digest, Sha256};
use update_transport::{
    CheckOutcome, Error, IsRetryable, TrustConfig, UpdaterBuilder, UpdaterConfig, new_updater,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn check_then_download_verified_image() {
    let mock_server = MockServer::start().await;
    let image = image_bytes(64 * 1024);
    let checksum = format!("{:x}", Sha256::digest(&image));
    let descriptor = format!(
        r#"{{"ID":"deploy-17","Image":{{"URI":"{}/images/rootfs-17.img","Checksum":"{}","ID":"rootfs-17"}}}}"#,
        mock_server.uri(),
        checksum
    );

    Mock::given(method("GET"))
        .and(path("/api/device/update"))
        .respond_with(ResponseTemplate::new(200).set_body_string(descriptor))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/rootfs-17.img"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let updater = new_updater(&UpdaterConfig::default()).await.unwrap();
    assert!(!updater.is_secure());

    let url = format!("{}/api/device/update", mock_server.uri());
    let update = match updater.check_for_update(&url).await.unwrap() {
        CheckOutcome::UpdateAvailable(update) => update,
        CheckOutcome::NoUpdate => panic!("expected an update to be scheduled"),
    };
    assert_eq!(update.id, "deploy-17");
    assert_eq!(update.image.id, "rootfs-17");

    let stream = updater.fetch_update(&update.image.uri).await.unwrap();
    assert_eq!(stream.length(), image.len() as u64);

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("rootfs.img");
    let mut file = tokio::fs::File::create(&target).await.unwrap();
    let written = stream
        .copy_verified(&mut file, &update.image.checksum)
        .await
        .unwrap();
    drop(file);

    assert_eq!(written, image.len() as u64);
    assert_eq!(std::fs::read(&target).unwrap(), image);
}

#[tokio::test]
async fn status_contract_maps_to_outcomes() {
    let mock_server = MockServer::start().await;
    let routes = [
        ("/have", ResponseTemplate::new(200).set_body_string(UPDATE_RESPONSE)),
        ("/incomplete", ResponseTemplate::new(200).set_body_string(INCOMPLETE_UPDATE_RESPONSE)),
        ("/garbage", ResponseTemplate::new(200).set_body_string("not json")),
        ("/none", ResponseTemplate::new(204)),
        ("/denied", ResponseTemplate::new(404)),
        ("/broken", ResponseTemplate::new(500)),
    ];
    for (route, template) in routes {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(&mock_server)
            .await;
    }

    let updater = new_updater(&UpdaterConfig::default()).await.unwrap();
    let check = |route: &str| {
        let url = format!("{}{}", mock_server.uri(), route);
        let updater = &updater;
        async move { updater.check_for_update(&url).await }
    };

    assert!(matches!(
        check("/have").await,
        Ok(CheckOutcome::UpdateAvailable(_))
    ));
    assert!(matches!(
        check("/incomplete").await,
        Err(Error::IncompleteResponse { .. })
    ));
    assert!(matches!(
        check("/garbage").await,
        Err(Error::MalformedResponse(_))
    ));
    assert!(matches!(check("/none").await, Ok(CheckOutcome::NoUpdate)));
    assert!(matches!(check("/denied").await, Err(Error::Unauthorized)));

    let err = check("/broken").await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedStatus(500)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn size_guard_rejects_small_images() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/tiny.img"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes(100)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/ok.img"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes(5000)))
        .mount(&mock_server)
        .await;

    let updater = new_updater(&UpdaterConfig::default()).await.unwrap();

    let tiny = updater
        .fetch_update(&format!("{}/images/tiny.img", mock_server.uri()))
        .await;
    assert!(matches!(
        tiny,
        Err(Error::ImplausiblySmall {
            length: 100,
            minimum: 4096
        })
    ));

    let ok = updater
        .fetch_update(&format!("{}/images/ok.img", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(ok.length(), 5000);
}

#[tokio::test]
async fn mutual_tls_client_builds_from_pem_files() {
    let updater = UpdaterBuilder::new(mutual_tls_config())
        .build()
        .await
        .unwrap();
    assert!(updater.is_secure());
}

#[tokio::test]
async fn bad_server_certificate_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("server.crt");
    std::fs::write(&bogus, "-----BEGIN NOTHING-----\n").unwrap();

    let config = UpdaterConfig {
        trust: TrustConfig::new(pem("client.pem"), pem("client.key"), &bogus),
        ..Default::default()
    };

    let err = match new_updater(&config).await {
        Ok(_) => panic!("a client must not be produced from a bad trust pool"),
        Err(err) => err,
    };
    assert!(matches!(err, Error::TrustPool { .. }));
    assert!(err.is_configuration());
    assert!(!err.is_retryable());
}
