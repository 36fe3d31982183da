#![allow(missing_docs)]

use rstest::rstest;

use conjur_core::{ErrorKind, ResourceClient};

mod common;
pub use self::common::*;

#[rstest]
#[tokio::test]
async fn should_write_then_read_secret(#[future] server: TestServer) -> anyhow::Result<()> {
    let server = server.await;
    let token = server.state.issue_token("host/app");
    let secrets = ResourceClient::with_token(server.endpoints(), token)?;

    secrets.add_secret("dev/db/password", "s3cr3t with spaces").await?;

    // The encoded write and the raw read reach the same variable
    assert_eq!(
        server.state.secret("dev/db/password").as_deref(),
        Some("s3cr3t with spaces")
    );
    assert_eq!(
        secrets.retrieve_secret("dev/db/password").await?,
        "s3cr3t with spaces"
    );

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_report_missing_secret(#[future] server: TestServer) -> anyhow::Result<()> {
    let server = server.await;
    let token = server.state.issue_token("host/app");
    let secrets = ResourceClient::with_token(server.endpoints(), token)?;

    let error = secrets
        .retrieve_secret("prod/unknown")
        .await
        .expect_err("no such secret");

    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert_eq!(error.status(), Some(404));

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_report_forbidden_write(#[future] server: TestServer) -> anyhow::Result<()> {
    let server = server.await;
    server.state.hide("prod/locked");
    let token = server.state.issue_token("host/app");
    let secrets = ResourceClient::with_token(server.endpoints(), token)?;

    let error = secrets
        .add_secret("prod/locked", "value")
        .await
        .expect_err("forbidden");

    assert_eq!(error.kind(), ErrorKind::Forbidden);
    assert!(server.state.secret("prod/locked").is_none());

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_refresh_secrets_token_with_credentials(
    #[future] server: TestServer,
) -> anyhow::Result<()> {
    let server = server.await;
    let secrets = ResourceClient::with_credentials(
        server.endpoints(),
        conjur_core::Credentials::api_key("host/app", "3ahcddy39"),
        authn(&server),
    )?;

    secrets.add_secret("app/key", "v1").await?;
    server.state.revoke_tokens();
    assert_eq!(secrets.retrieve_secret("app/key").await?, "v1");

    assert_eq!(server.state.logins(), 2);

    Ok(())
}
