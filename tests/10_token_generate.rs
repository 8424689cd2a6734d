mod common;

use anyhow::Result;

use collab_admin::cli::commands::token::{generate_token_for_user, TokenCommandError};
use collab_admin::services::{PERMISSION_DENIED_MESSAGE, TOKENS_DISABLED_MESSAGE};

#[tokio::test]
async fn admin_issues_exactly_one_token_for_an_existing_user() -> Result<()> {
    let env = common::TestEnv::start().await?;

    for (label, client) in env.admin_clients()? {
        let before = env.token_count(&env.basic).await?;
        let token = generate_token_for_user(client.as_ref(), &env.basic.email, "ci pipeline").await?;

        assert_eq!(token.user_id, env.basic.id, "{label}");
        assert_eq!(token.description, "ci pipeline", "{label}");
        assert!(token.token.is_some(), "{label}: new tokens carry their secret");
        assert_eq!(env.token_count(&env.basic).await?, before + 1, "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn unknown_users_are_reported_and_nothing_is_created() -> Result<()> {
    let env = common::TestEnv::start().await?;

    for (label, client) in env.admin_clients()? {
        let err = generate_token_for_user(client.as_ref(), "nouser@example.com", "")
            .await
            .unwrap_err();

        assert!(matches!(err, TokenCommandError::UserNotFound { .. }), "{label}: {err:?}");
        assert_eq!(
            err.to_string(),
            r#"could not retrieve user information of "nouser@example.com""#
        );
    }

    for user in [&env.admin, &env.basic, &env.holder] {
        assert_eq!(env.token_count(user).await?, 0);
    }
    Ok(())
}

#[tokio::test]
async fn unknown_users_are_quoted_exactly_as_given() -> Result<()> {
    let env = common::TestEnv::start().await?;

    for (label, client) in env.admin_clients()? {
        let err = generate_token_for_user(client.as_ref(), " nouser@example.com ", "")
            .await
            .unwrap_err();

        assert!(matches!(err, TokenCommandError::UserNotFound { .. }), "{label}: {err:?}");
        assert_eq!(
            err.to_string(),
            r#"could not retrieve user information of " nouser@example.com ""#,
            "{label}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn ordinary_callers_cannot_issue_for_someone_else() -> Result<()> {
    let env = common::TestEnv::start().await?;

    for (label, client) in env.clients_as(&env.holder)? {
        let err = generate_token_for_user(client.as_ref(), &env.basic.email, "sneaky")
            .await
            .unwrap_err();

        assert!(matches!(err, TokenCommandError::PermissionDenied { .. }), "{label}: {err:?}");
        assert_eq!(
            err.to_string(),
            format!(
                "could not create token for {:?}: {}",
                env.basic.email, PERMISSION_DENIED_MESSAGE
            )
        );
    }

    assert_eq!(env.token_count(&env.basic).await?, 0);
    Ok(())
}

#[tokio::test]
async fn callers_without_the_token_role_cannot_issue_for_themselves() -> Result<()> {
    let env = common::TestEnv::start().await?;

    for (label, client) in env.clients_as(&env.basic)? {
        let err = generate_token_for_user(client.as_ref(), &env.basic.email, "mine")
            .await
            .unwrap_err();
        assert!(matches!(err, TokenCommandError::PermissionDenied { .. }), "{label}: {err:?}");
    }

    assert_eq!(env.token_count(&env.basic).await?, 0);
    Ok(())
}

#[tokio::test]
async fn token_role_holders_issue_for_themselves() -> Result<()> {
    let env = common::TestEnv::start().await?;

    for (label, client) in env.clients_as(&env.holder)? {
        let token = generate_token_for_user(client.as_ref(), "holder", "laptop").await?;
        assert_eq!(token.user_id, env.holder.id, "{label}");
    }

    assert_eq!(env.token_count(&env.holder).await?, 2);
    Ok(())
}

#[tokio::test]
async fn disabled_feature_blocks_issuance_for_everyone() -> Result<()> {
    let env = common::TestEnv::start_with(false).await?;

    for (label, client) in env.admin_clients()? {
        let err = generate_token_for_user(client.as_ref(), &env.basic.email, "ci")
            .await
            .unwrap_err();

        assert!(matches!(err, TokenCommandError::FeatureDisabled { .. }), "{label}: {err:?}");
        assert_eq!(
            err.to_string(),
            format!(
                "could not create token for {:?}: {}",
                env.basic.email, TOKENS_DISABLED_MESSAGE
            )
        );
    }

    assert_eq!(env.token_count(&env.basic).await?, 0);
    Ok(())
}

#[tokio::test]
async fn identifiers_fall_back_to_usernames() -> Result<()> {
    let env = common::TestEnv::start().await?;

    for (label, client) in env.admin_clients()? {
        let by_username = generate_token_for_user(client.as_ref(), "basic", "").await?;
        assert_eq!(by_username.user_id, env.basic.id, "{label}");

        let by_email = generate_token_for_user(client.as_ref(), "BASIC@example.com", "").await?;
        assert_eq!(by_email.user_id, env.basic.id, "{label}");
    }
    Ok(())
}

#[tokio::test]
async fn blank_identifiers_are_invalid_arguments() -> Result<()> {
    let env = common::TestEnv::start().await?;

    for (label, client) in env.admin_clients()? {
        let err = generate_token_for_user(client.as_ref(), "   ", "x").await.unwrap_err();
        assert!(matches!(err, TokenCommandError::InvalidArgument(_)), "{label}: {err:?}");
    }
    Ok(())
}
