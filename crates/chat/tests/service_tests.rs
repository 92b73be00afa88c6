use parley_auth::Authenticator;
use parley_chat::{
    ChatError, ConversationCreateForm, ConversationForm, ConversationService, MessageForm,
    MessageService, ParticipantsForm, PasswordChangeForm, ProfileForm, ProfileService,
    UserCreateForm, UserForm, UserService,
};
use parley_config::{AuthConfig, ChatConfig, DatabaseConfig};
use parley_database::{initialize_database, SqlitePool, User};
use tempfile::TempDir;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

struct TestContext {
    pool: SqlitePool,
    authenticator: Authenticator,
    users: UserService,
    profiles: ProfileService,
    conversations: ConversationService,
    messages: MessageService,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        Self::with_chat_config(ChatConfig {
            max_message_length: 100,
            default_page_size: 3,
            max_page_size: 5,
        })
        .await
    }

    async fn with_chat_config(chat: ChatConfig) -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("chat.sqlite");
        let pool = initialize_database(&DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 4,
        })
        .await?;

        let authenticator = Authenticator::new(pool.clone(), AuthConfig::default());

        Ok(Self {
            users: UserService::new(pool.clone(), authenticator.clone()),
            profiles: ProfileService::new(pool.clone()),
            conversations: ConversationService::new(pool.clone(), chat.clone()),
            messages: MessageService::new(pool.clone(), chat),
            authenticator,
            pool,
            _temp_dir: temp_dir,
        })
    }

    async fn register(&self, username: &str) -> TestResult<User> {
        let user = self
            .users
            .register(UserCreateForm {
                username: username.to_string(),
                email: Some(format!("{username}@example.com")),
                password: "password123".to_string(),
            })
            .await?;
        Ok(user)
    }

    async fn conversation_with(&self, creator: &User, others: &[&User]) -> TestResult<String> {
        let conversation = self
            .conversations
            .create(
                creator,
                ConversationCreateForm {
                    title: Some("Test".to_string()),
                    participants: others.iter().map(|u| u.public_id.clone()).collect(),
                },
            )
            .await?;
        Ok(conversation.public_id)
    }

    async fn say(&self, sender: &User, conversation: &str, text: &str) -> TestResult<String> {
        let message = self
            .messages
            .create(
                sender,
                conversation,
                MessageForm {
                    text: text.to_string(),
                },
            )
            .await?;
        Ok(message.public_id)
    }
}

fn field_errors(error: ChatError, field: &str) -> Vec<String> {
    match error {
        ChatError::Validation(errors) => errors.get(field).map(<[String]>::to_vec).unwrap_or_default(),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn register_validates_and_rejects_taken_username() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice").await?;

    let err = ctx
        .users
        .register(UserCreateForm {
            username: "alice".to_string(),
            email: None,
            password: "password123".to_string(),
        })
        .await
        .expect_err("duplicate username");
    assert_eq!(
        field_errors(err, "username"),
        vec!["A user with that username already exists.".to_string()]
    );

    let err = ctx
        .users
        .register(UserCreateForm {
            username: "bad name".to_string(),
            email: Some("x".to_string()),
            password: "1234".to_string(),
        })
        .await
        .expect_err("invalid form");
    let ChatError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert_eq!(errors.as_map().len(), 3);
    Ok(())
}

#[tokio::test]
async fn users_can_only_update_and_delete_themselves() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let bob = ctx.register("bob").await?;

    let err = ctx
        .users
        .update(
            &bob,
            &alice.public_id,
            UserForm {
                username: Some("mallory".to_string()),
                email: None,
            },
        )
        .await
        .expect_err("bob cannot rename alice");
    assert!(matches!(err, ChatError::AccessDenied { .. }));

    let renamed = ctx
        .users
        .update(
            &alice,
            &alice.public_id,
            UserForm {
                username: Some("alice2".to_string()),
                email: Some(String::new()),
            },
        )
        .await?;
    assert_eq!(renamed.username, "alice2");
    assert!(renamed.email.is_none());

    let err = ctx
        .users
        .update(
            &alice,
            &alice.public_id,
            UserForm {
                username: Some("bob".to_string()),
                email: None,
            },
        )
        .await
        .expect_err("username taken");
    assert!(!field_errors(err, "username").is_empty());

    assert!(matches!(
        ctx.users.delete(&bob, &alice.public_id).await,
        Err(ChatError::AccessDenied { .. })
    ));
    ctx.users.delete(&alice, &alice.public_id).await?;
    assert!(matches!(
        ctx.users.get(&alice.public_id).await,
        Err(ChatError::NotFound { entity: "user", .. })
    ));
    Ok(())
}

#[tokio::test]
async fn change_password_checks_current_password() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let session = ctx
        .authenticator
        .login_with_password("alice", "password123")
        .await?;

    let err = ctx
        .users
        .change_password(
            &alice,
            &alice.public_id,
            PasswordChangeForm {
                current_password: "wrong-one".to_string(),
                new_password: "new-password".to_string(),
            },
            Some(&session.token),
        )
        .await
        .expect_err("wrong current password");
    assert!(!field_errors(err, "current_password").is_empty());

    ctx.users
        .change_password(
            &alice,
            &alice.public_id,
            PasswordChangeForm {
                current_password: "password123".to_string(),
                new_password: "new-password".to_string(),
            },
            Some(&session.token),
        )
        .await?;

    ctx.authenticator
        .login_with_password("alice", "new-password")
        .await?;
    ctx.authenticator.authenticate_token(&session.token).await?;
    Ok(())
}

#[tokio::test]
async fn profile_lifecycle() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let bob = ctx.register("bob").await?;

    // Registration creates an empty profile
    let profile = ctx.profiles.get(&alice.public_id).await?;
    assert!(profile.display_name.is_none());

    let err = ctx
        .profiles
        .create(&alice, ProfileForm::default())
        .await
        .expect_err("profile already exists");
    assert!(matches!(err, ChatError::Conflict { .. }));

    let updated = ctx
        .profiles
        .update(
            &alice,
            &alice.public_id,
            ProfileForm {
                display_name: Some("Alice".to_string()),
                bio: Some("Curious".to_string()),
                avatar_url: Some("https://example.com/alice.png".to_string()),
            },
        )
        .await?;
    assert_eq!(updated.display_name.as_deref(), Some("Alice"));

    let err = ctx
        .profiles
        .update(
            &bob,
            &alice.public_id,
            ProfileForm {
                bio: Some("hacked".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect_err("bob cannot edit alice");
    assert!(matches!(err, ChatError::AccessDenied { .. }));

    ctx.profiles.delete(&alice, &alice.public_id).await?;
    assert!(matches!(
        ctx.profiles.get(&alice.public_id).await,
        Err(ChatError::NotFound { entity: "profile", .. })
    ));

    let recreated = ctx
        .profiles
        .create(
            &alice,
            ProfileForm {
                display_name: Some("Alice again".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(recreated.display_name.as_deref(), Some("Alice again"));
    Ok(())
}

#[tokio::test]
async fn create_conversation_always_includes_creator() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let bob = ctx.register("bob").await?;

    let conversation = ctx.conversation_with(&alice, &[&bob, &alice]).await?;

    let participants = ctx.conversations.participants(&bob, &conversation).await?;
    let mut names: Vec<_> = participants.iter().map(|p| p.username.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["alice", "bob"]);

    assert_eq!(ctx.conversations.list_for(&alice).await?.len(), 1);
    assert_eq!(ctx.conversations.list_for(&bob).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn create_conversation_rejects_unknown_participants() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;

    let err = ctx
        .conversations
        .create(
            &alice,
            ConversationCreateForm {
                title: None,
                participants: vec!["missing-user".to_string()],
            },
        )
        .await
        .expect_err("unknown participant");
    assert_eq!(
        field_errors(err, "participants"),
        vec!["Unknown user: missing-user".to_string()]
    );
    assert!(ctx.conversations.list_for(&alice).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn outsiders_cannot_see_conversations() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let bob = ctx.register("bob").await?;
    let eve = ctx.register("eve").await?;

    let conversation = ctx.conversation_with(&alice, &[&bob]).await?;

    assert!(matches!(
        ctx.conversations.get(&eve, &conversation).await,
        Err(ChatError::AccessDenied { .. })
    ));
    assert!(matches!(
        ctx.conversations.messages(&eve, &conversation, None, None).await,
        Err(ChatError::AccessDenied { .. })
    ));
    assert!(matches!(
        ctx.conversations.participants(&eve, &conversation).await,
        Err(ChatError::AccessDenied { .. })
    ));
    assert!(matches!(
        ctx.messages
            .create(&eve, &conversation, MessageForm { text: "hi".into() })
            .await,
        Err(ChatError::AccessDenied { .. })
    ));
    assert!(matches!(
        ctx.conversations.get(&eve, "no-such-conversation").await,
        Err(ChatError::NotFound { entity: "conversation", .. })
    ));
    Ok(())
}

#[tokio::test]
async fn add_and_remove_participants() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let bob = ctx.register("bob").await?;
    let carol = ctx.register("carol").await?;

    let conversation = ctx.conversation_with(&alice, &[]).await?;

    let participants = ctx
        .conversations
        .add_participants(
            &alice,
            &conversation,
            ParticipantsForm {
                participants: vec![bob.public_id.clone(), carol.public_id.clone()],
            },
        )
        .await?;
    assert_eq!(participants.len(), 3);

    // Bob is not the creator, so he can only remove himself
    let err = ctx
        .conversations
        .remove_participant(&bob, &conversation, &carol.public_id)
        .await
        .expect_err("bob cannot remove carol");
    assert!(matches!(err, ChatError::AccessDenied { .. }));

    ctx.conversations
        .remove_participant(&bob, &conversation, &bob.public_id)
        .await?;
    ctx.conversations
        .remove_participant(&alice, &conversation, &carol.public_id)
        .await?;

    let remaining = ctx.conversations.participants(&alice, &conversation).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_public_id, alice.public_id);

    // Bob left, so he lost access
    assert!(matches!(
        ctx.conversations.get(&bob, &conversation).await,
        Err(ChatError::AccessDenied { .. })
    ));

    let err = ctx
        .conversations
        .remove_participant(&alice, &conversation, &bob.public_id)
        .await
        .expect_err("bob already removed");
    assert!(matches!(err, ChatError::NotFound { entity: "participant", .. }));
    Ok(())
}

#[tokio::test]
async fn update_conversation_title_and_participants() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let bob = ctx.register("bob").await?;
    let carol = ctx.register("carol").await?;

    let conversation = ctx.conversation_with(&alice, &[&bob]).await?;

    let updated = ctx
        .conversations
        .update(
            &bob,
            &conversation,
            ConversationForm {
                title: Some("Renamed".to_string()),
                participants: Some(vec![alice.public_id.clone(), carol.public_id.clone()]),
            },
        )
        .await?;
    assert_eq!(updated.title.as_deref(), Some("Renamed"));

    let participants = ctx.conversations.participants(&carol, &conversation).await?;
    let mut names: Vec<_> = participants.iter().map(|p| p.username.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["alice", "carol"]);

    let err = ctx
        .conversations
        .update(&alice, &conversation, ConversationForm::default())
        .await
        .expect_err("empty update");
    assert!(matches!(err, ChatError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn messages_page_in_posting_order() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let bob = ctx.register("bob").await?;
    let conversation = ctx.conversation_with(&alice, &[&bob]).await?;

    for i in 0..7 {
        let sender = if i % 2 == 0 { &alice } else { &bob };
        ctx.say(sender, &conversation, &format!("message {i}")).await?;
    }

    let first = ctx
        .conversations
        .messages(&bob, &conversation, None, None)
        .await?;
    assert_eq!(first.total, 7);
    assert_eq!(first.limit, 3);
    let texts: Vec<_> = first.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["message 0", "message 1", "message 2"]);

    let capped = ctx
        .conversations
        .messages(&bob, &conversation, Some(100), Some(4))
        .await?;
    assert_eq!(capped.limit, 5);
    assert_eq!(capped.messages.len(), 3);
    assert_eq!(capped.messages[0].text, "message 4");

    let err = ctx
        .conversations
        .messages(&bob, &conversation, Some(0), Some(-1))
        .await
        .expect_err("bad paging");
    let ChatError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert!(errors.get("limit").is_some());
    assert!(errors.get("offset").is_some());
    Ok(())
}

#[tokio::test]
async fn outsider_paging_with_bad_bounds_is_denied_first() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let bob = ctx.register("bob").await?;
    let eve = ctx.register("eve").await?;
    let conversation = ctx.conversation_with(&alice, &[&bob]).await?;

    let err = ctx
        .conversations
        .messages(&eve, &conversation, Some(0), Some(-1))
        .await
        .expect_err("outsider");
    assert!(matches!(err, ChatError::AccessDenied { .. }), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn message_rules() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let bob = ctx.register("bob").await?;
    let eve = ctx.register("eve").await?;
    let conversation = ctx.conversation_with(&alice, &[&bob]).await?;

    let err = ctx
        .messages
        .create(&alice, &conversation, MessageForm { text: "   ".into() })
        .await
        .expect_err("blank message");
    assert!(!field_errors(err, "text").is_empty());

    let err = ctx
        .messages
        .create(
            &alice,
            &conversation,
            MessageForm {
                text: "x".repeat(101),
            },
        )
        .await
        .expect_err("too long");
    assert!(!field_errors(err, "text").is_empty());

    let message_id = ctx.say(&alice, &conversation, "  hello bob  ").await?;

    let seen = ctx.messages.get(&bob, &message_id).await?;
    assert_eq!(seen.text, "hello bob");
    assert_eq!(seen.sender_username, "alice");
    assert_eq!(seen.conversation_public_id, conversation);

    assert!(matches!(
        ctx.messages.get(&eve, &message_id).await,
        Err(ChatError::AccessDenied { .. })
    ));
    assert!(matches!(
        ctx.messages.delete(&bob, &message_id).await,
        Err(ChatError::AccessDenied { .. })
    ));

    ctx.messages.delete(&alice, &message_id).await?;
    assert!(matches!(
        ctx.messages.get(&alice, &message_id).await,
        Err(ChatError::NotFound { entity: "message", .. })
    ));
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_removes_their_messages() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice").await?;
    let bob = ctx.register("bob").await?;
    let conversation = ctx.conversation_with(&alice, &[&bob]).await?;

    ctx.say(&alice, &conversation, "from alice").await?;
    ctx.say(&bob, &conversation, "from bob").await?;

    ctx.users.delete(&bob, &bob.public_id).await?;

    let page = ctx
        .conversations
        .messages(&alice, &conversation, None, None)
        .await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.messages[0].text, "from alice");

    let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE user_id = ?")
        .bind(bob.id)
        .fetch_one(&ctx.pool)
        .await?;
    assert_eq!(profiles, 0);
    Ok(())
}
