// UI layer: one handler per CLI command plus the formatting helpers for
// the listing output. The handlers are small and synchronous; they print
// directly and bubble failures up to `main`.

use crate::api::{Activity, ApiClient, Topic, TOPICS_PER_PAGE};
use crate::session::SessionStore;
use anyhow::{Context, Result};
use chrono::FixedOffset;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};

// Listings show timestamps in JST (UTC+9), the service's home timezone.
const DISPLAY_UTC_OFFSET_HOURS: i32 = 9;

fn display_zone() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_UTC_OFFSET_HOURS * 3600).unwrap()
}

fn spinner(msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message(msg);
    spinner
}

/// Run a single command. `login` goes straight to authentication; every
/// other command first restores the persisted session, so without one it
/// prints `Need to login` and returns before any request is made.
pub fn dispatch(
    api: &mut ApiClient,
    store: &SessionStore,
    command: &str,
    userid: Option<&str>,
    password: Option<&str>,
    access_token: Option<&str>,
    topic_id: Option<i64>,
) -> Result<()> {
    if command == "login" {
        let userid = userid.context("--userid is required for login")?;
        return login(api, store, userid, password);
    }

    let session = match store.restore() {
        Ok(session) => session,
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };
    let token = access_token.unwrap_or(&session.access_token);
    api.set_token(token);

    match command {
        "list-topic" => list_topics(api, session.me.id),
        "list-activity" => list_activities(api, session.me.id, topic_id),
        other => {
            println!("Unknown command {}", other);
            Ok(())
        }
    }
}

/// Authenticate and persist the session. The password is prompted (masked)
/// when it was not passed on the command line. A failed login leaves any
/// existing session file untouched.
pub fn login(
    api: &mut ApiClient,
    store: &SessionStore,
    userid: &str,
    password: Option<&str>,
) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => Password::new().with_prompt("Password").interact()?,
    };

    let spinner = spinner("Logging in...");
    let session = api.login(userid, &password)?;
    spinner.finish_and_clear();

    store.save(&session)?;
    println!(
        "Login success!\nNAME: {}\nID: {}",
        session.me.name, session.me.id
    );
    Ok(())
}

/// List the current user's topics, one line per topic.
pub fn list_topics(api: &ApiClient, user_id: i64) -> Result<()> {
    let response = api.get_user_topics(user_id, 0, TOPICS_PER_PAGE)?;
    for topic in &response.topics {
        println!("{}", topic_line(topic));
    }
    Ok(())
}

/// List activities for a topic when `topic_id` is given, otherwise for the
/// current user. Each activity prints as a three-line block followed by a
/// blank line.
pub fn list_activities(api: &ApiClient, user_id: i64, topic_id: Option<i64>) -> Result<()> {
    let response = match topic_id {
        Some(topic_id) => api.get_topic_activities(topic_id)?,
        None => api.get_user_activities(user_id)?,
    };
    for activity in &response.activities {
        for line in activity_lines(activity) {
            println!("{line}");
        }
        println!();
    }
    Ok(())
}

fn topic_line(topic: &Topic) -> String {
    format!("{}(topic_id={})", topic.title, topic.id)
}

fn activity_lines(activity: &Activity) -> [String; 3] {
    let created = activity.created_at.with_timezone(&display_zone());
    [
        created.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
        format!("topic={}", topic_line(&activity.topic)),
        activity.memo.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SESSION_FILE;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn topic_renders_title_and_id() {
        let topic = Topic {
            id: 42,
            title: "Foo".into(),
        };
        assert_eq!(topic_line(&topic), "Foo(topic_id=42)");
    }

    #[test]
    fn activity_renders_jst_timestamp_topic_and_memo() {
        let activity = Activity {
            created_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            topic: Topic {
                id: 1,
                title: "T".into(),
            },
            memo: "hello".into(),
        };
        let lines = activity_lines(&activity);
        assert_eq!(lines[0], "2020-01-01 09:00:00+09:00");
        assert_eq!(lines[1], "topic=T(topic_id=1)");
        assert_eq!(lines[2], "hello");
    }

    #[test]
    fn list_topic_without_session_makes_no_request() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join(SESSION_FILE));
        let mut api = ApiClient::new(&server.url()).unwrap();

        dispatch(&mut api, &store, "list-topic", None, None, None, None).unwrap();
        mock.assert();
        assert!(!api.has_token());
    }

    #[test]
    fn unknown_command_without_session_also_asks_for_login() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create();

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join(SESSION_FILE));
        let mut api = ApiClient::new(&server.url()).unwrap();

        dispatch(&mut api, &store, "frobnicate", None, None, None, None).unwrap();
        mock.assert();
    }

    #[test]
    fn successful_login_persists_the_session() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v1/auth/sign_in")
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "user": { "id": 7, "name": "alice" },
                    "accessToken": "tok-123"
                })
                .to_string(),
            )
            .create();

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join(SESSION_FILE));
        let mut api = ApiClient::new(&server.url()).unwrap();

        login(&mut api, &store, "alice", Some("s3cret")).unwrap();
        let session = store.load().expect("session should be on disk");
        assert_eq!(session.me.name, "alice");
        assert_eq!(session.access_token, "tok-123");
    }

    #[test]
    fn rejected_login_writes_no_session() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v1/auth/sign_in")
            .with_status(200)
            .with_body(json!({ "success": false }).to_string())
            .create();

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join(SESSION_FILE));
        let mut api = ApiClient::new(&server.url()).unwrap();

        assert!(login(&mut api, &store, "alice", Some("wrong")).is_err());
        assert!(store.load().is_none());
        assert!(!dir.path().join(SESSION_FILE).exists());
    }
}
