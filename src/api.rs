// Command handlers for the budget service. Each handler builds its request,
// sends it through a `Transport`, and turns the reply into either an
// `Outcome` for the UI to show or a `CommandError`. Token-gated handlers
// check the session before touching the network.

use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{CommandError, CommandResult};
use crate::models::{
    parse_user_data, CategoryRecord, ExpenseResponse, LoginRequest, LoginResponse, Notification,
    NotificationsResponse, SignUpRequest, UserData, NO_DATA_MESSAGE,
};
use crate::session::{self, Session};
use crate::transport::{HttpResponse, Transport};

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Account created. The server's reply is echoed back; no session is
    /// established.
    SignedUp { response: Value },
    /// Token stored in the session and written to `config_file`.
    LoggedIn { config_file: PathBuf },
    UserData(Vec<CategoryRecord>),
    NoUserData(String),
    Notifications(Vec<Notification>),
    NoNotifications,
    ExpenseAdded { category: String },
}

/// Handlers over a transport. Per-user config files are written to
/// `config_dir`.
pub struct ApiClient<T: Transport> {
    transport: T,
    config_dir: PathBuf,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            config_dir: config_dir.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Register a user by POSTing to /signup. Never touches the session
    /// token: the user must log in separately.
    pub fn sign_up(&self, session: &Session, req: &SignUpRequest) -> CommandResult<Outcome> {
        let url = session.endpoint("signup");
        let payload = serde_json::to_value(req)?;
        let res = self
            .transport
            .post_json(&url, &payload)
            .ok_or(CommandError::Transport)?;
        let body = expect_ok(res)?;
        let response: Value = serde_json::from_str(&body)?;
        info!(username = %req.username, "sign-up accepted");
        Ok(Outcome::SignedUp { response })
    }

    /// Log in. The token is set only when the server answers 200 with a
    /// `token` field; it is then saved to the per-user config file.
    pub fn log_in(&self, session: &mut Session, req: &LoginRequest) -> CommandResult<Outcome> {
        let url = session.endpoint("login");
        let payload = serde_json::to_value(req)?;
        let res = self
            .transport
            .post_json(&url, &payload)
            .ok_or(CommandError::Transport)?;
        let body = expect_ok(res)?;
        let token = serde_json::from_str::<LoginResponse>(&body)?
            .token
            .ok_or_else(|| CommandError::Decode("login response carries no token".into()))?;

        session.set_token(token.as_str());
        info!(username = %req.username, "logged in");
        let config_file = session::persist(
            &self.config_dir,
            &req.username,
            session.base_url(),
            &token,
        )?;
        Ok(Outcome::LoggedIn { config_file })
    }

    pub fn fetch_user_data(&self, session: &Session) -> CommandResult<Outcome> {
        let token = session.require_token()?;
        let url = session.endpoint("fetch-user-data");
        let res = self
            .transport
            .get(&url, &[("token", token)])
            .ok_or(CommandError::Transport)?;
        let body = expect_ok(res)?;
        match parse_user_data(&body)? {
            UserData::Records(records) if records.is_empty() => {
                Ok(Outcome::NoUserData(NO_DATA_MESSAGE.to_string()))
            }
            UserData::Records(records) => {
                debug!(count = records.len(), "user data fetched");
                Ok(Outcome::UserData(records))
            }
            UserData::NoData(message) => Ok(Outcome::NoUserData(message)),
        }
    }

    pub fn fetch_alerts(&self, session: &Session) -> CommandResult<Outcome> {
        let token = session.require_token()?;
        let url = session.endpoint("notifications");
        let res = self
            .transport
            .get(&url, &[("token", token)])
            .ok_or(CommandError::Transport)?;
        let body = expect_ok(res)?;
        let notifications =
            serde_json::from_str::<NotificationsResponse>(&body)?.into_notifications();
        if notifications.is_empty() {
            return Ok(Outcome::NoNotifications);
        }
        Ok(Outcome::Notifications(notifications))
    }

    /// Record an expense. The service expects every field, token included,
    /// as a query parameter on a POST with an empty body.
    pub fn add_expense(
        &self,
        session: &Session,
        description: &str,
        amount: f64,
    ) -> CommandResult<Outcome> {
        let token = session.require_token()?;
        let url = session.endpoint("new-expense");
        let amount = amount.to_string();
        let query = [
            ("token", token),
            ("description", description),
            ("amount", amount.as_str()),
        ];
        let res = self
            .transport
            .post_query(&url, &query)
            .ok_or(CommandError::Transport)?;
        let body = expect_ok(res)?;
        let category = serde_json::from_str::<ExpenseResponse>(&body)?.category;
        info!(category = %category, "expense recorded");
        Ok(Outcome::ExpenseAdded { category })
    }
}

/// Pass a 200 body through; turn anything else into a protocol error
/// carrying the server's `error` field, or its whole JSON body.
fn expect_ok(res: HttpResponse) -> CommandResult<String> {
    if res.is_ok() {
        return Ok(res.body);
    }
    let status = res.status;
    warn!(status, "server rejected request");
    let value: Value = serde_json::from_str(&res.body)
        .map_err(|e| CommandError::Decode(format!("status {status}: {e}")))?;
    let message = match value.get("error") {
        Some(Value::String(s)) => s.clone(),
        _ => value.to_string(),
    };
    Err(CommandError::Protocol { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;
    use tempfile::TempDir;

    fn logged_in() -> Session {
        let mut session = Session::new("http://svc");
        session.set_token("tok");
        session
    }

    fn client(transport: FakeTransport, dir: &TempDir) -> ApiClient<FakeTransport> {
        ApiClient::new(transport, dir.path())
    }

    fn login_req() -> LoginRequest {
        LoginRequest {
            username: "alice".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn sign_up_never_sets_token() {
        let dir = TempDir::new().unwrap();
        let body = r#"{"username":"alice","email":"a@x.io"}"#;
        let api = client(FakeTransport::new().respond(200, body), &dir);
        let session = Session::new("http://svc");
        let req = SignUpRequest {
            username: "alice".into(),
            email: "a@x.io".into(),
            password: "pw".into(),
        };

        let outcome = api.sign_up(&session, &req).unwrap();
        assert!(matches!(outcome, Outcome::SignedUp { .. }));
        assert!(!session.is_authenticated());

        let call = api.transport().last_call().unwrap();
        assert_eq!(call.method, "POST");
        assert_eq!(call.url, "http://svc/signup");
        assert_eq!(
            call.body.unwrap(),
            serde_json::json!({"username":"alice","email":"a@x.io","password":"pw"})
        );
    }

    #[test]
    fn sign_up_failure_reports_error_field() {
        let dir = TempDir::new().unwrap();
        let api = client(
            FakeTransport::new().respond(400, r#"{"error":"username taken"}"#),
            &dir,
        );
        let req = SignUpRequest {
            username: "alice".into(),
            email: "a@x.io".into(),
            password: "pw".into(),
        };
        match api.sign_up(&Session::new("http://svc"), &req) {
            Err(CommandError::Protocol { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "username taken");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn login_sets_and_persists_token() {
        let dir = TempDir::new().unwrap();
        let api = client(FakeTransport::new().respond(200, r#"{"token":"t-42"}"#), &dir);
        let mut session = Session::new("http://svc");

        let outcome = api.log_in(&mut session, &login_req()).unwrap();
        assert_eq!(session.token(), Some("t-42"));

        let expected = dir.path().join("blueseave-alice-config.ini");
        assert_eq!(
            outcome,
            Outcome::LoggedIn {
                config_file: expected.clone()
            }
        );
        let saved = std::fs::read_to_string(expected).unwrap();
        assert!(saved.contains("webservice = http://svc"));
        assert!(saved.contains("token = t-42"));
    }

    #[test]
    fn login_without_token_field_leaves_session_unset() {
        let dir = TempDir::new().unwrap();
        let api = client(FakeTransport::new().respond(200, r#"{"ok":true}"#), &dir);
        let mut session = Session::new("http://svc");

        let err = api.log_in(&mut session, &login_req()).unwrap_err();
        assert!(matches!(err, CommandError::Decode(_)));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn repeated_failed_login_keeps_session_unset() {
        let dir = TempDir::new().unwrap();
        let api = client(
            FakeTransport::new()
                .respond(401, r#"{"error":"bad credentials"}"#)
                .respond(401, r#"{"error":"bad credentials"}"#),
            &dir,
        );
        let mut session = Session::new("http://svc");

        for _ in 0..2 {
            let err = api.log_in(&mut session, &login_req()).unwrap_err();
            assert!(matches!(err, CommandError::Protocol { status: 401, .. }));
            assert!(session.token().is_none());
        }
        assert!(!dir.path().join("blueseave-alice-config.ini").exists());
    }

    #[test]
    fn login_transport_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let api = client(FakeTransport::new().unreachable(), &dir);
        let mut session = Session::new("http://svc");
        let err = api.log_in(&mut session, &login_req()).unwrap_err();
        assert!(matches!(err, CommandError::Transport));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn gated_commands_without_session_make_no_calls() {
        let dir = TempDir::new().unwrap();
        let api = client(FakeTransport::new(), &dir);
        let session = Session::new("http://svc");

        assert!(matches!(
            api.fetch_user_data(&session),
            Err(CommandError::NotAuthenticated)
        ));
        assert!(matches!(
            api.fetch_alerts(&session),
            Err(CommandError::NotAuthenticated)
        ));
        assert!(matches!(
            api.add_expense(&session, "lunch", 12.5),
            Err(CommandError::NotAuthenticated)
        ));
        assert_eq!(api.transport().call_count(), 0);
    }

    #[test]
    fn fetch_user_data_handles_both_body_shapes() {
        let dir = TempDir::new().unwrap();
        let api = client(
            FakeTransport::new()
                .respond(
                    200,
                    r#"{"body": "[{\"CategoryName\":\"Food\",\"TotalAmount\":10,\"BudgetAmount\":null}]"}"#,
                )
                .respond(
                    200,
                    r#"{"body": [{"CategoryName":"Food","TotalAmount":10,"BudgetAmount":null}]}"#,
                ),
            &dir,
        );
        let session = logged_in();
        let expected = Outcome::UserData(vec![CategoryRecord {
            category_name: "Food".into(),
            total_amount: 10.0,
            budget_amount: 0.0,
        }]);

        assert_eq!(api.fetch_user_data(&session).unwrap(), expected);
        assert_eq!(api.fetch_user_data(&session).unwrap(), expected);

        let call = api.transport().last_call().unwrap();
        assert_eq!(call.method, "GET");
        assert_eq!(call.url, "http://svc/fetch-user-data");
        assert_eq!(call.query, vec![("token".to_string(), "tok".to_string())]);
    }

    #[test]
    fn fetch_user_data_401_reports_status_and_error() {
        let dir = TempDir::new().unwrap();
        let api = client(
            FakeTransport::new().respond(401, r#"{"error":"invalid token"}"#),
            &dir,
        );
        let err = api.fetch_user_data(&logged_in()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("401"));
        assert!(text.contains("invalid token"));
    }

    #[test]
    fn fetch_user_data_sentinel_and_empty_list() {
        let dir = TempDir::new().unwrap();
        let api = client(
            FakeTransport::new()
                .respond(200, r#"{"body": {"message": "No data available for this user."}}"#)
                .respond(200, r#"{"body": "[]"}"#),
            &dir,
        );
        let session = logged_in();
        assert_eq!(
            api.fetch_user_data(&session).unwrap(),
            Outcome::NoUserData(NO_DATA_MESSAGE.into())
        );
        assert_eq!(
            api.fetch_user_data(&session).unwrap(),
            Outcome::NoUserData(NO_DATA_MESSAGE.into())
        );
    }

    #[test]
    fn non_json_error_body_is_a_decode_failure() {
        let dir = TempDir::new().unwrap();
        let api = client(
            FakeTransport::new().respond(500, "<html>Internal Server Error</html>"),
            &dir,
        );
        let err = api.fetch_user_data(&logged_in()).unwrap_err();
        assert!(matches!(err, CommandError::Decode(ref m) if m.contains("500")));
    }

    #[test]
    fn error_body_without_error_field_is_shown_whole() {
        let dir = TempDir::new().unwrap();
        let api = client(
            FakeTransport::new().respond(500, r#"{"detail":"boom"}"#),
            &dir,
        );
        match api.fetch_alerts(&logged_in()) {
            Err(CommandError::Protocol { status, message }) => {
                assert_eq!(status, 500);
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn transport_failure_on_fetch_is_reported() {
        let dir = TempDir::new().unwrap();
        let api = client(FakeTransport::new().unreachable(), &dir);
        assert!(matches!(
            api.fetch_user_data(&logged_in()),
            Err(CommandError::Transport)
        ));
    }

    #[test]
    fn empty_notifications_are_reported() {
        let dir = TempDir::new().unwrap();
        let api = client(FakeTransport::new().respond(200, r#"{"body": []}"#), &dir);
        assert_eq!(
            api.fetch_alerts(&logged_in()).unwrap(),
            Outcome::NoNotifications
        );
    }

    #[test]
    fn null_notifications_body_means_none() {
        let dir = TempDir::new().unwrap();
        let api = client(
            FakeTransport::new()
                .respond(200, r#"{"body": null}"#)
                .respond(200, r#"{}"#),
            &dir,
        );
        let session = logged_in();
        assert_eq!(api.fetch_alerts(&session).unwrap(), Outcome::NoNotifications);
        assert_eq!(api.fetch_alerts(&session).unwrap(), Outcome::NoNotifications);
    }

    #[test]
    fn notifications_are_listed() {
        let dir = TempDir::new().unwrap();
        let api = client(
            FakeTransport::new().respond(
                200,
                r#"{"body": [{"Message":"Food over budget","CreatedAt":"2024-11-02 10:00:00"}]}"#,
            ),
            &dir,
        );
        let outcome = api.fetch_alerts(&logged_in()).unwrap();
        assert_eq!(
            outcome,
            Outcome::Notifications(vec![Notification {
                message: "Food over budget".into(),
                created_at: "2024-11-02 10:00:00".into(),
            }])
        );
        let call = api.transport().last_call().unwrap();
        assert_eq!(call.url, "http://svc/notifications");
    }

    #[test]
    fn add_expense_sends_query_parameters_and_empty_body() {
        let dir = TempDir::new().unwrap();
        let api = client(
            FakeTransport::new().respond(200, r#"{"category":"Food"}"#),
            &dir,
        );
        let outcome = api.add_expense(&logged_in(), "lunch", 12.5).unwrap();
        assert_eq!(
            outcome,
            Outcome::ExpenseAdded {
                category: "Food".into()
            }
        );

        let call = api.transport().last_call().unwrap();
        assert_eq!(call.method, "POST");
        assert_eq!(call.url, "http://svc/new-expense");
        assert!(call.body.is_none());
        assert_eq!(
            call.query,
            vec![
                ("token".to_string(), "tok".to_string()),
                ("description".to_string(), "lunch".to_string()),
                ("amount".to_string(), "12.5".to_string()),
            ]
        );
    }
}
