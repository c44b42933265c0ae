//! [`AuthTransport`] over HTTP with a cookie jar.

use super::{AuthTransport, TransportError, TransportFuture};
use crate::{
    api::{
        ApiErrorBody, AuthResponse, LOGIN_PATH, LOGOUT_PATH, LoginRequest, ME_PATH, SIGNUP_PATH,
        SessionResponse, SignupRequest,
    },
    option::ApiConfig,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Talks to the session backend with `reqwest`.
///
/// When the configuration asks for credentials, the client keeps a cookie store so the
/// HTTP-only session cookie set by login or signup is sent with every later request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Builds a transport for the given configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().cookie_store(config.with_credentials);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }

    /// Resolves an endpoint path below the configured origin.
    ///
    /// Any path already present on the base URL is kept as a prefix.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{path}"));
        url
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let body = Self::read_body(response).await?;
        let body = body.trim_ascii();
        if body.is_empty() {
            return Ok(serde_json::from_slice(b"{}")?);
        }
        Ok(serde_json::from_slice(body)?)
    }

    async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: ApiErrorBody::message_from_bytes(&body),
            });
        }
        Ok(body.to_vec())
    }
}

impl AuthTransport for HttpTransport {
    fn current_user(&self) -> TransportFuture<'_, SessionResponse> {
        Box::pin(async move {
            let url = self.endpoint(ME_PATH);
            debug!("GET {url}");
            let response = self.client.get(url).send().await?;
            Self::read_json(response).await
        })
    }

    fn signup<'a>(&'a self, request: &'a SignupRequest) -> TransportFuture<'a, AuthResponse> {
        Box::pin(async move {
            let url = self.endpoint(SIGNUP_PATH);
            debug!("POST {url}");
            let response = self.client.post(url).json(request).send().await?;
            Self::read_json(response).await
        })
    }

    fn login<'a>(&'a self, request: &'a LoginRequest) -> TransportFuture<'a, AuthResponse> {
        Box::pin(async move {
            let url = self.endpoint(LOGIN_PATH);
            debug!("POST {url}");
            let response = self.client.post(url).json(request).send().await?;
            Self::read_json(response).await
        })
    }

    fn logout(&self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let url = self.endpoint(LOGOUT_PATH);
            debug!("POST {url}");
            let response = self.client.post(url).send().await?;
            Self::read_body(response).await.map(|_| ())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode, header},
        response::{IntoResponse, Response},
        routing::{get, post},
    };
    use serde_json::{Value, json};

    const SESSION_COOKIE: &str = "sid=abc123";

    fn has_session(headers: &HeaderMap) -> bool {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.split(';').any(|pair| pair.trim() == SESSION_COOKIE))
    }

    async fn me(headers: HeaderMap) -> Response {
        if has_session(&headers) {
            Json(json!({"user": {"name": "Ann", "role": "user"}})).into_response()
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Not authorized"})),
            )
                .into_response()
        }
    }

    async fn login(Json(body): Json<Value>) -> Response {
        if body["password"] == "bad" {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Invalid credentials"})),
            )
                .into_response();
        }
        (
            [(header::SET_COOKIE, "sid=abc123; HttpOnly; Path=/")],
            Json(json!({"user": {"email": body["email"], "role": "admin"}, "ok": true})),
        )
            .into_response()
    }

    async fn signup(Json(body): Json<Value>) -> Response {
        if body["email"] == "taken@example.com" {
            return (StatusCode::CONFLICT, "plain text conflict").into_response();
        }
        Json(json!({"user": {"name": body["name"]}})).into_response()
    }

    async fn logout() -> Response {
        (
            [(header::SET_COOKIE, "sid=; Max-Age=0; Path=/")],
            Json(json!({"message": "bye"})),
        )
            .into_response()
    }

    async fn serve() -> String {
        let app = Router::new()
            .route(ME_PATH, get(me))
            .route(LOGIN_PATH, post(login))
            .route(SIGNUP_PATH, post(signup))
            .route(LOGOUT_PATH, post(logout))
            .route("/broken/api/users/me", get(|| async { "not json" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://localhost:{}", addr.port())
    }

    fn transport(base_url: &str, with_credentials: bool) -> HttpTransport {
        let config = ApiConfig::builder()
            .base_url(Url::parse(base_url).expect("url"))
            .with_credentials(with_credentials)
            .build();
        HttpTransport::new(&config).expect("transport")
    }

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest {
            email: "a@b.com".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let t = transport("https://api.example.com/app/", true);
        assert_eq!(
            t.endpoint(ME_PATH).as_str(),
            "https://api.example.com/app/api/users/me"
        );
        let t = transport("https://api.example.com", true);
        assert_eq!(
            t.endpoint(LOGIN_PATH).as_str(),
            "https://api.example.com/api/users/login"
        );
    }

    #[tokio::test]
    async fn probe_without_cookie_is_unauthorized() {
        let base = serve().await;
        let err = transport(&base, true).current_user().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.server_message(), Some("Not authorized"));
    }

    #[tokio::test]
    async fn login_cookie_is_sent_on_later_requests() {
        let base = serve().await;
        let t = transport(&base, true);

        let response = t.login(&login_request("good")).await.expect("login");
        let user = response.user.expect("user");
        assert_eq!(user.get("email"), Some(&json!("a@b.com")));
        assert_eq!(response.extra.get("ok"), Some(&json!(true)));

        let session = t.current_user().await.expect("me");
        assert_eq!(
            session.user.and_then(|u| u.get("name").cloned()),
            Some(json!("Ann"))
        );

        t.logout().await.expect("logout");
        assert!(t.current_user().await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn cookies_are_dropped_without_credentials() {
        let base = serve().await;
        let t = transport(&base, false);
        t.login(&login_request("good")).await.expect("login");
        assert!(t.current_user().await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn rejected_login_carries_server_message() {
        let base = serve().await;
        let err = transport(&base, true)
            .login(&login_request("bad"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.server_message(), Some("Invalid credentials"));
    }

    #[tokio::test]
    async fn non_json_error_body_has_no_message() {
        let base = serve().await;
        let request = SignupRequest {
            name: "Ann".to_string(),
            email: "taken@example.com".to_string(),
            password: "pw".to_string(),
        };
        let err = transport(&base, true).signup(&request).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.server_message(), None);
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let base = serve().await;
        let err = transport(&format!("{base}/broken"), true)
            .current_user()
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }
}
