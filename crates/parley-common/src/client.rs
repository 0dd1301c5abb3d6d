//! The request client.
//!
//! Every API call goes through [`RequestClient::request`]: headers are
//! attached on the way out, and on the way back the envelope is unwrapped
//! and classified. A failure is shown to the user exactly once (toast,
//! modal or navigation) and the caller gets [`RequestError::Surfaced`],
//! unless it is a validation error, which goes back to the caller as
//! [`RequestError::Field`] and is shown nowhere else.

use std::sync::Arc;

use http::header::{ACCEPT_LANGUAGE, AUTHORIZATION, HeaderMap, HeaderValue};
use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::classify::{Outcome, PolicyRedirect, classify};
use crate::context::{AppContext, ToastVariant};
use crate::envelope::Envelope;
use crate::error::{RequestError, TransportError};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub struct RequestClient<T> {
    transport: T,
    ctx: Arc<AppContext>,
}

impl RequestClient<ReqwestTransport> {
    /// A client over the network, with the configured timeout.
    pub fn connect(ctx: Arc<AppContext>) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(ctx.config.request_timeout())?;
        Ok(Self::new(transport, ctx))
    }
}

impl<T: Transport> RequestClient<T> {
    pub fn new(transport: T, ctx: Arc<AppContext>) -> Self {
        Self { transport, ctx }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, RequestError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RequestError> {
        let body = self.encode(body)?;
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RequestError> {
        let body = self.encode(body)?;
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RequestError> {
        let body = self.encode(body)?;
        self.request(Method::DELETE, path, Some(body)).await
    }

    /// Send one request and settle it. `path` is relative to the API prefix.
    pub async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<R, RequestError> {
        let url = self.ctx.config.endpoint(path);
        let headers = match self.headers() {
            Ok(headers) => headers,
            Err(err) => return Err(self.transport_failed(&url, err)),
        };
        tracing::debug!(%method, %url, "sending request");
        let request = HttpRequest {
            method,
            url: url.clone(),
            headers,
            body,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => return Err(self.transport_failed(&url, err)),
        };

        let status = response.status;
        let decoded = match self.settle(&url, response)? {
            Some(value) => serde_json::from_value(value),
            None => no_content(),
        };
        decoded.map_err(|err| {
            tracing::error!(%url, status, error = %err, "unexpected response shape");
            self.ctx
                .toast
                .show(format!("statusCode: {status}; {err}"), ToastVariant::Danger);
            RequestError::Surfaced
        })
    }

    /// Authorization and locale for every outgoing request.
    fn headers(&self) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.ctx.state.token() {
            let value = HeaderValue::from_str(&token).map_err(|_| TransportError::InvalidHeader {
                name: "authorization",
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        let value = HeaderValue::from_str(&self.ctx.locale()).map_err(|_| {
            TransportError::InvalidHeader {
                name: "accept-language",
            }
        })?;
        headers.insert(ACCEPT_LANGUAGE, value);
        Ok(headers)
    }

    fn encode<B: Serialize>(&self, body: &B) -> Result<Value, RequestError> {
        serde_json::to_value(body).map_err(|err| {
            tracing::error!(error = %err, "failed to encode request body");
            self.ctx.toast.show(err.to_string(), ToastVariant::Danger);
            RequestError::Surfaced
        })
    }

    fn transport_failed(&self, url: &str, err: TransportError) -> RequestError {
        tracing::error!(%url, error = %err, "request failed");
        self.ctx.toast.show(err.to_string(), ToastVariant::Danger);
        RequestError::Surfaced
    }

    /// Classify a response. `Ok(None)` is a success without content.
    fn settle(&self, url: &str, response: HttpResponse) -> Result<Option<Value>, RequestError> {
        let HttpResponse { mut status, body } = response;
        let envelope = if body.iter().all(u8::is_ascii_whitespace) {
            if (200..300).contains(&status) {
                status = 204;
            }
            Envelope::default()
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|err| {
                tracing::debug!(%url, status, error = %err, "response body is not an envelope");
                Envelope::from_raw(&body)
            })
        };

        let outcome = classify(status, envelope);
        if !outcome.is_resolved() {
            tracing::warn!(%url, status, ?outcome, "request rejected");
        }
        self.apply(outcome)
    }

    /// Carry out the one surface an outcome calls for.
    fn apply(&self, outcome: Outcome) -> Result<Option<Value>, RequestError> {
        let ctx = &self.ctx;
        let routes = &ctx.config.routes;
        match outcome {
            Outcome::Resolve(value) => return Ok(Some(value)),
            Outcome::NoContent => return Ok(None),
            Outcome::Toast(msg) => ctx.toast.show(msg, ToastVariant::Danger),
            Outcome::Modal { msg, reason } => {
                tracing::debug!(?reason, "showing modal");
                ctx.modal.show(msg, "OK");
            }
            Outcome::Field(errors) => return Err(RequestError::Field(errors)),
            Outcome::Unauthorized => {
                ctx.sign_out();
                let current = ctx.navigator.current_path();
                if path_of(&current) != routes.login {
                    if let Err(err) = ctx.state.set_redirect_path(&current) {
                        tracing::warn!(error = %err, "failed to store redirect path");
                    }
                }
                ctx.navigator.navigate(&routes.login);
            }
            Outcome::Redirect(PolicyRedirect::Inactive) => {
                ctx.navigator.navigate(&routes.login_inactive());
            }
            Outcome::Redirect(PolicyRedirect::UrlExpired) => {
                ctx.navigator.navigate(&routes.activation_failed);
            }
            Outcome::Redirect(PolicyRedirect::Suspended) => {
                if path_of(&ctx.navigator.current_path()) != routes.suspended {
                    ctx.navigator.navigate(&routes.suspended);
                }
            }
        }
        Err(RequestError::Surfaced)
    }
}

/// What a success without content decodes to: `true` for callers expecting
/// a flag, otherwise whatever `R` makes of an empty object or of `null`.
fn no_content<R: DeserializeOwned>() -> Result<R, serde_json::Error> {
    serde_json::from_value(Value::Bool(true))
        .or_else(|_| serde_json::from_value(Value::Object(Map::new())))
        .or_else(|_| serde_json::from_value(Value::Null))
}

fn path_of(location: &str) -> &str {
    location
        .split(['?', '#'])
        .next()
        .unwrap_or(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ModalReason;
    use crate::config::ClientConfig;
    use crate::context::{HistoryNavigator, Navigator};
    use crate::transport::testing::MockTransport;
    use serde_json::json;
    use web_time::Instant;

    struct Harness {
        client: RequestClient<MockTransport>,
        navigator: Arc<HistoryNavigator>,
    }

    fn harness(transport: MockTransport, start: &str) -> Harness {
        let navigator = Arc::new(HistoryNavigator::new(start));
        let config = ClientConfig {
            base_url: "https://answers.example.com".into(),
            ..ClientConfig::default()
        };
        let ctx = AppContext::new(config).with_navigator(navigator.clone());
        Harness {
            client: RequestClient::new(transport, Arc::new(ctx)),
            navigator,
        }
    }

    fn toast(client: &RequestClient<MockTransport>) -> Option<String> {
        client
            .context()
            .toast
            .current(Instant::now())
            .map(|toast| toast.msg)
    }

    #[tokio::test]
    async fn test_headers_attached() {
        let h = harness(
            MockTransport::new()
                .respond(200, json!({ "code": 200, "msg": "", "data": null }))
                .respond(200, json!({ "code": 200, "msg": "", "data": null })),
            "/",
        );
        let _: Value = h.client.get("/user/info").await.unwrap();
        h.client.context().state.set_token("tok-123").unwrap();
        h.client.context().state.set_locale("zh_CN").unwrap();
        let _: Value = h.client.get("/user/info").await.unwrap();

        let requests = h.client.transport().requests();
        assert_eq!(requests[0].url, "https://answers.example.com/api/v1/user/info");
        assert!(requests[0].headers.get(AUTHORIZATION).is_none());
        assert_eq!(requests[0].headers[ACCEPT_LANGUAGE], "en_US");
        assert_eq!(requests[1].headers[AUTHORIZATION], "tok-123");
        assert_eq!(requests[1].headers[ACCEPT_LANGUAGE], "zh_CN");
    }

    #[tokio::test]
    async fn test_resolves_data() {
        let h = harness(
            MockTransport::new().respond(
                200,
                json!({ "code": 200, "msg": "success", "data": { "id": "10" } }),
            ),
            "/",
        );
        let data: Value = h
            .client
            .post("/answer", &json!({ "content": "x" }))
            .await
            .unwrap();
        assert_eq!(data, json!({ "id": "10" }));
        assert_eq!(toast(&h.client), None);
        let request = &h.client.transport().requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, Some(json!({ "content": "x" })));
    }

    #[tokio::test]
    async fn test_no_content_resolves_true() {
        let h = harness(
            MockTransport::new()
                .respond_raw(204, "")
                .respond(200, json!({ "status": 204, "msg": "" })),
            "/",
        );
        let first: bool = h.client.get("/vote/up").await.unwrap();
        let second: bool = h.client.get("/vote/up").await.unwrap();
        assert!(first && second);
    }

    #[tokio::test]
    async fn test_no_content_decodes_typed_results() {
        #[derive(Debug, Default, PartialEq, serde::Deserialize)]
        #[serde(default)]
        struct Counts {
            votes: i64,
        }

        let h = harness(
            MockTransport::new()
                .respond_raw(204, "")
                .respond(200, json!({ "status": 204, "msg": "" }))
                .respond_raw(204, ""),
            "/",
        );
        let counts: Counts = h.client.get("/x").await.unwrap();
        assert_eq!(counts, Counts::default());
        let nothing: Option<u64> = h.client.get("/x").await.unwrap();
        assert_eq!(nothing, None);
        h.client.get::<()>("/x").await.unwrap();
        assert_eq!(toast(&h.client), None);
    }

    #[tokio::test]
    async fn test_no_content_status_on_error_is_classified() {
        let h = harness(
            MockTransport::new()
                .respond(401, json!({ "status": 204, "msg": "unauthorized" }))
                .respond(500, json!({ "status": 204, "msg": "database down" })),
            "/questions/7",
        );
        h.client.context().state.set_token("expired").unwrap();
        assert!(h.client.get::<bool>("/x").await.unwrap_err().is_surfaced());
        assert_eq!(h.client.context().state.token(), None);
        assert_eq!(h.navigator.current_path(), "/users/login");

        assert!(h.client.get::<bool>("/x").await.unwrap_err().is_surfaced());
        assert_eq!(
            toast(&h.client).as_deref(),
            Some("statusCode: 500; database down")
        );
    }

    #[tokio::test]
    async fn test_field_error_is_returned_not_shown() {
        let h = harness(
            MockTransport::new().respond(
                400,
                json!({ "code": 400, "msg": "bad", "data": { "key": "title", "value": "title required" } }),
            ),
            "/questions/ask",
        );
        let err = h.client.get::<Value>("/question").await.unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors.key.as_deref(), Some("title"));
        assert_eq!(errors.value.as_deref(), Some("title required"));
        assert_eq!(toast(&h.client), None);
        assert_eq!(h.client.context().modal.current(), None);
        assert_eq!(h.navigator.history(), vec!["/questions/ask"]);
    }

    #[tokio::test]
    async fn test_bad_request_toast_and_modal() {
        let h = harness(
            MockTransport::new()
                .respond(400, json!({ "msg": "too fast", "data": { "err_type": "toast" } }))
                .respond(400, json!({ "msg": "please confirm", "data": { "type": "modal" } })),
            "/",
        );
        let err = h.client.get::<Value>("/a").await.unwrap_err();
        assert!(err.is_surfaced());
        assert_eq!(toast(&h.client).as_deref(), Some("too fast"));
        assert_eq!(h.client.context().modal.current(), None);

        h.client.context().toast.dismiss();
        let err = h.client.get::<Value>("/b").await.unwrap_err();
        assert!(err.is_surfaced());
        assert_eq!(toast(&h.client), None);
        assert_eq!(
            h.client.context().modal.current().unwrap().msg,
            "please confirm"
        );
    }

    #[tokio::test]
    async fn test_unstructured_bad_request_shows_raw_message() {
        let h = harness(MockTransport::new().respond_raw(400, "Bad Request"), "/");
        let err = h.client.get::<Value>("/a").await.unwrap_err();
        assert!(err.is_surfaced());
        assert_eq!(
            h.client.context().modal.current().unwrap().msg,
            "Bad Request"
        );
        assert_eq!(
            classify(400, Envelope::from_raw(b"Bad Request")),
            Outcome::Modal {
                msg: "Bad Request".into(),
                reason: ModalReason::Unstructured
            }
        );
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session() {
        let h = harness(
            MockTransport::new().respond(401, json!({ "msg": "unauthorized" })),
            "/questions/42?sort=newest",
        );
        let ctx = h.client.context();
        ctx.state.set_token("expired").unwrap();
        ctx.user.set(crate::api::UserInfo {
            username: "ferris".into(),
            ..Default::default()
        });

        let err = h.client.get::<Value>("/user/info").await.unwrap_err();
        assert!(err.is_surfaced());
        assert_eq!(ctx.state.token(), None);
        assert!(!ctx.user.is_signed_in());
        assert_eq!(
            ctx.state.redirect_path().as_deref(),
            Some("/questions/42?sort=newest")
        );
        assert_eq!(h.navigator.current_path(), "/users/login");
        assert_eq!(toast(&h.client), None);
    }

    #[tokio::test]
    async fn test_policy_redirects() {
        let h = harness(
            MockTransport::new()
                .respond(403, json!({ "data": { "type": "inactive" } }))
                .respond(403, json!({ "data": { "type": "url_expired" } }))
                .respond(403, json!({ "data": { "type": "suspended" } }))
                .respond(403, json!({ "data": { "type": "suspended" } })),
            "/",
        );
        for _ in 0..4 {
            assert!(h.client.get::<Value>("/x").await.unwrap_err().is_surfaced());
        }
        assert_eq!(
            h.navigator.history(),
            vec![
                "/",
                "/users/login?status=inactive",
                "/users/account-activation/failed",
                "/users/account-suspended",
            ]
        );
    }

    #[tokio::test]
    async fn test_other_status_toasts_with_code() {
        let h = harness(
            MockTransport::new().respond(500, json!({ "msg": "database down" })),
            "/",
        );
        assert!(h.client.get::<Value>("/x").await.unwrap_err().is_surfaced());
        assert_eq!(
            toast(&h.client).as_deref(),
            Some("statusCode: 500; database down")
        );
    }

    #[tokio::test]
    async fn test_transport_failure_toasts() {
        let h = harness(MockTransport::new().fail(TransportError::Timeout), "/");
        assert!(h.client.get::<Value>("/x").await.unwrap_err().is_surfaced());
        assert_eq!(toast(&h.client).as_deref(), Some("request timed out"));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_surfaced() {
        let h = harness(
            MockTransport::new().respond(200, json!({ "data": "not a number" })),
            "/",
        );
        assert!(h.client.get::<u64>("/x").await.unwrap_err().is_surfaced());
        assert!(toast(&h.client).is_some());
    }

    #[test]
    fn test_path_of() {
        assert_eq!(path_of("/users/account-suspended?x=1"), "/users/account-suspended");
        assert_eq!(path_of("/a#b"), "/a");
        assert_eq!(path_of(""), "");
    }
}
