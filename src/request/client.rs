//! reqwest-backed HTTP client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, HOST, REFERER, USER_AGENT};
use reqwest::{Client, Method, Proxy, StatusCode};
use std::time::Duration;

use crate::context::TraceContext;
use crate::http::X_REQUEST_ID;
use crate::outcome::{BoxError, BoxResult, Code};
use crate::request::{HttpClient, HttpResult, RequestOption, RequestParam};
use crate::validate::Validator;

const BROWSER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/92.0.4515.159 Safari/537.36";

pub struct ReqwestClient {
    shared: Client,
    option: RequestOption,
    validator: Validator,
}

impl ReqwestClient {
    pub const DISCRIMINATOR: &'static str = "reqwest";

    pub fn new(option: &RequestOption) -> BoxResult<Self> {
        let shared = Client::builder()
            .user_agent(option.user_agent.as_str())
            .build()
            .map_err(|e| BoxError::new(Code::INTERRUPT, "failed to build http client").with_cause(e))?;
        Ok(Self {
            shared,
            option: option.clone(),
            validator: Validator::default(),
        })
    }

    fn client_for(&self, param: &RequestParam) -> BoxResult<Client> {
        let proxy = param.effective_proxy();
        if proxy.is_none() && !param.skip_verify {
            return Ok(self.shared.clone());
        }

        let mut builder = Client::builder()
            .user_agent(self.option.user_agent.as_str())
            .danger_accept_invalid_certs(param.skip_verify);
        if let Some(proxy) = proxy {
            let proxy = Proxy::all(proxy)
                .map_err(|e| BoxError::param_invalid(format!("invalid proxy {}", proxy)).with_cause(e))?;
            builder = builder.proxy(proxy);
        }
        builder
            .build()
            .map_err(|e| BoxError::new(Code::RUNTIME_PARAM_ERROR, "failed to build http client").with_cause(e))
    }

    fn headers(ctx: &TraceContext, param: &RequestParam, method: &Method) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(trace) = HeaderValue::from_str(ctx.trace()) {
            headers.insert(X_REQUEST_ID, trace);
        }
        if param.enable_header {
            if let Some(host) = url::Url::parse(&param.link).ok().and_then(|u| authority(&u)) {
                if let Ok(value) = HeaderValue::from_str(&host) {
                    headers.insert(HOST, value.clone());
                    headers.insert(REFERER, value);
                }
            }
            headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        }
        if *method == Method::POST {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers
    }

    async fn work(&self, ctx: &TraceContext, method: Method, param: RequestParam) -> BoxResult<HttpResult> {
        self.validator.validate(&param).map_err(BoxError::from)?;

        let timeout = match param.timeout_secs {
            0 => self.option.default_timeout_secs,
            secs => secs,
        };
        let client = self.client_for(&param)?;
        let mut request = client
            .request(method.clone(), &param.link)
            .headers(Self::headers(ctx, &param, &method))
            .timeout(Duration::from_secs(timeout));
        if !param.payload.is_empty() {
            request = request.body(param.payload.clone());
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(trace = %ctx, link = %param.link, error = %e, "Outbound request failed");
            BoxError::new(Code::DATA_INVALID, "request failed").with_cause(e)
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BoxError::new(Code::CODEC_ERROR, "failed to read response body").with_cause(e))?;

        tracing::debug!(trace = %ctx, method = %method, link = %param.link, status = status.as_u16(), "Outbound request done");
        check_status(status)?;
        Ok(HttpResult {
            text,
            status_code: status.as_u16(),
        })
    }
}

fn authority(url: &url::Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn check_status(status: StatusCode) -> BoxResult<()> {
    match status.as_u16() {
        0..=201 => Ok(()),
        429 => Err(BoxError::from_code(Code::LIMIT_ERROR)),
        404 => Err(BoxError::new(Code::CHECK, "resource not found")),
        other => Err(BoxError::new(
            Code::STATUS_ERROR,
            format!("unexpected status code {}", other),
        )),
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, ctx: &TraceContext, param: RequestParam) -> BoxResult<HttpResult> {
        self.work(ctx, Method::GET, param).await
    }

    async fn post(&self, ctx: &TraceContext, param: RequestParam) -> BoxResult<HttpResult> {
        self.work(ctx, Method::POST, param).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::CREATED).is_ok());
        assert_eq!(check_status(StatusCode::NOT_FOUND).unwrap_err().code, Code::CHECK);
        assert_eq!(check_status(StatusCode::TOO_MANY_REQUESTS).unwrap_err().code, Code::LIMIT_ERROR);
        assert_eq!(check_status(StatusCode::ACCEPTED).unwrap_err().code, Code::STATUS_ERROR);
        assert_eq!(
            check_status(StatusCode::BAD_GATEWAY).unwrap_err().label,
            "unexpected status code 502"
        );
    }

    #[test]
    fn test_headers() {
        let ctx = TraceContext::new("19619c9e08f0ed4cc147e211efa8c3f0", "test");
        let param = RequestParam::new("http://127.0.0.1:9000/path").enable_header(true);
        let headers = ReqwestClient::headers(&ctx, &param, &Method::POST);
        assert_eq!(headers[X_REQUEST_ID], "19619c9e08f0ed4cc147e211efa8c3f0");
        assert_eq!(headers[HOST], "127.0.0.1:9000");
        assert_eq!(headers[REFERER], "127.0.0.1:9000");
        assert_eq!(headers[CONTENT_TYPE], "application/json");

        let plain = ReqwestClient::headers(&ctx, &RequestParam::new("http://x.io"), &Method::GET);
        assert_eq!(plain.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_link_is_param_error() {
        let client = ReqwestClient::new(&RequestOption::default()).unwrap();
        let ctx = TraceContext::detached("test");
        let err = client.get(&ctx, RequestParam::new("nowhere")).await.unwrap_err();
        assert!(err.is_param_invalid());
    }
}
