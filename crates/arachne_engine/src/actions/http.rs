//! HTTP fetch action.

use crate::action::{expect_value, Action, ActionCore};
use crate::materialize::TaskContext;
use crate::pipe::PipeValue;
use crate::ActionError;
use arachne_protocol::{ActionTemplate, ProtocolError, Value};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE, SET_COOKIE};
use reqwest::Method;
use std::collections::HashMap;

pub const INPUT_URL_PARAMS: &str = "urlParams";
pub const INPUT_HEADERS: &str = "headers";
pub const INPUT_COOKIES: &str = "cookies";
pub const INPUT_BASE_URL: &str = "baseURL";

pub const OUTPUT_BODY: &str = "body";
pub const OUTPUT_HEADERS: &str = "headers";
pub const OUTPUT_COOKIES: &str = "cookies";
pub const OUTPUT_STATUS_CODE: &str = "statusCode";

/// Issues one HTTP request per run with the configured method and base URL,
/// merging URL params, headers, and cookies taken from inputs. Every output
/// port is optional; whatever is bound receives the full response part.
pub struct HttpAction {
    core: ActionCore,
    base_url: Option<String>,
    method: String,
}

impl HttpAction {
    pub fn new(base_url: Option<&str>, method: &str, can_fail: bool) -> Self {
        Self {
            core: ActionCore::new(
                "",
                can_fail,
                vec![
                    INPUT_URL_PARAMS.to_string(),
                    INPUT_HEADERS.to_string(),
                    INPUT_COOKIES.to_string(),
                    INPUT_BASE_URL.to_string(),
                ],
                vec![
                    OUTPUT_BODY.to_string(),
                    OUTPUT_HEADERS.to_string(),
                    OUTPUT_COOKIES.to_string(),
                    OUTPUT_STATUS_CODE.to_string(),
                ],
            ),
            base_url: base_url.map(str::to_string),
            method: method.to_string(),
        }
    }

    pub fn from_template(
        template: &ActionTemplate,
        _ctx: &TaskContext,
    ) -> Result<Box<dyn Action>, ProtocolError> {
        let base_url = template.opt_str("baseURL")?.map(str::to_string);
        let method = template.opt_str("method")?.unwrap_or("GET").to_string();
        let can_fail = template.opt_bool("canFail")?.unwrap_or(false);

        let mut action = Self::new(base_url.as_deref(), &method, can_fail);
        action.core.name = template.name.clone();
        Ok(Box::new(action))
    }

    fn query_pairs(&self) -> Result<Vec<(String, String)>, ActionError> {
        let mut pairs = Vec::new();
        if let Some(value) = self.core.try_take_input(INPUT_URL_PARAMS) {
            match expect_value(INPUT_URL_PARAMS, value)? {
                Value::StringMap(map) => {
                    for (k, v) in map {
                        pairs.push((k, v));
                    }
                }
                Value::StringsMap(map) => {
                    for (k, vs) in map {
                        for v in vs {
                            pairs.push((k.clone(), v));
                        }
                    }
                }
                other => {
                    return Err(ActionError::BadInputType {
                        input: INPUT_URL_PARAMS.to_string(),
                        expected: "stringMap or stringsMap",
                        got: other.type_name().to_string(),
                    })
                }
            }
        }
        pairs.sort();
        Ok(pairs)
    }

    fn request_headers(&self) -> Result<HeaderMap, ActionError> {
        let mut headers = HeaderMap::new();

        if let Some(value) = self.core.try_take_input(INPUT_HEADERS) {
            let insert = |headers: &mut HeaderMap, k: &str, v: &str| {
                let name = HeaderName::from_bytes(k.as_bytes())
                    .map_err(|_| ActionError::BadHeader(k.to_string()))?;
                let value = HeaderValue::from_str(v)
                    .map_err(|_| ActionError::BadHeader(k.to_string()))?;
                headers.append(name, value);
                Ok::<(), ActionError>(())
            };
            match expect_value(INPUT_HEADERS, value)? {
                Value::StringMap(map) => {
                    for (k, v) in &map {
                        insert(&mut headers, k, v)?;
                    }
                }
                Value::StringsMap(map) => {
                    for (k, vs) in &map {
                        for v in vs {
                            insert(&mut headers, k, v)?;
                        }
                    }
                }
                other => {
                    return Err(ActionError::BadInputType {
                        input: INPUT_HEADERS.to_string(),
                        expected: "stringMap or stringsMap",
                        got: other.type_name().to_string(),
                    })
                }
            }
        }

        if let Some(value) = self.core.try_take_input(INPUT_COOKIES) {
            match expect_value(INPUT_COOKIES, value)? {
                Value::Cookies(cookies) if !cookies.is_empty() => {
                    let mut pairs: Vec<String> =
                        cookies.iter().map(|(k, v)| format!("{k}={v}")).collect();
                    pairs.sort();
                    let header = HeaderValue::from_str(&pairs.join("; "))
                        .map_err(|_| ActionError::BadHeader(COOKIE.as_str().to_string()))?;
                    headers.insert(COOKIE, header);
                }
                Value::Cookies(_) => {}
                other => {
                    return Err(ActionError::BadInputType {
                        input: INPUT_COOKIES.to_string(),
                        expected: "cookies",
                        got: other.type_name().to_string(),
                    })
                }
            }
        }

        Ok(headers)
    }
}

impl Action for HttpAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        let base_url = match self.core.try_take_input(INPUT_BASE_URL) {
            Some(value) => match expect_value(INPUT_BASE_URL, value)? {
                Value::Str(s) => s,
                other => {
                    return Err(ActionError::BadInputType {
                        input: INPUT_BASE_URL.to_string(),
                        expected: "str",
                        got: other.type_name().to_string(),
                    })
                }
            },
            None => self.base_url.clone().ok_or(ActionError::NoBaseUrl)?,
        };

        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|_| ActionError::BadMethod(self.method.clone()))?;
        let pairs = self.query_pairs()?;
        let headers = self.request_headers()?;

        let client = Client::builder().build()?;
        let mut request = client.request(method, &base_url).headers(headers);
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }
        let response = request.send()?;

        self.core.fan_out_if_connected(
            OUTPUT_STATUS_CODE,
            PipeValue::Value(Value::Int(response.status().as_u16() as i64)),
        );

        if self.core.has_output(OUTPUT_HEADERS) {
            let mut map: HashMap<String, Vec<String>> = HashMap::new();
            for (name, value) in response.headers() {
                if let Ok(text) = value.to_str() {
                    map.entry(name.as_str().to_string())
                        .or_default()
                        .push(text.to_string());
                }
            }
            self.core
                .fan_out_if_connected(OUTPUT_HEADERS, PipeValue::Value(Value::StringsMap(map)));
        }

        if self.core.has_output(OUTPUT_COOKIES) {
            let mut cookies: HashMap<String, String> = HashMap::new();
            for value in response.headers().get_all(SET_COOKIE) {
                if let Ok(text) = value.to_str() {
                    if let Some(pair) = text.split(';').next() {
                        if let Some((name, val)) = pair.split_once('=') {
                            cookies.insert(name.trim().to_string(), val.trim().to_string());
                        }
                    }
                }
            }
            self.core
                .fan_out_if_connected(OUTPUT_COOKIES, PipeValue::Value(Value::Cookies(cookies)));
        }

        if self.core.has_output(OUTPUT_BODY) {
            let body = response.bytes()?.to_vec();
            self.core
                .fan_out_if_connected(OUTPUT_BODY, PipeValue::Value(Value::Bytes(body)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::DataPipe;
    use httpmock::prelude::*;

    #[test]
    fn test_get_with_params_headers_cookies() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/list")
                .query_param("a", "1")
                .query_param("b", "2")
                .header("accept", "text/plain")
                .header("cookie", "session=abc");
            then.status(200)
                .header("server", "TestServer")
                .header("set-cookie", "session=def; Path=/")
                .body("Test Payload");
        });

        let mut action = HttpAction::new(Some(&server.url("/list")), "GET", false);

        let params_in = DataPipe::new();
        params_in.borrow_mut().push(Value::StringMap(HashMap::from([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ])));
        action.add_input(INPUT_URL_PARAMS, params_in).unwrap();

        let headers_in = DataPipe::new();
        headers_in.borrow_mut().push(Value::StringMap(HashMap::from([(
            "accept".to_string(),
            "text/plain".to_string(),
        )])));
        action.add_input(INPUT_HEADERS, headers_in).unwrap();

        let cookies_in = DataPipe::new();
        cookies_in.borrow_mut().push(Value::Cookies(HashMap::from([(
            "session".to_string(),
            "abc".to_string(),
        )])));
        action.add_input(INPUT_COOKIES, cookies_in).unwrap();

        let body_out = DataPipe::new();
        let headers_out = DataPipe::new();
        let cookies_out = DataPipe::new();
        let status_out = DataPipe::new();
        action.add_output(OUTPUT_BODY, body_out.clone()).unwrap();
        action.add_output(OUTPUT_HEADERS, headers_out.clone()).unwrap();
        action.add_output(OUTPUT_COOKIES, cookies_out.clone()).unwrap();
        action.add_output(OUTPUT_STATUS_CODE, status_out.clone()).unwrap();

        action.run().unwrap();
        mock.assert();

        match body_out.borrow_mut().pop() {
            Some(PipeValue::Value(Value::Bytes(body))) => {
                assert_eq!(body, b"Test Payload".to_vec())
            }
            other => panic!("unexpected body output: {other:?}"),
        }

        match status_out.borrow_mut().pop() {
            Some(PipeValue::Value(Value::Int(code))) => assert_eq!(code, 200),
            other => panic!("unexpected status output: {other:?}"),
        }

        match headers_out.borrow_mut().pop() {
            Some(PipeValue::Value(Value::StringsMap(map))) => {
                assert_eq!(map.get("server"), Some(&vec!["TestServer".to_string()]))
            }
            other => panic!("unexpected headers output: {other:?}"),
        }

        match cookies_out.borrow_mut().pop() {
            Some(PipeValue::Value(Value::Cookies(cookies))) => {
                assert_eq!(cookies.get("session"), Some(&"def".to_string()))
            }
            other => panic!("unexpected cookies output: {other:?}"),
        };
    }

    #[test]
    fn test_head_without_outputs() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::HEAD).path("/ping");
            then.status(200);
        });

        let mut action = HttpAction::new(Some(&server.url("/ping")), "HEAD", false);
        action.run().unwrap();
        mock.assert();
    }

    #[test]
    fn test_base_url_input_overrides_config() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/override");
            then.status(200).body("ok");
        });

        let mut action = HttpAction::new(Some("http://127.0.0.1:1/unused"), "GET", false);

        let base_in = DataPipe::new();
        base_in
            .borrow_mut()
            .push(Value::Str(server.url("/override")));
        action.add_input(INPUT_BASE_URL, base_in).unwrap();

        let status_out = DataPipe::new();
        action.add_output(OUTPUT_STATUS_CODE, status_out.clone()).unwrap();

        action.run().unwrap();
        mock.assert();
        assert_eq!(
            status_out.borrow_mut().pop(),
            Some(PipeValue::Value(Value::Int(200)))
        );
    }

    #[test]
    fn test_missing_base_url_is_an_error() {
        let mut action = HttpAction::new(None, "GET", false);
        assert!(matches!(action.run(), Err(ActionError::NoBaseUrl)));
    }
}
