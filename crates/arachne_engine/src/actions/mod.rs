//! The concrete action library.
//!
//! Each module defines one action struct, its port-name constants, a plain
//! constructor, and a `from_template` factory used by the registry.

pub mod const_action;
pub mod cookie_join;
pub mod field_join;
pub mod http;
pub mod jsonpath;
pub mod string_cut;
pub mod task_promise;
pub mod url_join;
pub mod utf8;
pub mod xpath;

pub use const_action::ConstAction;
pub use cookie_join::HttpCookieJoinAction;
pub use field_join::FieldJoinAction;
pub use http::HttpAction;
pub use jsonpath::JsonPathAction;
pub use string_cut::StringCutAction;
pub use task_promise::TaskPromiseAction;
pub use url_join::UrlJoinAction;
pub use utf8::{Utf8DecodeAction, Utf8EncodeAction};
pub use xpath::XPathAction;
