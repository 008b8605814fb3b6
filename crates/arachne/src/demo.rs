//! Built-in demo workflow: fetch a news listing page, extract story titles
//! and links, and join them into items.

use arachne_protocol::{ActionTemplate, DataPipeTemplate, TaskTemplate, Value, Workflow};
use std::collections::HashMap;

pub const DEFAULT_BASE_URL: &str = "https://news.ycombinator.com/";

/// Two-task workflow: `GetHTML` fetches and decodes the listing, then
/// promises `ParseHTML`, which extracts story titles and links and joins
/// them into `story` items.
pub fn demo_workflow(base_url: &str) -> Workflow {
    Workflow {
        name: "news_stories".to_string(),
        version: "v1".to_string(),
        task_templates: vec![
            TaskTemplate {
                task_name: "GetHTML".to_string(),
                initial: true,
                action_templates: vec![
                    ActionTemplate {
                        name: "FetchFront".to_string(),
                        struct_name: "HTTPAction".to_string(),
                        constructor_params: HashMap::from([
                            ("baseURL".to_string(), Value::Str(base_url.to_string())),
                            ("method".to_string(), Value::Str("GET".into())),
                            ("canFail".to_string(), Value::Bool(false)),
                        ]),
                    },
                    ActionTemplate {
                        name: "DecodeBody".to_string(),
                        struct_name: "UTF8DecodeAction".to_string(),
                        constructor_params: HashMap::new(),
                    },
                    ActionTemplate {
                        name: "PromiseParse".to_string(),
                        struct_name: "TaskPromiseAction".to_string(),
                        constructor_params: HashMap::from([
                            (
                                "inputNames".to_string(),
                                Value::Strings(vec![
                                    "htmlStr1".to_string(),
                                    "htmlStr2".to_string(),
                                ]),
                            ),
                            ("taskName".to_string(), Value::Str("ParseHTML".into())),
                        ]),
                    },
                ],
                data_pipe_templates: vec![
                    DataPipeTemplate {
                        source_action_name: Some("FetchFront".into()),
                        source_output_name: Some("body".into()),
                        dest_action_name: Some("DecodeBody".into()),
                        dest_input_name: Some("bytes".into()),
                        ..Default::default()
                    },
                    DataPipeTemplate {
                        source_action_name: Some("DecodeBody".into()),
                        source_output_name: Some("str".into()),
                        dest_action_name: Some("PromiseParse".into()),
                        dest_input_name: Some("htmlStr1".into()),
                        ..Default::default()
                    },
                    DataPipeTemplate {
                        source_action_name: Some("DecodeBody".into()),
                        source_output_name: Some("str".into()),
                        dest_action_name: Some("PromiseParse".into()),
                        dest_input_name: Some("htmlStr2".into()),
                        ..Default::default()
                    },
                    DataPipeTemplate {
                        source_action_name: Some("PromiseParse".into()),
                        source_output_name: Some("promise".into()),
                        task_output_name: Some("promise".into()),
                        ..Default::default()
                    },
                ],
            },
            TaskTemplate {
                task_name: "ParseHTML".to_string(),
                initial: false,
                action_templates: vec![
                    ActionTemplate {
                        name: "ExtractTitles".to_string(),
                        struct_name: "XPathAction".to_string(),
                        constructor_params: HashMap::from([
                            (
                                "xpath".to_string(),
                                Value::Str("//a[@class='storylink']/text()".into()),
                            ),
                            ("expectMany".to_string(), Value::Bool(true)),
                        ]),
                    },
                    ActionTemplate {
                        name: "ExtractLinks".to_string(),
                        struct_name: "XPathAction".to_string(),
                        constructor_params: HashMap::from([
                            (
                                "xpath".to_string(),
                                Value::Str("//a[@class='storylink']/@href".into()),
                            ),
                            ("expectMany".to_string(), Value::Bool(true)),
                        ]),
                    },
                    ActionTemplate {
                        name: "YieldStory".to_string(),
                        struct_name: "FieldJoinAction".to_string(),
                        constructor_params: HashMap::from([
                            (
                                "inputNames".to_string(),
                                Value::Strings(vec!["title".to_string(), "link".to_string()]),
                            ),
                            ("itemName".to_string(), Value::Str("story".into())),
                        ]),
                    },
                ],
                data_pipe_templates: vec![
                    DataPipeTemplate {
                        task_input_name: Some("htmlStr1".into()),
                        dest_action_name: Some("ExtractTitles".into()),
                        dest_input_name: Some("htmlStr".into()),
                        ..Default::default()
                    },
                    DataPipeTemplate {
                        task_input_name: Some("htmlStr2".into()),
                        dest_action_name: Some("ExtractLinks".into()),
                        dest_input_name: Some("htmlStr".into()),
                        ..Default::default()
                    },
                    DataPipeTemplate {
                        source_action_name: Some("ExtractTitles".into()),
                        source_output_name: Some("str".into()),
                        dest_action_name: Some("YieldStory".into()),
                        dest_input_name: Some("title".into()),
                        ..Default::default()
                    },
                    DataPipeTemplate {
                        source_action_name: Some("ExtractLinks".into()),
                        source_output_name: Some("str".into()),
                        dest_action_name: Some("YieldStory".into()),
                        dest_input_name: Some("link".into()),
                        ..Default::default()
                    },
                    DataPipeTemplate {
                        source_action_name: Some("YieldStory".into()),
                        source_output_name: Some("item".into()),
                        task_output_name: Some("items".into()),
                        ..Default::default()
                    },
                ],
            },
        ],
    }
}
