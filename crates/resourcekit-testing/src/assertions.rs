//! Custom assertions for resource testing.
//!
//! These helpers make it easier to check replies produced by the serve
//! loop or by [`Server::dispatch`](resourcekit_server::Server::dispatch).

use resourcekit_core::protocol::Reply;
use resourcekit_core::types::{
    ListResourceTemplatesResult, ListResourcesResult, ReadResourceResult,
};
use serde_json::Value;

fn success_value(reply: &Reply) -> &Value {
    if let Some(error) = &reply.error {
        panic!(
            "Expected successful reply, but got error {}: {}",
            error.code, error.message
        );
    }
    reply
        .result
        .as_ref()
        .unwrap_or_else(|| panic!("Reply has neither result nor error"))
}

/// Decode a successful `resources/read` reply.
///
/// # Panics
///
/// Panics if the reply is an error or the result has the wrong shape.
#[must_use]
pub fn read_result(reply: &Reply) -> ReadResourceResult {
    serde_json::from_value(success_value(reply).clone())
        .unwrap_or_else(|e| panic!("Reply is not a read result: {e}"))
}

/// Decode a successful `resources/list` reply.
///
/// # Panics
///
/// Panics if the reply is an error or the result has the wrong shape.
#[must_use]
pub fn list_result(reply: &Reply) -> ListResourcesResult {
    serde_json::from_value(success_value(reply).clone())
        .unwrap_or_else(|e| panic!("Reply is not a resource list: {e}"))
}

/// Decode a successful `resources/templates/list` reply.
///
/// # Panics
///
/// Panics if the reply is an error or the result has the wrong shape.
#[must_use]
pub fn template_list_result(reply: &Reply) -> ListResourceTemplatesResult {
    serde_json::from_value(success_value(reply).clone())
        .unwrap_or_else(|e| panic!("Reply is not a template list: {e}"))
}

/// Assert that a read reply succeeded and its text contains `expected_text`.
///
/// # Panics
///
/// Panics if the reply is an error, has no text contents, or the text
/// does not contain the expected string.
pub fn assert_text_contents(reply: &Reply, expected_text: &str) {
    let result = read_result(reply);
    assert!(!result.contents.is_empty(), "Read result has no contents");

    let text = result
        .contents
        .iter()
        .filter_map(|c| c.as_text())
        .collect::<String>();

    assert!(
        text.contains(expected_text),
        "Expected contents to contain '{expected_text}', but got '{text}'"
    );
}

/// Assert that a reply is an error with the given code.
///
/// # Panics
///
/// Panics if the reply succeeded or carries a different code.
pub fn assert_error_code(reply: &Reply, expected_code: i32) {
    let Some(error) = &reply.error else {
        panic!("Expected error {expected_code}, but got success");
    };
    assert_eq!(
        error.code, expected_code,
        "Expected error code {expected_code}, but got {} ({})",
        error.code, error.message
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use resourcekit_core::error::{Error, codes};
    use resourcekit_core::protocol::RequestId;
    use resourcekit_core::types::ResourceContents;

    fn read_reply(text: &str) -> Reply {
        let result = ReadResourceResult {
            contents: vec![ResourceContents::text("config://settings", text)],
        };
        Reply::success(RequestId::Number(1), serde_json::to_value(result).unwrap())
    }

    #[test]
    fn test_assert_text_contents() {
        assert_text_contents(&read_reply("debug=true"), "debug");
    }

    #[test]
    #[should_panic(expected = "Expected contents to contain")]
    fn test_assert_text_contents_mismatch() {
        assert_text_contents(&read_reply("debug=true"), "verbose");
    }

    #[test]
    fn test_assert_error_code() {
        let reply = Reply::error(Some(RequestId::Number(1)), Error::no_match("x://y"));
        assert_error_code(&reply, codes::RESOURCE_NOT_FOUND);
    }

    #[test]
    #[should_panic(expected = "but got success")]
    fn test_assert_error_code_on_success() {
        assert_error_code(&read_reply("ok"), codes::RESOURCE_NOT_FOUND);
    }
}
