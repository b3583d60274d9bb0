//! Chat-completions client and test invocation

mod client;
mod invoker;
mod types;

pub use client::OpenAiClient;
pub use invoker::{invoke, invoke_with, ChatTransport};
pub use types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, ResponseMessage, Role,
    TestResult, Usage,
};
