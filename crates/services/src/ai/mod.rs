//! OpenAI-compatible chat completions, shared by the remote supplier and translator.

mod client;

pub use client::{ChatClient, strip_code_fences};
