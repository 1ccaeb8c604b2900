//! HTTP JSON client for an out-of-process compiler.
//!
//! Endpoints, all `POST` with a JSON body, relative to the base URL:
//!
//! | Path               | Body                                   | Answer             |
//! |--------------------|----------------------------------------|--------------------|
//! | `/process`         | `{"eq": text}`                         | `CompilerResponse` |
//! | `/add_function`    | `{"name", "argument", "content"}`      | `CompilerResponse` |
//! | `/add_variable`    | `{"name", "content"}`                  | `CompilerResponse` with `num` |
//! | `/delete_function` | `{"name"}`                             | empty              |
//! | `/delete_variable` | `{"name"}`                             | empty              |
//!
//! A rejected expression is answered with a non-success status and the error
//! message as plain text (or a JSON string).

use gcalc_core::Symbol;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::compiler::{CompileOutput, CompilerResponse, ExpressionCompiler, FunctionSignature};
use crate::error::CompilerError;

/// Default compiler address.
pub const DEFAULT_COMPILER_URL: &str = "http://127.0.0.1:7878";

#[derive(Debug, Clone)]
pub struct HttpCompiler {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCompiler {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpCompiler {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<String, CompilerError> {
        let endpoint = format!("{}/{}", self.base_url, path);
        tracing::trace!("POST {} {}", endpoint, body);

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| CompilerError::Transport(format!("{}: {}", endpoint, err)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| CompilerError::Transport(format!("response read failed: {}", err)))?;

        if status.is_success() {
            return Ok(text);
        }
        if status.is_server_error() {
            return Err(CompilerError::Transport(format!(
                "compiler failed ({}): {}",
                status, text
            )));
        }

        // Errors may arrive as a JSON string or as plain text.
        let message = serde_json::from_str::<String>(&text).unwrap_or(text);
        Err(CompilerError::from_message(message))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, CompilerError> {
        let text = self.post(path, body).await?;
        serde_json::from_str(&text).map_err(|err| {
            CompilerError::MalformedResponse(format!("{} response parse failed: {}", path, err))
        })
    }
}

impl ExpressionCompiler for HttpCompiler {
    async fn compile_relation(&self, text: &str) -> Result<CompileOutput, CompilerError> {
        let response: CompilerResponse = self.post_json("process", json!({ "eq": text })).await?;
        response.into_output()
    }

    async fn define_function(
        &self,
        signature: FunctionSignature,
        body: &str,
    ) -> Result<CompileOutput, CompilerError> {
        let response: CompilerResponse = self
            .post_json(
                "add_function",
                json!({
                    "name": signature.name,
                    "argument": signature.argument,
                    "content": body,
                }),
            )
            .await?;
        response.into_output()
    }

    async fn define_variable(&self, name: Symbol, body: &str) -> Result<f64, CompilerError> {
        let response: CompilerResponse = self
            .post_json("add_variable", json!({ "name": name, "content": body }))
            .await?;
        response.into_scalar()
    }

    async fn delete_function(&self, name: Symbol) -> Result<(), CompilerError> {
        self.post("delete_function", json!({ "name": name })).await?;
        Ok(())
    }

    async fn delete_variable(&self, name: Symbol) -> Result<(), CompilerError> {
        self.post("delete_variable", json!({ "name": name })).await?;
        Ok(())
    }
}
