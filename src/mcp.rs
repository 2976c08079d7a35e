//! MCP server implementation using rmcp.
//!
//! Exposes the execution backend as a single `execute` tool. The tool's
//! text content is the JSON-encoded [`ExecutionResult`].

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::transport::stdio;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use crate::backend::{ExecutionBackend, ExecutionRequest, ExecutionResult};
use crate::config::Config;
use crate::language::Language;

/// MCP server for code execution.
#[derive(Clone)]
pub struct SandboxServer<B: Clone> {
    config: Arc<Config>,
    backend: Arc<B>,
    tool_router: ToolRouter<Self>,
}

/// Parameters for the execute tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteParams {
    /// Source code to build and run.
    #[schemars(description = "Source code to build (if needed) and run")]
    pub code: String,

    /// Language of the source.
    #[schemars(description = "Language of the source: 'cpp', 'python' or 'javascript'")]
    pub language: String,

    /// Optional standard input.
    #[schemars(description = "Text passed to the program on standard input")]
    #[serde(default)]
    pub input: Option<String>,
}

impl From<ExecuteParams> for ExecutionRequest {
    fn from(params: ExecuteParams) -> Self {
        Self {
            code: params.code,
            language: params.language,
            input: params.input,
        }
    }
}

#[tool_router]
impl<B: ExecutionBackend + Clone + Send + Sync + 'static> SandboxServer<B> {
    /// Create a new sandbox server.
    pub fn new(config: Arc<Config>, backend: B) -> Self {
        Self {
            config,
            backend: Arc::new(backend),
            tool_router: Self::tool_router(),
        }
    }

    /// Build and run code, returning `{success, output, error}` as JSON.
    #[tool(description = "Compile (if needed) and run a program, returning its output")]
    async fn execute(
        &self,
        Parameters(params): Parameters<ExecuteParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            language = %params.language,
            code_len = params.code.len(),
            has_input = params.input.is_some(),
            "Executing code"
        );

        let result: ExecutionResult = self.backend.execute(params.into()).await;
        let body = serde_json::to_string(&result).map_err(|e| {
            McpError::internal_error(format!("Failed to encode result: {e}"), None)
        })?;

        if result.success {
            Ok(CallToolResult::success(vec![Content::text(body)]))
        } else {
            Ok(CallToolResult::error(vec![Content::text(body)]))
        }
    }
}

#[tool_handler]
impl<B: ExecutionBackend + Clone + Send + Sync + 'static> ServerHandler for SandboxServer<B> {
    fn get_info(&self) -> ServerInfo {
        let languages: Vec<_> = Language::ALL.iter().map(|l| l.as_str()).collect();

        ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "arena-exec".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Compile and run short programs.\n\
                 Supported languages: {languages:?}\n\
                 Limits: build {}s, run {}s, output {} bytes\n\
                 \n\
                 Use the 'execute' tool with:\n\
                 - code: the program source\n\
                 - language: one of {languages:?}\n\
                 - input: optional standard input",
                self.config.build_timeout_seconds,
                self.config.run_timeout_seconds,
                self.config.output_limit_bytes,
            )),
        }
    }
}

/// Serve the sandbox server over stdio.
pub async fn serve_stdio<B: ExecutionBackend + Clone + Send + Sync + 'static>(
    config: Arc<Config>,
    backend: B,
) -> anyhow::Result<()> {
    let server = SandboxServer::new(config, backend);

    info!("Starting MCP server on stdio");

    let service = server
        .serve(stdio())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))?;

    service
        .waiting()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio_test::assert_ok;

    #[derive(Clone)]
    struct MockBackend;

    #[async_trait]
    impl ExecutionBackend for MockBackend {
        async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
            match request.language.parse::<Language>() {
                Ok(_) => ExecutionResult::success(format!(
                    "{}|{}",
                    request.code,
                    request.input.unwrap_or_default()
                )),
                Err(e) => ExecutionResult::failure(&e),
            }
        }
    }

    fn server() -> SandboxServer<MockBackend> {
        SandboxServer::new(Arc::new(Config::default()), MockBackend)
    }

    fn params(language: &str, code: &str, input: Option<&str>) -> Parameters<ExecuteParams> {
        Parameters(ExecuteParams {
            code: code.to_string(),
            language: language.to_string(),
            input: input.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_execute_success() {
        let result = assert_ok!(server().execute(params("python", "print(1)", Some("x"))).await);
        assert!(!result.is_error.unwrap_or(false));
    }

    #[tokio::test]
    async fn test_execute_unsupported_language_is_tool_error() {
        // Unsupported languages are a normal failed result, not a protocol error
        let result = assert_ok!(server().execute(params("ruby", "puts 1", None)).await);
        assert!(result.is_error.unwrap_or(false));
    }

    #[test]
    fn params_convert_to_request() {
        let Parameters(p) = params("cpp", "int main(){}", None);
        let request = ExecutionRequest::from(p);
        assert_eq!(request.language, "cpp");
        assert_eq!(request.code, "int main(){}");
        assert!(request.input.is_none());
    }

    #[test]
    fn params_input_defaults_to_none() {
        let p: ExecuteParams =
            serde_json::from_str(r#"{"code": "print(1)", "language": "python"}"#).unwrap();
        assert!(p.input.is_none());
    }

    #[test]
    fn info_lists_languages_and_limits() {
        let info = server().get_info();
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("\"cpp\""));
        assert!(instructions.contains("\"javascript\""));
        assert!(instructions.contains("run 10s"));
        assert!(instructions.contains("output 65536 bytes"));
    }
}
