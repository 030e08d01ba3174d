use std::path::Path;
use std::sync::Arc;

use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool, ToolsCapability,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use memory_bank::analysis::ProjectAnalyzer;
use memory_bank::config::BankConfig;
use memory_bank::error::{MemoryBankError, Result};
use memory_bank::memory::{
    ConflictPlanner, InteractiveResolver, MemoryBankValidator, ResolutionSession, StdFs,
    SyncReconciler,
};

#[derive(Clone, Default)]
pub struct McpServer {
    fs: StdFs,
}

impl McpServer {
    pub fn new() -> Self {
        Self { fs: StdFs }
    }

    fn config_for(params: &ProjectParams) -> Result<BankConfig> {
        let mut config = BankConfig::load(Path::new(&params.path))?;
        if let Some(ref docs_dir) = params.docs_dir {
            config = config.with_docs_dir(docs_dir.clone());
        }
        if let Some(ref index_path) = params.index_path {
            config = config.with_index_path(index_path.clone());
        }
        Ok(config)
    }

    fn analyze_project_impl(&self, params: &ProjectParams) -> Result<String> {
        let config = Self::config_for(params)?;
        let result = ProjectAnalyzer::new(&config).analyze(Path::new(&params.path))?;
        Ok(serde_json::to_string_pretty(&result)?)
    }

    fn validate_memory_bank_impl(&self, params: &ProjectParams) -> Result<String> {
        let config = Self::config_for(params)?;
        let report = MemoryBankValidator::new(&self.fs, &config).validate(Path::new(&params.path))?;
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Report, conflict and the planned actions.
    fn check_sync_impl(&self, params: &ProjectParams) -> Result<String> {
        let config = Self::config_for(params)?;
        let snapshot = SyncReconciler::new(&config).check(&self.fs, Path::new(&params.path))?;
        let output = serde_json::json!({
            "actions": ConflictPlanner::new(&config).plan_snapshot(&snapshot),
            "report": snapshot.report,
            "conflict": snapshot.conflict,
        });
        Ok(serde_json::to_string_pretty(&output)?)
    }

    fn resolve_step_impl(&self, params: ResolveStepParams) -> Result<String> {
        let config = Self::config_for(&params.project)?;
        let root = Path::new(&params.project.path);
        let resolver = InteractiveResolver::new(&self.fs, &config, root);

        let session = match params.session {
            None => {
                let snapshot = SyncReconciler::new(&config).check(&self.fs, root)?;
                resolver.start(ConflictPlanner::new(&config).plan_snapshot(&snapshot))?
            }
            Some(session) => {
                let mut session: ResolutionSession = serde_json::from_value(session)?;
                if params.abort.unwrap_or(false) {
                    resolver.abort(&mut session, params.answer.as_deref())?;
                } else {
                    let answer = params.answer.as_deref().ok_or_else(|| {
                        MemoryBankError::Mcp("answer is required to continue a session".to_string())
                    })?;
                    resolver.respond(&mut session, answer)?;
                }
                session
            }
        };

        let result = if session.state.is_terminal() {
            Some(resolver.finish(&session)?)
        } else {
            None
        };

        let output = serde_json::json!({
            "session": session,
            "pendingOptions": session.pending_options(),
            "result": result,
        });
        Ok(serde_json::to_string_pretty(&output)?)
    }
}

fn schema_for<T: JsonSchema>() -> Arc<serde_json::Map<String, serde_json::Value>> {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(&schema) {
        Ok(serde_json::Value::Object(map)) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    }
}

fn tool(
    name: &'static str,
    title: &str,
    description: &'static str,
    input_schema: Arc<serde_json::Map<String, serde_json::Value>>,
) -> Tool {
    Tool {
        name: name.into(),
        title: Some(title.to_string()),
        description: Some(description.into()),
        input_schema,
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

fn parse_params<T: for<'de> Deserialize<'de>>(
    arguments: Option<serde_json::Map<String, serde_json::Value>>,
) -> std::result::Result<T, McpError> {
    serde_json::from_value(serde_json::Value::Object(arguments.unwrap_or_default()))
        .map_err(|e| McpError::invalid_params(e.to_string(), None))
}

/// Failures become tool errors carrying the tagged failure report.
fn tool_result(result: Result<String>, path: &str) -> CallToolResult {
    match result {
        Ok(json) => CallToolResult::success(vec![Content::text(json)]),
        Err(e) => {
            tracing::warn!("Tool call failed for {}: {}", path, e);
            let report = serde_json::to_string_pretty(&e.failure(Some(path)))
                .unwrap_or_else(|_| e.to_string());
            CallToolResult::error(vec![Content::text(report)])
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProjectParams {
    /// Project root
    pub path: String,
    /// Memory bank directory relative to the project root (default: memory-bank)
    #[serde(default)]
    pub docs_dir: Option<String>,
    /// Index document relative to the project root (default: .github/copilot-instructions.md)
    #[serde(default)]
    pub index_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ResolveStepParams {
    #[serde(flatten)]
    pub project: ProjectParams,
    /// Session returned by the previous call; omit to start a new resolution
    #[serde(default)]
    pub session: Option<serde_json::Value>,
    /// Answer to the pending question (option name, its number, yes or no)
    #[serde(default)]
    pub answer: Option<String>,
    /// Abort the session instead of answering; `answer` becomes the reason
    #[serde(default)]
    pub abort: Option<bool>,
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "memory-bank".to_string(),
                title: Some("Memory Bank".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Analyzes TypeScript/JavaScript projects and keeps the memory bank \
                 documents in sync with the index document."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        let tools = vec![
            tool(
                "analyze_project",
                "Analyze Project",
                "Source facts, patterns, complexity and suggested memory bank documents",
                schema_for::<ProjectParams>(),
            ),
            tool(
                "validate_memory_bank",
                "Validate Memory Bank",
                "Check core documents, index presence and folder organization",
                schema_for::<ProjectParams>(),
            ),
            tool(
                "check_sync",
                "Check Sync",
                "Compare memory bank documents with index references and plan corrective actions",
                schema_for::<ProjectParams>(),
            ),
            tool(
                "resolve_step",
                "Resolve Step",
                "Start or continue an interactive resolution; pass back the returned session",
                schema_for::<ResolveStepParams>(),
            ),
        ];

        Ok(ListToolsResult {
            next_cursor: None,
            tools,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let result = match request.name.as_ref() {
            "analyze_project" => {
                let params: ProjectParams = parse_params(request.arguments)?;
                tool_result(self.analyze_project_impl(&params), &params.path)
            }
            "validate_memory_bank" => {
                let params: ProjectParams = parse_params(request.arguments)?;
                tool_result(self.validate_memory_bank_impl(&params), &params.path)
            }
            "check_sync" => {
                let params: ProjectParams = parse_params(request.arguments)?;
                tool_result(self.check_sync_impl(&params), &params.path)
            }
            "resolve_step" => {
                let params: ResolveStepParams = parse_params(request.arguments)?;
                let path = params.project.path.clone();
                tool_result(self.resolve_step_impl(params), &path)
            }
            _ => {
                return Err(McpError::invalid_params(
                    format!("Unknown tool: {}", request.name),
                    None,
                ));
            }
        };

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(dir: &TempDir) -> ProjectParams {
        ProjectParams {
            path: dir.path().to_string_lossy().to_string(),
            docs_dir: None,
            index_path: None,
        }
    }

    #[test]
    fn test_schema_has_properties() {
        let schema = schema_for::<ResolveStepParams>();
        let properties = schema.get("properties").and_then(|p| p.as_object()).unwrap();
        assert!(properties.contains_key("path"));
        assert!(properties.contains_key("session"));
    }

    #[test]
    fn test_check_sync_reports_missing_bank() {
        let temp_dir = TempDir::new().unwrap();
        let server = McpServer::new();

        let json = server.check_sync_impl(&project(&temp_dir)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["report"]["isInSync"], true);
        assert_eq!(value["conflict"]["kind"], "structure-mismatch");
        let actions = value["actions"].as_array().unwrap();
        assert_eq!(actions.last().unwrap()["actionType"], "update-structure");
    }

    #[test]
    fn test_resolve_step_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let bank = temp_dir.path().join("memory-bank");
        std::fs::create_dir_all(&bank).unwrap();
        std::fs::write(bank.join("projectbrief.md"), "# Brief\n").unwrap();

        let server = McpServer::new();
        let started = server
            .resolve_step_impl(ResolveStepParams {
                project: project(&temp_dir),
                session: None,
                answer: None,
                abort: None,
            })
            .unwrap();
        let started: serde_json::Value = serde_json::from_str(&started).unwrap();
        assert_eq!(started["session"]["state"], "awaiting-response");
        assert!(started["result"].is_null());

        let continued = server
            .resolve_step_impl(ResolveStepParams {
                project: project(&temp_dir),
                session: Some(started["session"].clone()),
                answer: Some("yes".to_string()),
                abort: None,
            })
            .unwrap();
        let continued: serde_json::Value = serde_json::from_str(&continued).unwrap();
        assert_eq!(continued["session"]["state"], "completed");
        assert_eq!(continued["result"]["actionsPerformed"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_step_requires_answer() {
        let temp_dir = TempDir::new().unwrap();
        let bank = temp_dir.path().join("memory-bank");
        std::fs::create_dir_all(&bank).unwrap();
        std::fs::write(bank.join("projectbrief.md"), "# Brief\n").unwrap();

        let server = McpServer::new();
        let started = server
            .resolve_step_impl(ResolveStepParams {
                project: project(&temp_dir),
                session: None,
                answer: None,
                abort: None,
            })
            .unwrap();
        let started: serde_json::Value = serde_json::from_str(&started).unwrap();

        let result = server.resolve_step_impl(ResolveStepParams {
            project: project(&temp_dir),
            session: Some(started["session"].clone()),
            answer: None,
            abort: None,
        });
        assert!(matches!(result, Err(MemoryBankError::Mcp(_))));
    }
}
