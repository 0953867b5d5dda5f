//! Virtual-service lifecycle on a Virtual Service Environment (VSE).
//!
//! DevTest answers `200` with an empty body when basic-auth credentials are
//! rejected, so a bare 200 is treated as an authentication failure wherever
//! the success code is something else.

use std::path::{Path, PathBuf};

use reqwest::multipart::Form;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{DevTestClient, Reply};
use crate::endpoints::VIRTUAL_SERVICE_ACCEPT;
use crate::error::DevTestError;
use crate::run::{file_part, non_blank, non_blank_path};
use crate::Result;

const CREATE_ACCEPT: &str = "application/json";

/// Split a list of service names on commas and newlines, dropping blanks.
pub fn split_names(input: &str) -> Vec<String> {
    input
        .split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of undeploying one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndeployOutcome {
    Undeployed(String),
    NotFound(String),
}

/// Inputs for creating (and optionally deploying) a service from request/response pairs or API specs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateServiceRequest {
    pub vse: String,
    /// JSON document; `virtualService.name` names the service
    pub config: String,
    pub deploy: bool,
    /// Undeploy a running service with the same name first
    pub undeploy_first: bool,
    pub input_file1: Option<PathBuf>,
    pub input_file2: Option<PathBuf>,
    pub active_config: Option<PathBuf>,
    pub data_file: Option<PathBuf>,
    pub swagger_url: Option<String>,
    pub raml_url: Option<String>,
    pub wadl_url: Option<String>,
}

impl CreateServiceRequest {
    pub fn new(vse: &str, config: &str) -> Self {
        CreateServiceRequest {
            vse: vse.to_string(),
            config: config.to_string(),
            ..Default::default()
        }
    }

    /// `virtualService.name` from the config document.
    pub fn service_name(&self) -> Result<String> {
        let config: Value = serde_json::from_str(&self.config)
            .map_err(|e| DevTestError::InvalidInput(format!("config is not JSON: {e}")))?;
        config
            .get("virtualService")
            .and_then(|vs| vs.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                DevTestError::InvalidInput("config has no virtualService.name".to_string())
            })
    }

    async fn to_form(&self) -> Result<Form> {
        let mut form = Form::new()
            .text("config", self.config.clone())
            .text("deploy", self.deploy.to_string());

        let files = [
            ("inputFile1", &self.input_file1),
            ("inputFile2", &self.input_file2),
            ("activeConfig", &self.active_config),
            ("dataFile", &self.data_file),
        ];
        for (field, path) in files {
            if let Some(path) = non_blank_path(path) {
                form = form.part(field, file_part(&path).await?);
            }
        }

        let urls = [
            ("swaggerurl", &self.swagger_url),
            ("ramlurl", &self.raml_url),
            ("wadlurl", &self.wadl_url),
        ];
        for (field, url) in urls {
            if let Some(url) = non_blank(url) {
                form = form.text(field, url);
            }
        }
        Ok(form)
    }
}

/// Virtual-service operations against one registry.
pub struct VirtualServices<'a> {
    client: &'a DevTestClient,
}

impl<'a> VirtualServices<'a> {
    pub fn new(client: &'a DevTestClient) -> Self {
        VirtualServices { client }
    }

    /// Deploy each MAR in order, stopping at the first failure.
    ///
    /// Paths mentioning `file` or `http` are passed to the registry as a
    /// `fileURI`; anything else is uploaded from the local filesystem.
    pub async fn deploy_mar(&self, vse: &str, mar_paths: &[String]) -> Result<()> {
        require_vse(vse)?;
        let mar_paths: Vec<&str> = mar_paths
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        if mar_paths.is_empty() {
            return Err(DevTestError::InvalidInput("no MAR file to deploy".into()));
        }

        let url = self.client.endpoints().deploy_mar(vse);
        for mar in mar_paths {
            info!(vse, mar, "deploying MAR");
            let form = if is_remote_uri(mar) {
                Form::new().text("fileURI", mar.to_string())
            } else {
                Form::new().part("file", file_part(Path::new(mar)).await?)
            };
            let reply = self
                .client
                .post_multipart(&url, form, Some(VIRTUAL_SERVICE_ACCEPT))
                .await?;
            match reply.status {
                201 => info!(vse, mar, "MAR deployed"),
                _ => return Err(rejected(reply)),
            }
        }
        Ok(())
    }

    pub async fn start(&self, vse: &str, names: &[String]) -> Result<()> {
        self.act(vse, names, Action::Start).await
    }

    pub async fn stop(&self, vse: &str, names: &[String]) -> Result<()> {
        self.act(vse, names, Action::Stop).await
    }

    async fn act(&self, vse: &str, names: &[String], action: Action) -> Result<()> {
        require_vse(vse)?;
        let names = require_names(names)?;
        let endpoints = self.client.endpoints();
        for name in names {
            let url = match action {
                Action::Start => endpoints.start_vs(vse, name),
                Action::Stop => endpoints.stop_vs(vse, name),
            };
            let action = action.as_str();
            info!(vse, service = name, action, "virtual service action");
            let reply = self.client.post_empty(&url, VIRTUAL_SERVICE_ACCEPT).await?;
            match reply.status {
                200 if reply.body.trim().is_empty() => {
                    return Err(DevTestError::InvalidCredentials { url: reply.url })
                }
                200 => info!(vse, service = name, action, "virtual service action done"),
                _ => return Err(reply.into_unexpected()),
            }
        }
        Ok(())
    }

    /// Undeploy each service; a service that is not deployed is reported, not fatal.
    pub async fn undeploy(&self, vse: &str, names: &[String]) -> Result<Vec<UndeployOutcome>> {
        require_vse(vse)?;
        let names = require_names(names)?;
        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            outcomes.push(self.undeploy_one(vse, name).await?);
        }
        Ok(outcomes)
    }

    async fn undeploy_one(&self, vse: &str, name: &str) -> Result<UndeployOutcome> {
        let url = self.client.endpoints().undeploy_vs(vse, name);
        info!(vse, service = name, "undeploying virtual service");
        let reply = self.client.delete(&url, VIRTUAL_SERVICE_ACCEPT).await?;
        match reply.status {
            204 => Ok(UndeployOutcome::Undeployed(name.to_string())),
            404 => {
                warn!(vse, service = name, "virtual service not found");
                Ok(UndeployOutcome::NotFound(name.to_string()))
            }
            _ => Err(rejected(reply)),
        }
    }

    /// Create a service and deploy it when `request.deploy` is set.
    ///
    /// Returns the registry's response body.
    pub async fn create_and_deploy(&self, request: &CreateServiceRequest) -> Result<String> {
        require_vse(&request.vse)?;
        if request.config.trim().is_empty() {
            return Err(DevTestError::InvalidInput("config is empty".into()));
        }

        if request.undeploy_first {
            let name = request.service_name()?;
            info!(vse = %request.vse, service = %name, "undeploying before create");
            self.undeploy_one(&request.vse, &name).await?;
        }

        let url = self.client.endpoints().create_vs(&request.vse);
        let form = request.to_form().await?;
        info!(url = %url, deploy = request.deploy, "creating virtual service");
        let reply = self
            .client
            .post_multipart(&url, form, Some(CREATE_ACCEPT))
            .await?;
        Ok(reply.expect_status(200)?.body)
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Start,
    Stop,
}

impl Action {
    fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }
}

fn is_remote_uri(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.contains("file") || lower.contains("http")
}

fn require_vse(vse: &str) -> Result<()> {
    if vse.trim().is_empty() {
        return Err(DevTestError::InvalidInput("VSE name is empty".into()));
    }
    Ok(())
}

fn require_names(names: &[String]) -> Result<Vec<&str>> {
    let names: Vec<&str> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return Err(DevTestError::InvalidInput(
            "no virtual service name given".into(),
        ));
    }
    Ok(names)
}

/// 200 where another code means success is a credentials rejection.
fn rejected(reply: Reply) -> DevTestError {
    if reply.status == 200 {
        DevTestError::InvalidCredentials { url: reply.url }
    } else {
        reply.into_unexpected()
    }
}
