use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, HOST};
use reqwest::redirect::Policy;
use serde_json::{json, Value};

use tenant_router::config::{load_config, RouterConfig};
use tenant_router::context::UserIdentity;
use tenant_router::dispatch::DispatchRequest;
use tenant_router::http::request::{
    X_USER_ID, X_USER_ORGANIZATION, X_USER_PERMISSIONS, X_USER_ROLES, X_USER_SUPER_ADMIN,
    X_USER_SUPPLIER,
};
use tenant_router::lifecycle::{build_dispatcher, build_registry};

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Operator tool for the tenant router", long_about = None)]
struct Cli {
    /// Configuration file; the built-in preset is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and list domains in resolution order
    Check,
    /// Resolve a hostname to its domain and tenant slug
    Resolve { hostname: String },
    /// Dry-run a full dispatch
    Dispatch {
        hostname: String,
        path: String,
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Send a request through a running router and show its answer
    Probe {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
        hostname: String,
        path: String,
        #[command(flatten)]
        identity: IdentityArgs,
    },
}

#[derive(Args)]
struct IdentityArgs {
    /// Signed-in user id; omit for an anonymous request
    #[arg(long)]
    user: Option<String>,
    #[arg(long, value_delimiter = ',')]
    roles: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    permissions: Vec<String>,
    #[arg(long)]
    super_admin: bool,
    #[arg(long)]
    supplier: bool,
    #[arg(long)]
    organization: Option<String>,
}

impl IdentityArgs {
    fn identity(&self) -> Option<UserIdentity> {
        let id = self.user.as_ref()?;
        let mut user = UserIdentity::new(id.as_str())
            .with_roles(self.roles.iter().cloned())
            .with_permissions(self.permissions.iter().cloned());
        if self.super_admin {
            user = user.super_admin();
        }
        if self.supplier {
            user = user.supplier();
        }
        if let Some(org) = &self.organization {
            user = user.member_of(org.as_str());
        }
        Some(user)
    }

    fn headers(&self) -> Result<HeaderMap, Box<dyn std::error::Error>> {
        let mut headers = HeaderMap::new();
        let Some(user) = self.identity() else {
            return Ok(headers);
        };
        headers.insert(X_USER_ID, HeaderValue::from_str(&user.id)?);
        let roles: Vec<&str> = user.roles.iter().map(String::as_str).collect();
        headers.insert(X_USER_ROLES, HeaderValue::from_str(&roles.join(","))?);
        let permissions: Vec<&str> = user.permissions.iter().map(String::as_str).collect();
        headers.insert(X_USER_PERMISSIONS, HeaderValue::from_str(&permissions.join(","))?);
        headers.insert(X_USER_SUPER_ADMIN, HeaderValue::from_static(flag(user.is_super_admin)));
        headers.insert(X_USER_SUPPLIER, HeaderValue::from_static(flag(user.is_supplier)));
        if let Some(org) = &user.organization_id {
            headers.insert(X_USER_ORGANIZATION, HeaderValue::from_str(org)?);
        }
        Ok(headers)
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    match cli.command {
        Commands::Check => {
            let registry = build_registry(&config)?;
            let domains: Vec<Value> = registry
                .domains()
                .iter()
                .map(|d| {
                    json!({
                        "id": d.id,
                        "hostname": d.hostname,
                        "routes": d.routes.len(),
                        "redirects": d.redirects.len(),
                        "guards": d.guards.names(),
                        "active": d.settings.active,
                    })
                })
                .collect();
            print_json(&json!({ "valid": true, "domains": domains }))?;
        }
        Commands::Resolve { hostname } => {
            let registry = build_registry(&config)?;
            match registry.resolve(&hostname) {
                Ok(domain) => {
                    let slug = if domain.settings.is_dynamic_subdomain {
                        domain.tenant_slug(&hostname)
                    } else {
                        None
                    };
                    print_json(&json!({ "domain": domain.id, "slug": slug }))?;
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Dispatch {
            hostname,
            path,
            identity,
        } => {
            let dispatcher = build_dispatcher(&config)?;
            let request = DispatchRequest {
                hostname,
                pathname: path,
                user: identity.identity(),
                organization: None,
            };
            let outcome = dispatcher.dispatch(&request).await;
            print_json(&serde_json::to_value(&outcome)?)?;
        }
        Commands::Probe {
            url,
            hostname,
            path,
            identity,
        } => {
            let client = reqwest::Client::builder()
                .redirect(Policy::none())
                .build()?;
            let mut headers = identity.headers()?;
            headers.insert(HOST, HeaderValue::from_str(&hostname)?);

            let res = client
                .get(format!("{}{}", url.trim_end_matches('/'), path))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let location = res
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = res.text().await?;
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::String(body));

    print_json(&json!({
        "status": status.as_u16(),
        "location": location,
        "body": body,
    }))
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
