//!
//! adoption-portal CLI
//! --------------------
//! Runs the portal startup sequence against a backend (profile verification, reference
//! data, readiness) or performs a single authenticated call and prints the response.

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use adoption_portal::cli::print_response;
use adoption_portal::http::{Method, RequestDescriptor};
use adoption_portal::identity::{Account, StaticTokenProvider};
use adoption_portal::session::{TracingNavigator, TracingNotices};
use adoption_portal::{Portal, PortalConfig};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--base-url <url>] [--token <jwt>] [--user <email>]                 # startup check\n  {program} [--base-url <url>] [--token <jwt>] --get <path>\n  {program} [--base-url <url>] [--token <jwt>] --post <path> [--body <json>]\n  {program} [--base-url <url>] [--token <jwt>] --put <path> [--body <json>]\n  {program} [--base-url <url>] [--token <jwt>] --delete <path>\n\nEnvironment:\n  PORTAL_API_BASE_URL   backend base URL (default http://localhost:8080)\n  PORTAL_ID_TOKEN       bearer token used when --token is not given\n  PORTAL_OUTPUT=json    always print raw JSON\n  RUST_LOG              log filter (default info)"
    );
}

struct Args {
    base_url: Option<String>,
    token: Option<String>,
    user: Option<String>,
    call: Option<(Method, String)>,
    body: Option<String>,
}

fn parse_args(program: &str, mut args: Vec<String>) -> Result<Args> {
    let mut out = Args { base_url: None, token: None, user: None, call: None, body: None };
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].clone();
        let mut value = || -> Result<String> {
            if i + 1 >= args.len() {
                print_usage(program);
                return Err(anyhow!("{} requires a value", flag));
            }
            Ok(std::mem::take(&mut args[i + 1]))
        };
        match flag.as_str() {
            "--base-url" => out.base_url = Some(value()?),
            "--token" => out.token = Some(value()?),
            "--user" => out.user = Some(value()?),
            "--body" => out.body = Some(value()?),
            "--get" => out.call = Some((Method::Get, value()?)),
            "--post" => out.call = Some((Method::Post, value()?)),
            "--put" => out.call = Some((Method::Put, value()?)),
            "--delete" => out.call = Some((Method::Delete, value()?)),
            "-h" | "--help" => {
                print_usage(program);
                std::process::exit(0);
            }
            other => {
                print_usage(program);
                return Err(anyhow!("unknown argument '{}'", other));
            }
        }
        i += 2;
    }
    Ok(out)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let mut argv: Vec<String> = env::args().collect();
    let program = argv.remove(0);
    let args = parse_args(&program, argv)?;

    let mut config = PortalConfig::from_env();
    if let Some(base) = args.base_url {
        config = config.with_base_url(base);
    }

    let provider = Arc::new(StaticTokenProvider::default());
    if let Some(token) = args.token.or_else(|| env::var("PORTAL_ID_TOKEN").ok()).filter(|t| !t.is_empty()) {
        let user = args.user.unwrap_or_else(|| "cli@localhost".to_string());
        provider.sign_in(Account::new(user.clone(), user), token);
    }

    info!(target: "adoption_portal::app", base_url = %config.api_base_url, "adoption-portal starting");
    let portal = Portal::from_config(config, provider, Arc::new(TracingNotices), Arc::new(TracingNavigator))
        .context("while building portal")?;

    if let Some((method, path)) = args.call {
        let mut req = RequestDescriptor::new(method, path);
        if let Some(body) = args.body {
            let v: Value = serde_json::from_str(&body).context("--body is not valid JSON")?;
            req = req.with_body(v);
        }
        let val = portal.executor.execute(req).await?;
        print_response(&val);
        return Ok(());
    }

    let ready = portal.start().await;
    let snapshot = portal.verifier.snapshot();
    println!("phase:         {:?}", snapshot.phase);
    if let Some(p) = &snapshot.profile {
        println!("user:          {} <{}> role={}", p.display_name, p.email, p.role);
    }
    if let Some(e) = &snapshot.error {
        println!("profile error: {}", e);
    }
    println!("collaborator:  {}", portal.is_collaborator());
    let communes = portal.communes.snapshot();
    println!("communes:      {}{}", communes.data.len(), communes.error.map(|e| format!(" (error: {})", e)).unwrap_or_default());
    println!("readiness:     {:?}", portal.readiness_state());
    println!("ready:         {}", ready);
    Ok(())
}
