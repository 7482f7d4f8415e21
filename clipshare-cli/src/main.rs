use std::time::Duration;

use chrono::SubsecRound;
use clap::{Parser, Subcommand};
use clipshare_api_structs::{ClipCreated, ClipView, CreateClip, ErrorBody};
use reqwest::{StatusCode, Url};
use thiserror::Error as ThisError;
use tokio::io::AsyncReadExt;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const PASSWORD_HEADER: &str = "x-clip-password";

#[derive(ThisError, Debug)]
enum Error {
    #[error("An HTTP error occurred: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Unable to parse clipshare server URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Unable to read the clip: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to serialize request to valid JSON: {0}")]
    Json(#[from] serde_json::error::Error),
    #[error("The server refused the request ({status}): {message}")]
    Server { status: StatusCode, message: String },
}

/// Command-line interface for the clipshare service
///
/// This supports sharing text and reading shared clips.
#[derive(clap::Parser, Debug)]
#[command(name = "clipshare")]
#[command(about = "Share text snippets through a clipshare server", long_about = None)]
struct Cli {
    #[arg(long, env = "CLIPSHARE_URL")]
    url: Url,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Share a new clip
    Create {
        /// The text to share; read from stdin when omitted
        #[arg()]
        content: Option<String>,
        /// Require a password to read the clip
        #[arg(long, requires = "password")]
        private: bool,
        /// The password for a private clip
        #[arg(long, env = "CLIPSHARE_PASSWORD")]
        password: Option<String>,
        /// Use this slug rather than a random one
        #[arg(long)]
        slug: Option<String>,
        /// How long the clip lives: "never", or hours or days such as "1h" or "7d"
        #[arg(long, default_value = "never")]
        expires_in: String,
        /// Delete the clip once it has been read
        #[arg(long)]
        destroy_on_view: bool,
    },
    /// Read a clip
    Get {
        /// The clip's slug
        #[arg()]
        slug: String,
        /// The password, if the clip is private
        #[arg(long, env = "CLIPSHARE_PASSWORD")]
        password: Option<String>,
        /// Show the clip's metadata rather than only its content
        #[arg(long)]
        details: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let opts = Cli::parse();
    match process_command(opts).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
}

async fn process_command(opts: Cli) -> Result<(), Error> {
    let client = reqwest::ClientBuilder::new()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()?;

    match opts.command {
        Command::Create {
            content,
            private,
            password,
            slug,
            expires_in,
            destroy_on_view,
        } => {
            let content = match content {
                Some(content) => content,
                None => {
                    let mut content = String::new();
                    tokio::io::stdin().read_to_string(&mut content).await?;
                    content
                }
            };
            let url = api_url(&opts.url, "api/clips")?;
            let response = client
                .post(url)
                .json(&CreateClip {
                    content,
                    is_private: private,
                    password,
                    custom_slug: slug,
                    expires_in: Some(expires_in),
                    destroy_on_view,
                })
                .send()
                .await?;
            let created = check(response).await?.json::<ClipCreated>().await?;
            println!("{}", api_url(&opts.url, &format!("api/clips/{}", created.slug))?);
            println!("{}", serde_json::to_string_pretty(&created)?);
            Ok(())
        }
        Command::Get {
            slug,
            password,
            details,
        } => {
            let url = api_url(&opts.url, &format!("api/clips/{}", slug))?;
            let mut request = client.get(url);
            if let Some(password) = password {
                request = request.header(PASSWORD_HEADER, password);
            }
            let clip = check(request.send().await?)
                .await?
                .json::<ClipView>()
                .await?;
            if details {
                display_clip(&clip);
            } else {
                print!("{}", clip.content);
            }
            Ok(())
        }
    }
}

/// Resolve an API path under the server URL, keeping any path prefix the server lives under.
fn api_url(base: &Url, path: &str) -> Result<Url, Error> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    Ok(base.join(path)?)
}

/// Turn a non-2xx response into an error carrying the server's explanation.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    Err(Error::Server { status, message })
}

fn display_clip(clip: &ClipView) {
    let mut table = prettytable::Table::new();
    table.add_row(prettytable::Row::new(vec![
        prettytable::Cell::new("Slug").with_style(prettytable::Attr::Bold),
        prettytable::Cell::new("Created").with_style(prettytable::Attr::Bold),
        prettytable::Cell::new("Expires").with_style(prettytable::Attr::Bold),
        prettytable::Cell::new("Private").with_style(prettytable::Attr::Bold),
        prettytable::Cell::new("Views").with_style(prettytable::Attr::Bold),
        prettytable::Cell::new("Content").with_style(prettytable::Attr::Bold),
    ]));
    table.add_row(prettytable::Row::new(vec![
        prettytable::Cell::new(&clip.slug),
        prettytable::Cell::new(clip.created_at.trunc_subsecs(0).to_string().as_str()),
        prettytable::Cell::new(
            clip.expires_at
                .map(|e| e.trunc_subsecs(0).to_string())
                .unwrap_or_else(|| "never".to_string())
                .as_str(),
        ),
        prettytable::Cell::new(clip.is_private.to_string().as_str()),
        prettytable::Cell::new(clip.views.to_string().as_str()),
        prettytable::Cell::new(
            clip.content
                .chars()
                .take(64)
                .collect::<String>()
                .as_str(),
        ),
    ]));

    table.printstd();
}
