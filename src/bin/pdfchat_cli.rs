//! Command-line client for a running pdfchat server.
//!
//! One-shot subcommands map to single HTTP calls; `chat` runs a line-oriented loop that keeps
//! its uploads and history in a [`ChatSession`].
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pdfchat::session::{ChatSession, Role};
use reqwest::{Client, Response, multipart};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "pdfchat-cli", about = "Upload PDFs and ask questions about them")]
struct Cli {
    /// Base URL of the pdfchat server.
    #[arg(long, env = "PDFCHAT_URL", default_value = "http://localhost:8000")]
    server: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload one or more PDFs.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List stored documents.
    List,
    /// Delete a stored document.
    Delete { id: String },
    /// Ask a single question over the given documents.
    Ask {
        #[arg(long = "doc", required = true)]
        documents: Vec<String>,
        question: String,
    },
    /// Interactive chat; lines starting with `/` are commands.
    Chat {
        #[arg(long = "doc")]
        documents: Vec<String>,
    },
    /// Check server and language-model reachability.
    Health,
}

#[derive(Deserialize)]
struct UploadReply {
    document_id: String,
    filename: String,
}

#[derive(Deserialize)]
struct ListReply {
    documents: Vec<ListedDocument>,
}

#[derive(Deserialize)]
struct ListedDocument {
    id: String,
    filename: String,
    summary: String,
}

#[derive(Deserialize)]
struct QueryReply {
    response: String,
}

#[derive(Deserialize)]
struct HealthReply {
    status: String,
    backend_reachable: bool,
}

struct ServerClient {
    http: Client,
    base_url: String,
}

impl ServerClient {
    fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent("pdfchat-cli/0.1")
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn upload(&self, path: &Path) -> Result<UploadReply> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.pdf")
            .to_string();
        let part = multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(self.url("/documents/upload"))
            .multipart(form)
            .send()
            .await
            .context("upload request failed")?;
        decode(response).await
    }

    async fn list(&self) -> Result<ListReply> {
        let response = self
            .http
            .get(self.url("/documents/list"))
            .send()
            .await
            .context("list request failed")?;
        decode(response).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/documents/{id}")))
            .send()
            .await
            .context("delete request failed")?;
        decode::<Value>(response).await.map(|_| ())
    }

    async fn ask(&self, question: &str, document_ids: &[String]) -> Result<String> {
        let response = self
            .http
            .post(self.url("/chat/query"))
            .json(&json!({ "query": question, "document_ids": document_ids }))
            .send()
            .await
            .context("query request failed")?;
        decode::<QueryReply>(response).await.map(|reply| reply.response)
    }

    async fn health(&self) -> Result<HealthReply> {
        let response = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .context("health request failed")?;
        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no details");
        bail!("server returned {status}: {message}");
    }
    serde_json::from_value(body).context("unexpected response shape")
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = ServerClient::new(&cli.server)?;
    match cli.command {
        Command::Upload { files } => {
            for file in files {
                let reply = client.upload(&file).await?;
                println!("{}\t{}", reply.document_id, reply.filename);
            }
        }
        Command::List => {
            for document in client.list().await?.documents {
                println!("{}\t{}\t{}", document.id, document.filename, document.summary);
            }
        }
        Command::Delete { id } => {
            client.delete(&id).await?;
            println!("deleted {id}");
        }
        Command::Ask {
            documents,
            question,
        } => println!("{}", client.ask(&question, &documents).await?),
        Command::Chat { documents } => {
            let mut session = ChatSession::new();
            for id in documents {
                session.add_document(id.clone(), id);
            }
            chat(&client, &mut session).await?;
        }
        Command::Health => {
            let reply = client.health().await?;
            let backend = if reply.backend_reachable {
                "reachable"
            } else {
                "unreachable"
            };
            println!("server: {}, language model: {backend}", reply.status);
        }
    }
    Ok(())
}

const CHAT_USAGE: &str =
    "Type a question, or /upload PATH, /docs, /delete ID, /history, /clear, /quit";

/// One line of chat input.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Quit,
    Upload(&'a str),
    Docs,
    Delete(&'a str),
    History,
    Clear,
    Question(&'a str),
    Unknown(&'a str),
}

impl<'a> ChatInput<'a> {
    /// Classify a trimmed, non-empty line; anything starting with `/` is a command.
    fn parse(line: &'a str) -> Self {
        if !line.starts_with('/') {
            return Self::Question(line);
        }
        let (command, argument) = line.split_once(' ').unwrap_or((line, ""));
        let argument = argument.trim();
        match command {
            "/quit" => Self::Quit,
            "/upload" => Self::Upload(argument),
            "/docs" => Self::Docs,
            "/delete" => Self::Delete(argument),
            "/history" => Self::History,
            "/clear" => Self::Clear,
            other => Self::Unknown(other),
        }
    }
}

async fn chat(client: &ServerClient, session: &mut ChatSession) -> Result<()> {
    println!("{CHAT_USAGE}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match ChatInput::parse(line) {
            ChatInput::Quit => break,
            ChatInput::Upload(argument) => {
                let path = PathBuf::from(argument);
                let name = path.display().to_string();
                if session.has_document_named(&name) {
                    println!("{name} is already part of this session");
                    continue;
                }
                match client.upload(&path).await {
                    Ok(reply) => {
                        println!("uploaded {} as {}", reply.filename, reply.document_id);
                        session.add_document(reply.document_id, name);
                    }
                    Err(err) => eprintln!("upload failed: {err:#}"),
                }
            }
            ChatInput::Docs => {
                for document in session.documents() {
                    println!("{}\t{}", document.id, document.name);
                }
            }
            ChatInput::Delete(id) => match client.delete(id).await {
                Ok(()) => {
                    session.remove_document(id);
                    println!("deleted {id}");
                }
                Err(err) => eprintln!("delete failed: {err:#}"),
            },
            ChatInput::History => {
                for message in session.messages() {
                    let who = match message.role {
                        Role::User => "you",
                        Role::Assistant => "assistant",
                    };
                    println!("[{}] {who}: {}", message.timestamp.time(), message.content);
                }
            }
            ChatInput::Clear => session.clear_messages(),
            ChatInput::Unknown(command) => {
                println!("unknown command {command}");
                println!("{CHAT_USAGE}");
            }
            ChatInput::Question(question) => {
                if session.documents().is_empty() {
                    println!("Upload at least one PDF before asking questions");
                    continue;
                }
                session.push_message(Role::User, question);
                match client.ask(question, &session.document_ids()).await {
                    Ok(answer) => {
                        println!("{answer}");
                        session.push_message(Role::Assistant, answer);
                    }
                    Err(err) => {
                        let notice = format!("Could not answer: {err:#}");
                        eprintln!("{notice}");
                        session.push_message(Role::Assistant, notice);
                    }
                }
            }
        }
    }
    Ok(())
}
