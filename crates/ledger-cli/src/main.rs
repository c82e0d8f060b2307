use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ledger_core::Block;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for a ledger node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct Node {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, env = "LEDGER_NODE", default_value = "http://127.0.0.1:8080")]
    node: String,
}

impl Node {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.node.trim_end_matches('/'))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the node's whole chain
    Blocks(Node),
    /// Print the node's latest block
    Latest(Node),
    /// Mine a block carrying DATA on the node
    Mine {
        #[command(flatten)]
        node: Node,
        /// Block payload
        #[arg(long)]
        data: String,
    },
    /// List the node's peers
    Peers(Node),
    /// Connect the node to another peer
    AddPeer {
        #[command(flatten)]
        node: Node,
        /// Peer base URL
        #[arg(long)]
        url: String,
    },
}

#[derive(Serialize)]
struct MineRequest {
    data: String,
}

#[derive(Serialize)]
struct PeerRequest {
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    match cli.cmd {
        Command::Blocks(node) => {
            let chain: Vec<Block> = get(&client, &node.url("/blocks")).await?;
            for block in &chain {
                println!("{block}");
            }
            println!("height: {}", chain.len().saturating_sub(1));
        }
        Command::Latest(node) => {
            let block: Block = get(&client, &node.url("/blocks/latest")).await?;
            print_json(&block)?;
        }
        Command::Mine { node, data } => {
            let res = client
                .post(node.url("/mine"))
                .json(&MineRequest { data })
                .send()
                .await
                .with_context(|| format!("reaching {}", node.node))?;
            let block: Block = decode(res).await?;
            println!("mined {block}");
        }
        Command::Peers(node) => {
            let peers: Vec<String> = get(&client, &node.url("/peers")).await?;
            for peer in peers {
                println!("{peer}");
            }
        }
        Command::AddPeer { node, url } => {
            let res = client
                .post(node.url("/peers"))
                .json(&PeerRequest { url })
                .send()
                .await
                .with_context(|| format!("reaching {}", node.node))?;
            let peers: Vec<String> = decode(res).await?;
            println!("peers: {}", peers.join(", "));
        }
    }
    Ok(())
}

async fn get<T: serde::de::DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T> {
    debug!("GET {url}");
    let res = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("reaching {url}"))?;
    decode(res).await
}

async fn decode<T: serde::de::DeserializeOwned>(res: reqwest::Response) -> Result<T> {
    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        let reason = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["error"].as_str().map(str::to_string))
            .unwrap_or(body);
        bail!("node answered {status}: {reason}");
    }
    serde_json::from_str(&body).context("decoding node response")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
