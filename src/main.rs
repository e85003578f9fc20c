use std::io;
use std::net::{IpAddr, SocketAddr};
use std::process;

use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use web_scraper_qa::{
    AppState,
    api::routes::create_router,
    batch::{self, BatchRequest},
    config::Config,
    error::Result,
    interactive,
    qa::{AskOptions, QaService},
    scraper::Scraper,
};

/// Scrape a website and answer questions about it with an LLM
#[derive(Parser, Debug)]
#[command(name = "web-scraper-qa")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape once, then answer questions read from stdin
    Interactive {
        /// URL of the website to scrape
        url: String,

        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Serve the browser form and JSON API
    Serve {
        /// Address to bind (defaults to HOST)
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port to bind (defaults to PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// URL of the website to scrape
    url: Option<String>,

    /// Question to answer based on the scraped content
    #[arg(short, long)]
    question: Option<String>,

    /// Generate a summary of the website content
    #[arg(short, long)]
    summarize: bool,

    /// Extract structured content (title, headings, paragraphs)
    #[arg(long)]
    structured: bool,

    #[command(flatten)]
    llm: LlmArgs,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// OpenAI API key (or set OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Model to use for questions (defaults to OPENAI_MODEL, then gpt-3.5-turbo)
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Serve { .. }) => "info",
        _ => "warn",
    };
    init_tracing(default_level);

    let outcome = match cli.command {
        Some(Commands::Interactive { url, llm }) => run_interactive(&url, llm).await,
        Some(Commands::Serve { host, port }) => run_server(host, port).await,
        None => match cli.run.url.take() {
            Some(url) => run_batch(url, cli.run).await,
            None => {
                eprintln!("Usage: web-scraper-qa <URL> [-q QUESTION] [-s] [--structured]");
                eprintln!("   or: web-scraper-qa interactive <URL>");
                eprintln!("   or: web-scraper-qa serve");
                process::exit(1);
            }
        },
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn ask_options(config: &Config, llm: &LlmArgs) -> AskOptions {
    AskOptions::with_model(
        llm.model
            .clone()
            .unwrap_or_else(|| config.llm.default_model.clone()),
    )
}

fn build_qa(config: &Config, llm: &LlmArgs) -> Result<QaService> {
    let explicit = llm.api_key.as_deref().or(config.openai_api_key.as_deref());
    QaService::new(explicit, &config.llm)
}

async fn run_batch(url: String, args: RunArgs) -> Result<()> {
    let config = Config::load()?;
    let scraper = Scraper::with_timeout(config.fetch_timeout)?;

    let request = BatchRequest {
        url,
        question: args.question,
        summarize: args.summarize,
        structured: args.structured,
        options: ask_options(&config, &args.llm),
    };
    batch::run_batch(&scraper, &request, || build_qa(&config, &args.llm), io::stdout()).await
}

async fn run_interactive(url: &str, llm: LlmArgs) -> Result<()> {
    let config = Config::load()?;
    let scraper = Scraper::with_timeout(config.fetch_timeout)?;

    println!("Scraping website: {}", url);
    let content = scraper.scrape(url, false).await?.into_text();
    println!("Successfully scraped {} characters\n", content.chars().count());

    let qa = build_qa(&config, &llm)?;
    let options = ask_options(&config, &llm);

    let stdin = io::stdin();
    interactive::run_session(&qa, &content, &options, stdin.lock(), io::stdout()).await
}

async fn run_server(host: Option<IpAddr>, port: Option<u16>) -> Result<()> {
    let config = Config::load()?;
    let server_addr = SocketAddr::new(
        host.unwrap_or(config.server_addr.ip()),
        port.unwrap_or(config.server_addr.port()),
    );

    let app_state = AppState::from_config(config)?;
    if app_state.qa.is_none() {
        info!("no OPENAI_API_KEY configured; requests must supply api_key");
    }

    let app = create_router(app_state);
    let listener = TcpListener::bind(server_addr).await?;

    info!(%server_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
