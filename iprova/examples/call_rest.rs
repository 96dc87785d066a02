use clap::Parser;
use iprova::{ClientConfig, IProvaClient, LogonMethod, RestCall};
use iprova_reqwest::ReqwestTransport;
use iprova_tokens::ApiKey;

#[derive(Debug, Parser)]
struct Opts {
    /// The root URL of the iProva installation
    #[arg(short = 'u', long, env = "IPROVA_URL")]
    iprova_url: String,

    /// The logon method, by name or ordinal
    #[arg(short, long, env, default_value = "None")]
    logon_method: LogonMethod,

    /// The API key sent with every call
    #[arg(short = 'k', long, env, hide_env_values = true)]
    api_key: Option<ApiKey>,

    /// The API version sent with every call
    #[arg(short = 'v', long, env)]
    api_version: Option<String>,

    /// Obtain a new token for every call
    #[arg(long, env)]
    always_new_token: bool,

    /// The path to request, relative to the iProva URL
    #[arg(default_value = "api/items")]
    path: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let mut config = ClientConfig::builder(opts.iprova_url)
        .logon_method(opts.logon_method)
        .always_new_token(opts.always_new_token);

    if let Some(api_key) = opts.api_key {
        config = config.api_key(api_key);
    }

    if let Some(api_version) = opts.api_version {
        config = config.api_version(api_version);
    }

    let client = reqwest::Client::builder().cookie_store(true).build()?;
    let client = IProvaClient::builder(config.build()?, ReqwestTransport::new(client)).build()?;

    let result = client.call_rest(&RestCall::get(opts.path)).await?;
    tracing::info!(
        token = format_args!("{:#?}", client.cached_token()),
        "call completed"
    );

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
