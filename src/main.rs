use hitch::app::App;
use hitch::config::Config;
use hitch::error::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let app = App::open(&config).await?;

    app.serve(config.listen_addr).await
}
