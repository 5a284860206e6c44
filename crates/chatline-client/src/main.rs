use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use chatline_client::{ChatClient, ClientError, DEFAULT_HOST, DEFAULT_PORT, render};
use chatline_types::wire::EXIT_COMMAND;

/// Terminal client for the chatline relay.
#[derive(Parser, Debug)]
#[command(name = "chatline-client")]
struct Cli {
    /// Server host.
    #[arg(value_name = "HOST", default_value = DEFAULT_HOST)]
    host: String,
    /// Server port.
    #[arg(value_name = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with chat output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatline_client=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("Enter your username");
    let client = loop {
        let Some(name) = input.next_line().await? else {
            return Ok(());
        };
        match ChatClient::new(name.trim(), cli.host.as_str(), cli.port) {
            Ok(client) => break client,
            Err(_) => println!("Invalid username! Please enter a correct username:"),
        }
    };

    println!("Chatting as {} via {}:{}", client.username(), cli.host, cli.port);

    loop {
        println!(">");
        let Some(line) = input.next_line().await? else {
            break;
        };
        if line.trim().eq_ignore_ascii_case(EXIT_COMMAND) {
            break;
        }

        match client.send(&line).await {
            Ok(response) => println!("{}", render(&response)),
            Err(ClientError::InvalidMessage(e)) => {
                println!("Message not sent: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        println!("{}", render(&client.update().await?));
    }

    Ok(())
}
