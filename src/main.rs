use std::env;
use std::sync::Arc;

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use eventvat::command::{parse_command, Command, Session};
use eventvat::{Emitter, StoreConfig};

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("eventvat: {}", err);
            std::process::exit(2);
        }
    };

    let databases = env::var("VAT_DATABASES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(16);

    let emitter = Arc::new(Emitter::new());
    if env::var("VAT_ECHO_EVENTS").is_ok() {
        emitter.on_any(|event, args| {
            let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            println!("[event] {} {}", event, args.join(" "));
        });
    }

    let mut session = Session::new(config.with_notifier(emitter), databases);
    log::info!("eventvat ready with {} databases", databases);

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        let Some(cmd) = parse_command(&line) else {
            continue;
        };
        let quit = cmd == Command::Quit;

        let reply = session.execute(cmd);
        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        stdout.flush().await?;

        if quit {
            break;
        }
    }

    session.die();
    Ok(())
}
