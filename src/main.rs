//! Command-line front end.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use credshare::config::ShellConfig;
use credshare::otp::{qr, uri, Enrolment, OtpEngine, SharedSecret};
use credshare::render;
use credshare::session::{RevealSession, SessionConfig, SessionSnapshot};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML config file.
    #[clap(long, short, default_value = "credshare.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Print the current code for a secret.
    Generate {
        /// Base-32 shared secret.
        #[clap(long, short)]
        secret: String,
        /// Derive at this unix timestamp instead of now.
        #[clap(long)]
        at: Option<u64>,
        /// Emit the code as JSON instead of a text line.
        #[clap(long)]
        json: bool,
    },
    /// Check a submitted code against the drift window.
    Verify {
        /// Base-32 shared secret.
        #[clap(long, short)]
        secret: String,
        /// The submitted code digits.
        #[clap(long)]
        code: String,
        /// Verify at this unix timestamp instead of now.
        #[clap(long)]
        at: Option<u64>,
        /// Override the configured drift window.
        #[clap(long, short)]
        window: Option<u32>,
        /// Emit the match as JSON instead of a text line.
        #[clap(long)]
        json: bool,
    },
    /// Create an enrolment: secret, otpauth URI and optional QR image.
    Provision {
        /// Account label (e.g. an e-mail address).
        #[clap(long, short)]
        account: String,
        /// Issuing service name.
        #[clap(long, short)]
        issuer: Option<String>,
        /// Reuse an existing base-32 secret instead of generating one.
        #[clap(long, short)]
        secret: Option<String>,
        /// Write a QR code PNG to this path.
        #[clap(long)]
        qr: Option<PathBuf>,
    },
    /// Reveal a rotating code for a bounded session.
    Reveal {
        /// Base-32 shared secret.
        #[clap(long, short)]
        secret: String,
        /// Override the configured session lifetime in seconds.
        #[clap(long, short)]
        lifetime: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), String> {
    let config = ShellConfig::load_or_default(&args.config)?;

    match args.cmd {
        Commands::Generate { secret, at, json } => {
            let engine = OtpEngine::new(config.code_params(), config.fallback_policy())?;
            let key = SharedSecret::new(secret).decode()?;
            let code = match at {
                Some(t) => engine.generate_at(&key, t)?,
                None => engine.generate_now(&key)?,
            };
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&code).map_err(|e| e.to_string())?
                );
            } else {
                println!("{}", render::format_code(&code));
            }
        }
        Commands::Verify {
            secret,
            code,
            at,
            window,
            json,
        } => {
            let engine = OtpEngine::new(config.code_params(), config.fallback_policy())?;
            let key = SharedSecret::new(secret).decode()?;
            let window = window.unwrap_or(config.drift_window);
            let verified = match at {
                Some(t) => engine.verify_at(&key, &code, t, window),
                None => engine.verify_now(&key, &code, window),
            };
            let matched = verified?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&matched).map_err(|e| e.to_string())?
                );
            } else {
                println!("code accepted (step {}, drift {})", matched.step, matched.drift);
            }
        }
        Commands::Provision {
            account,
            issuer,
            secret,
            qr: qr_path,
        } => {
            let secret = match secret {
                Some(s) => SharedSecret::new(s),
                None => SharedSecret::random(20),
            };
            // Surface a bad hand-typed secret here, not at first use.
            secret.decode()?;
            let mut enrolment =
                Enrolment::new(account, secret).with_params(config.code_params());
            if let Some(issuer) = issuer {
                enrolment = enrolment.with_issuer(issuer);
            }
            println!("account: {}", enrolment.display_name());
            println!("secret:  {}", enrolment.secret.as_str());
            println!("uri:     {}", uri::build_otpauth(&enrolment));
            if let Some(path) = qr_path {
                let png = qr::enrolment_to_png(&enrolment)?;
                std::fs::write(&path, png).map_err(|e| e.to_string())?;
                println!("qr:      {}", path.display());
            }
        }
        Commands::Reveal { secret, lifetime } => {
            let engine = OtpEngine::new(config.code_params(), config.fallback_policy())?;
            let mut session_config = config.session_config();
            if let Some(lifetime) = lifetime {
                session_config = session_config.with_lifetime_secs(lifetime);
            }
            reveal(engine, &SharedSecret::new(secret), session_config).await?;
        }
    }
    Ok(())
}

/// Drive a reveal session on the terminal until it expires or ctrl-c
/// cancels it.
async fn reveal(
    engine: OtpEngine,
    secret: &SharedSecret,
    config: SessionConfig,
) -> Result<(), String> {
    let mut session = RevealSession::start(engine, secret, config).await?;
    let mut rx = session.subscribe();

    println!(
        "revealing for {}s, ctrl-c to stop",
        session.config().lifetime_secs
    );
    print_frame(&session.snapshot());

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = rx.borrow_and_update().clone();
                print_frame(&snap);
                if !snap.phase.is_active() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                session.stop().await;
            }
        }
    }
    println!();
    Ok(())
}

fn print_frame(snap: &SessionSnapshot) {
    print!("\r\x1b[2K{}", render::format_snapshot(snap));
    let _ = io::stdout().flush();
}
