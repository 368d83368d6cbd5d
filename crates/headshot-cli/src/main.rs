use anyhow::Result;
use clap::{Parser, Subcommand};
use headshot_application::{AppContext, BootstrapOptions};
use headshot_core::Identity;
use headshot_core::article::ArticleCategory;
use headshot_core::credit::SharePlatform;
use headshot_core::generation::HeadshotStyle;
use headshot_infrastructure::logging::init_tracing;
use headshot_infrastructure::{HeadshotPaths, ServiceType};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "headshot")]
#[command(about = "Headshot Studio - turn a selfie into a professional headshot", long_about = None)]
struct Cli {
    /// Account id the quota and credits are tracked against (anonymous if omitted)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Root directory for config, secrets and local data
    #[arg(long, global = true, env = "HEADSHOT_HOME")]
    home: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a headshot from a selfie, optionally followed by edits
    Generate {
        /// Selfie to transform (JPEG, PNG or WebP)
        #[arg(long)]
        input: PathBuf,

        /// corporate, creative, casual, studio or outdoor
        #[arg(long, default_value = "corporate")]
        style: HeadshotStyle,

        /// Extra instructions added to the style prompt
        #[arg(long)]
        prompt: Option<String>,

        /// Edit to apply after generation; repeat for several edits
        #[arg(long = "edit")]
        edits: Vec<String>,

        /// Step back this many frames before saving
        #[arg(long, default_value_t = 0)]
        undo: usize,

        /// Where to write the final image
        #[arg(long)]
        output: PathBuf,
    },
    /// Show remaining generations in the current window
    Quota,
    /// Earn a credit by sharing on a social network
    Share {
        /// twitter (or x), linkedin or facebook
        #[arg(long)]
        platform: SharePlatform,

        /// Confirm the post was published and claim the credit
        #[arg(long)]
        confirm: bool,

        /// Caption to post instead of the default
        #[arg(long)]
        caption: Option<String>,
    },
    /// Earn a credit by watching an ad to the end
    Ad,
    /// List blog articles
    Articles {
        /// tip, job or news
        #[arg(long)]
        category: Option<ArticleCategory>,

        /// Print a single article in full
        #[arg(long)]
        id: Option<String>,
    },
    /// Subscribe an email address to the newsletter
    Subscribe { email: String },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "HEADSHOT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and print the account id to pass as --user
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "HEADSHOT_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = HeadshotPaths::new(cli.home.as_deref());
    let log_dir = paths.get_path(ServiceType::Logs).ok();
    let filter = if cli.verbose { "headshot=info" } else { "headshot=warn" };
    let _log_guard = init_tracing(filter, false, log_dir.as_deref());

    let ctx = AppContext::bootstrap(BootstrapOptions {
        base_dir: cli.home.clone(),
        ..BootstrapOptions::default()
    })
    .await?;
    let identity = Identity::from_user_id(cli.user.as_deref());

    match cli.command {
        Commands::Generate {
            input,
            style,
            prompt,
            edits,
            undo,
            output,
        } => {
            let request = commands::generate::GenerateRequest {
                input,
                style,
                prompt,
                edits,
                undo,
                output,
            };
            commands::generate::run(&ctx, identity, request).await?
        }
        Commands::Quota => commands::credits::quota(&ctx, &identity),
        Commands::Share {
            platform,
            confirm,
            caption,
        } => commands::credits::share(&ctx, &identity, platform, confirm, caption.as_deref())?,
        Commands::Ad => commands::credits::watch_ad(&ctx, &identity).await?,
        Commands::Articles { category, id } => match id {
            Some(id) => commands::blog::show(&ctx, &id).await?,
            None => commands::blog::list(&ctx, category).await?,
        },
        Commands::Subscribe { email } => commands::blog::subscribe(&ctx, &email).await?,
        Commands::Signup { email, password } => {
            commands::account::signup(&ctx, &email, &password).await?
        }
        Commands::Login { email, password } => {
            commands::account::login(&ctx, &email, &password).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_args() {
        let cli = Cli::try_parse_from([
            "headshot",
            "--user",
            "u1",
            "generate",
            "--input",
            "me.jpg",
            "--style",
            "Studio",
            "--edit",
            "brighter",
            "--edit",
            "smile",
            "--undo",
            "1",
            "--output",
            "out.png",
        ])
        .unwrap();

        assert_eq!(cli.user.as_deref(), Some("u1"));
        match cli.command {
            Commands::Generate {
                style, edits, undo, ..
            } => {
                assert_eq!(style, HeadshotStyle::Studio);
                assert_eq!(edits, vec!["brighter", "smile"]);
                assert_eq!(undo, 1);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_share_accepts_x_alias() {
        let cli = Cli::try_parse_from(["headshot", "share", "--platform", "x", "--confirm"]).unwrap();
        match cli.command {
            Commands::Share {
                platform, confirm, ..
            } => {
                assert_eq!(platform, SharePlatform::Twitter);
                assert!(confirm);
            }
            _ => panic!("expected share"),
        }
    }

    #[test]
    fn test_unknown_style_rejected() {
        assert!(
            Cli::try_parse_from([
                "headshot", "generate", "--input", "a.png", "--style", "noir", "--output", "b.png",
            ])
            .is_err()
        );
    }
}
