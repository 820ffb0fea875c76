use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};

use tinyapp::audit::AuditTrail;
use tinyapp::config::CONFIG_ENV;
use tinyapp::render::pluralize;
use tinyapp::{init_subscriber, site, Admin, AppConfig, Secret, SqliteStore, Store};

#[derive(Parser)]
#[command(name = "tinyapp-admin")]
#[command(about = "Command-line administration for a tinyapp site", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the page at URI to stdout, headers first
    Test {
        /// Path to request
        #[arg(default_value = "")]
        uri: String,
    },
    /// Create any missing database tables
    Createdb,
    /// Add a user
    Adduser {
        name: String,
        email: String,
        password: String,
        /// Comma-separated, no spaces
        #[arg(default_value = "")]
        roles: String,
    },
    /// Replace a user's roles
    Userroles {
        name: String,
        /// Comma-separated, no spaces
        roles: String,
    },
    /// Change a user's password and log out their sessions
    Userpw { name: String, password: String },
    /// Delete expired sessions and old trash files
    Cleanup,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match AppConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init_subscriber(&config.log_level);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Rc::new(SqliteStore::open(&config.db_path)?);
    let trail = AuditTrail::new();
    let admin = Admin::new(store.as_ref(), &trail);

    match command {
        Commands::Test { uri } => {
            let app = site::build(config, store.clone() as Rc<dyn Store>)?;
            app.test_dump(&uri, &mut io::stdout().lock())?;
        }
        Commands::Createdb => {
            for table in admin.create_db()? {
                if table.created {
                    println!("creating \"{}\" table...", table.name);
                } else {
                    println!("\"{}\" table exists", table.name);
                }
            }
        }
        Commands::Adduser {
            name,
            email,
            password,
            roles,
        } => {
            admin.add_user(&name, &email, &Secret::new(password), &roles)?;
            println!("added user \"{}\"", name.trim());
        }
        Commands::Userroles { name, roles } => {
            admin.set_user_roles(&name, &roles)?;
            println!("set roles for user \"{}\"", name.trim());
        }
        Commands::Userpw { name, password } => {
            admin.set_user_password(&name, &Secret::new(password))?;
            println!("changed pw for user \"{}\"", name.trim());
        }
        Commands::Cleanup => {
            let report = admin.cleanup(config)?;
            for name in &report.trash_removed {
                println!("Deleted \"{}\" from trash", name);
            }
            println!(
                "{} expired session{} removed",
                report.sessions_removed,
                pluralize(&report.sessions_removed.into(), "", "s")
            );
        }
    }
    Ok(())
}
